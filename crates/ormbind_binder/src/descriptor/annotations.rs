//! Annotation records carried by descriptors.
//!
//! Each record mirrors one mapping annotation. Absent annotations are `None`
//! on the owning descriptor; blank strings inside a record count as absent.

use ormbind_model::ResultCheckStyle;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::options::CacheAccessType;

// =============================================================================
// Columns
// =============================================================================

/// `@Column`.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct ColumnAnnotation {
    /// Explicit column name.
    pub name: Option<String>,
    /// Whether the column accepts nulls.
    pub nullable: bool,
    /// Whether the column is written on insert.
    pub insertable: bool,
    /// Whether the column is written on update.
    pub updatable: bool,
    /// Single-column unique constraint.
    pub unique: bool,
    /// Character length.
    pub length: Option<u32>,
    /// Numeric precision.
    pub precision: Option<u32>,
    /// Numeric scale.
    pub scale: Option<u32>,
    /// Explicit SQL type fragment.
    pub column_definition: Option<String>,
    /// Secondary table holding the column.
    pub table: Option<String>,
    /// Column check constraint.
    pub check: Option<String>,
    /// Column default expression.
    pub default_value: Option<String>,
    /// Column comment.
    pub comment: Option<String>,
}

impl Default for ColumnAnnotation {
    fn default() -> Self {
        Self {
            name: None,
            nullable: true,
            insertable: true,
            updatable: true,
            unique: false,
            length: None,
            precision: None,
            scale: None,
            column_definition: None,
            table: None,
            check: None,
            default_value: None,
            comment: None,
        }
    }
}

impl ColumnAnnotation {
    /// A column with an explicit name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Sets nullability.
    #[must_use]
    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Routes the column to a secondary table.
    #[must_use]
    pub fn in_table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Makes the column read-only.
    #[must_use]
    pub fn read_only(mut self) -> Self {
        self.insertable = false;
        self.updatable = false;
        self
    }
}

/// How a foreign key constraint is emitted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ConstraintMode {
    /// Always emit the constraint.
    Constraint,
    /// Never emit the constraint.
    NoConstraint,
    /// Emit unless no-constraint is the configured default.
    #[default]
    ProviderDefault,
}

/// `@ForeignKey`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct ForeignKeyAnnotation {
    /// Constraint name.
    pub name: Option<String>,
    /// Explicit constraint definition.
    pub definition: Option<String>,
    /// Emission mode.
    pub mode: ConstraintMode,
}

impl ForeignKeyAnnotation {
    /// A named constraint.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// A constraint that is never emitted.
    #[must_use]
    pub fn no_constraint() -> Self {
        Self {
            mode: ConstraintMode::NoConstraint,
            ..Self::default()
        }
    }

    /// Whether this disables the constraint under the given default.
    #[must_use]
    pub fn is_no_constraint(&self, no_constraint_by_default: bool) -> bool {
        match self.mode {
            ConstraintMode::NoConstraint => true,
            ConstraintMode::ProviderDefault => no_constraint_by_default,
            ConstraintMode::Constraint => false,
        }
    }
}

/// `@JoinColumn`.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct JoinColumnAnnotation {
    /// Explicit column name.
    pub name: Option<String>,
    /// Column of the target this one references.
    pub referenced_column_name: Option<String>,
    /// Whether the column accepts nulls.
    pub nullable: bool,
    /// Whether the column is written on insert.
    pub insertable: bool,
    /// Whether the column is written on update.
    pub updatable: bool,
    /// Single-column unique constraint.
    pub unique: bool,
    /// Explicit SQL type fragment.
    pub column_definition: Option<String>,
    /// Table holding the column.
    pub table: Option<String>,
    /// Constraint settings.
    pub foreign_key: Option<ForeignKeyAnnotation>,
}

impl Default for JoinColumnAnnotation {
    fn default() -> Self {
        Self {
            name: None,
            referenced_column_name: None,
            nullable: true,
            insertable: true,
            updatable: true,
            unique: false,
            column_definition: None,
            table: None,
            foreign_key: None,
        }
    }
}

impl JoinColumnAnnotation {
    /// A join column with an explicit name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// A named join column referencing a specific target column.
    #[must_use]
    pub fn referencing(name: impl Into<String>, referenced: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            referenced_column_name: Some(referenced.into()),
            ..Self::default()
        }
    }

    /// Sets nullability.
    #[must_use]
    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Sets the unique flag.
    #[must_use]
    pub fn with_unique(mut self, unique: bool) -> Self {
        self.unique = unique;
        self
    }

    /// Sets the constraint settings.
    #[must_use]
    pub fn with_foreign_key(mut self, foreign_key: ForeignKeyAnnotation) -> Self {
        self.foreign_key = Some(foreign_key);
        self
    }
}

/// `@PrimaryKeyJoinColumn`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct PrimaryKeyJoinColumnAnnotation {
    /// Explicit column name.
    pub name: Option<String>,
    /// Parent key column this one references.
    pub referenced_column_name: Option<String>,
    /// Explicit SQL type fragment.
    pub column_definition: Option<String>,
    /// Constraint settings.
    pub foreign_key: Option<ForeignKeyAnnotation>,
}

impl PrimaryKeyJoinColumnAnnotation {
    /// A key column with an explicit name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }
}

// =============================================================================
// Tables
// =============================================================================

/// A unique constraint declared on a table.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct UniqueConstraintAnnotation {
    /// Constraint name; generated when absent.
    pub name: Option<String>,
    /// Logical column names.
    pub columns: Vec<String>,
}

/// An index declared on a table.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct IndexAnnotation {
    /// Index name; generated when absent.
    pub name: Option<String>,
    /// Logical column names.
    pub columns: Vec<String>,
    /// Whether the index is unique.
    pub unique: bool,
}

/// `@Table`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct TableAnnotation {
    /// Explicit table name.
    pub name: Option<String>,
    /// Schema.
    pub schema: Option<String>,
    /// Catalog.
    pub catalog: Option<String>,
    /// Unique constraints.
    pub unique_constraints: Vec<UniqueConstraintAnnotation>,
    /// Indexes.
    pub indexes: Vec<IndexAnnotation>,
    /// Table check constraint.
    pub check: Option<String>,
    /// Table comment.
    pub comment: Option<String>,
}

impl TableAnnotation {
    /// A table with an explicit name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }
}

/// `@SecondaryTable`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct SecondaryTableAnnotation {
    /// Table name.
    pub name: String,
    /// Schema.
    pub schema: Option<String>,
    /// Catalog.
    pub catalog: Option<String>,
    /// Key columns; defaults to the identifier columns.
    pub pk_join_columns: Vec<PrimaryKeyJoinColumnAnnotation>,
    /// Constraint settings for the key.
    pub foreign_key: Option<ForeignKeyAnnotation>,
    /// Unique constraints.
    pub unique_constraints: Vec<UniqueConstraintAnnotation>,
    /// Indexes.
    pub indexes: Vec<IndexAnnotation>,
}

impl SecondaryTableAnnotation {
    /// A secondary table with the given name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Complementary definition of the primary or a secondary table.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct ComplementaryTableAnnotation {
    /// Logical name of the table this refines.
    pub applies_to: String,
    /// Table comment.
    pub comment: Option<String>,
    /// Table check constraint.
    pub check: Option<String>,
    /// Name of the secondary join's foreign key.
    pub foreign_key_name: Option<String>,
    /// Whether the secondary row is written by someone else.
    pub inverse: bool,
    /// Whether the secondary row may be missing.
    pub optional: bool,
    /// Custom insert for the secondary row.
    pub sql_insert: Option<CustomSqlAnnotation>,
    /// Custom update for the secondary row.
    pub sql_update: Option<CustomSqlAnnotation>,
    /// Custom delete for the secondary row.
    pub sql_delete: Option<CustomSqlAnnotation>,
    /// Indexes.
    pub indexes: Vec<IndexAnnotation>,
}

impl Default for ComplementaryTableAnnotation {
    fn default() -> Self {
        Self {
            applies_to: String::new(),
            comment: None,
            check: None,
            foreign_key_name: None,
            inverse: false,
            optional: true,
            sql_insert: None,
            sql_update: None,
            sql_delete: None,
            indexes: Vec::new(),
        }
    }
}

impl ComplementaryTableAnnotation {
    /// A definition refining `table`.
    #[must_use]
    pub fn applies_to(table: impl Into<String>) -> Self {
        Self {
            applies_to: table.into(),
            ..Self::default()
        }
    }
}

/// `@SecondaryRow`.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct SecondaryRowAnnotation {
    /// Secondary table; the primary table when absent.
    pub table: Option<String>,
    /// Whether this entity writes the row.
    pub owned: bool,
    /// Whether the row may be missing.
    pub optional: bool,
}

impl Default for SecondaryRowAnnotation {
    fn default() -> Self {
        Self {
            table: None,
            owned: true,
            optional: true,
        }
    }
}

/// Which statement a custom SQL annotation replaces.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SqlKind {
    /// `@SQLInsert`.
    #[default]
    Insert,
    /// `@SQLUpdate`.
    Update,
    /// `@SQLDelete`.
    Delete,
    /// `@SQLDeleteAll`; only meaningful for collections.
    DeleteAll,
}

/// `@SQLInsert`, `@SQLUpdate`, `@SQLDelete` or `@SQLDeleteAll`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct CustomSqlAnnotation {
    /// Statement kind.
    pub kind: SqlKind,
    /// Statement text.
    pub sql: String,
    /// Whether the statement is a callable.
    pub callable: bool,
    /// Row count verification.
    pub check: ResultCheckStyle,
    /// Secondary table the statement applies to.
    pub table: Option<String>,
}

impl CustomSqlAnnotation {
    /// A statement of the given kind.
    #[must_use]
    pub fn new(kind: SqlKind, sql: impl Into<String>) -> Self {
        Self {
            kind,
            sql: sql.into(),
            ..Self::default()
        }
    }

    /// Applies the statement to a secondary table.
    #[must_use]
    pub fn for_table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }
}

// =============================================================================
// Inheritance
// =============================================================================

/// `@Inheritance` strategy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum InheritanceType {
    /// One table for the whole hierarchy.
    #[default]
    SingleTable,
    /// One table per class, joined on the key.
    Joined,
    /// One self-contained table per concrete class.
    TablePerClass,
}

/// Type of the discriminator column.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DiscriminatorType {
    /// Text values.
    #[default]
    String,
    /// Single characters.
    Char,
    /// Integer values.
    Integer,
}

impl DiscriminatorType {
    /// Type name given to the discriminator value.
    #[must_use]
    pub fn type_name(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Char => "character",
            Self::Integer => "integer",
        }
    }
}

/// `@DiscriminatorColumn`.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct DiscriminatorColumnAnnotation {
    /// Column name; `DTYPE` when absent.
    pub name: Option<String>,
    /// Value type.
    pub discriminator_type: DiscriminatorType,
    /// Column length.
    pub length: u32,
    /// Explicit SQL type fragment.
    pub column_definition: Option<String>,
}

impl Default for DiscriminatorColumnAnnotation {
    fn default() -> Self {
        Self {
            name: None,
            discriminator_type: DiscriminatorType::String,
            length: 31,
            column_definition: None,
        }
    }
}

impl DiscriminatorColumnAnnotation {
    /// A discriminator column with an explicit name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Sets the value type.
    #[must_use]
    pub fn of_type(mut self, discriminator_type: DiscriminatorType) -> Self {
        self.discriminator_type = discriminator_type;
        self
    }
}

/// `@DiscriminatorOptions`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct DiscriminatorOptions {
    /// Always restrict selects by discriminator.
    pub force: bool,
    /// Whether the discriminator is written on insert.
    pub insert: bool,
}

impl Default for DiscriminatorOptions {
    fn default() -> Self {
        Self {
            force: false,
            insert: true,
        }
    }
}

/// `@Polymorphism`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PolymorphismType {
    /// Queries for a supertype include this entity.
    #[default]
    Implicit,
    /// Only queries naming this entity return it.
    Explicit,
}

/// `@OnDelete`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum OnDeleteAction {
    /// The database does nothing.
    #[default]
    NoAction,
    /// The database cascades deletes.
    Cascade,
}

// =============================================================================
// Caching and entity options
// =============================================================================

/// Strategy named by `@Cache(usage = ...)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CacheConcurrencyStrategy {
    /// No caching strategy.
    #[default]
    None,
    /// Read-only data.
    ReadOnly,
    /// Non-strict read/write.
    NonstrictReadWrite,
    /// Read/write.
    ReadWrite,
    /// Transactional.
    Transactional,
}

impl CacheConcurrencyStrategy {
    /// The access type this strategy selects.
    #[must_use]
    pub fn to_access_type(self) -> Option<CacheAccessType> {
        match self {
            Self::None => None,
            Self::ReadOnly => Some(CacheAccessType::ReadOnly),
            Self::NonstrictReadWrite => Some(CacheAccessType::NonstrictReadWrite),
            Self::ReadWrite => Some(CacheAccessType::ReadWrite),
            Self::Transactional => Some(CacheAccessType::Transactional),
        }
    }
}

/// `@Cache`.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct CacheAnnotation {
    /// Concurrency strategy.
    pub usage: CacheConcurrencyStrategy,
    /// Region; the class name when absent.
    pub region: Option<String>,
    /// Whether lazy properties are cached.
    pub include_lazy: bool,
    /// `all` or `non-lazy`.
    pub include: String,
}

impl Default for CacheAnnotation {
    fn default() -> Self {
        Self {
            usage: CacheConcurrencyStrategy::None,
            region: None,
            include_lazy: true,
            include: "all".to_string(),
        }
    }
}

impl CacheAnnotation {
    /// A cache with the given strategy.
    #[must_use]
    pub fn with_usage(usage: CacheConcurrencyStrategy) -> Self {
        Self {
            usage,
            ..Self::default()
        }
    }

    /// Sets the region.
    #[must_use]
    pub fn in_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }
}

/// `@NaturalIdCache`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct NaturalIdCacheAnnotation {
    /// Explicit region.
    pub region: Option<String>,
}

/// `@Proxy`.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct ProxyAnnotation {
    /// Whether the entity is lazy.
    pub lazy: bool,
    /// Proxy interface; the class itself when absent.
    pub proxy_class: Option<String>,
}

impl Default for ProxyAnnotation {
    fn default() -> Self {
        Self {
            lazy: true,
            proxy_class: None,
        }
    }
}

/// Dynamic insert/update and select-before-update.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct RowManagement {
    /// `@DynamicInsert`.
    pub dynamic_insert: bool,
    /// `@DynamicUpdate`.
    pub dynamic_update: bool,
    /// `@SelectBeforeUpdate`.
    pub select_before_update: bool,
}

/// `@OptimisticLocking(type = ...)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum OptimisticLockType {
    /// No optimistic locking.
    None,
    /// A version property.
    #[default]
    Version,
    /// Dirty columns are compared.
    Dirty,
    /// All columns are compared.
    All,
}

/// One alias of a `@Filter`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct SqlFragmentAlias {
    /// Alias used in the condition.
    pub alias: String,
    /// Table the alias stands for.
    pub table: Option<String>,
    /// Entity whose table the alias stands for.
    pub entity: Option<String>,
}

/// `@Filter`.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct FilterAnnotation {
    /// Name of the `@FilterDef`.
    pub name: String,
    /// Condition; the definition's default when blank.
    pub condition: Option<String>,
    /// Whether aliases are injected automatically.
    pub deduce_alias_injection_points: bool,
    /// Explicit aliases.
    pub aliases: Vec<SqlFragmentAlias>,
}

impl Default for FilterAnnotation {
    fn default() -> Self {
        Self {
            name: String::new(),
            condition: None,
            deduce_alias_injection_points: true,
            aliases: Vec::new(),
        }
    }
}

impl FilterAnnotation {
    /// A filter reference with an optional condition.
    #[must_use]
    pub fn new(name: impl Into<String>, condition: Option<&str>) -> Self {
        Self {
            name: name.into(),
            condition: condition.map(str::to_string),
            ..Self::default()
        }
    }
}

// =============================================================================
// Associations
// =============================================================================

/// JPA fetch type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FetchType {
    /// Loaded with the owner.
    #[default]
    Eager,
    /// Loaded on access.
    Lazy,
}

/// `@LazyToOne`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LazyToOneOption {
    /// Always eager.
    False,
    /// Lazy through a proxy.
    Proxy,
    /// Lazy without a proxy.
    NoProxy,
}

/// JPA cascade type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CascadeType {
    /// Every operation.
    All,
    /// Persist.
    Persist,
    /// Merge.
    Merge,
    /// Remove.
    Remove,
    /// Refresh.
    Refresh,
    /// Detach.
    Detach,
}

/// Native cascade type, in the order cascade strings are emitted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum HibernateCascadeType {
    /// Every operation.
    All,
    /// Persist.
    Persist,
    /// Merge.
    Merge,
    /// Remove.
    Remove,
    /// Refresh.
    Refresh,
    /// Delete.
    Delete,
    /// Save or update.
    SaveUpdate,
    /// Replicate.
    Replicate,
    /// Delete orphans.
    DeleteOrphan,
    /// Lock.
    Lock,
    /// Evict.
    Evict,
    /// Detach.
    Detach,
}

impl From<CascadeType> for HibernateCascadeType {
    fn from(cascade: CascadeType) -> Self {
        match cascade {
            CascadeType::All => Self::All,
            CascadeType::Persist => Self::Persist,
            CascadeType::Merge => Self::Merge,
            CascadeType::Remove => Self::Remove,
            CascadeType::Refresh => Self::Refresh,
            CascadeType::Detach => Self::Detach,
        }
    }
}

/// `@ManyToOne`.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct ManyToOneAnnotation {
    /// Target entity; the property type when absent.
    pub target_entity: Option<String>,
    /// Fetch type.
    pub fetch: FetchType,
    /// Whether the association may be null.
    pub optional: bool,
    /// Cascaded operations.
    pub cascade: Vec<CascadeType>,
}

impl Default for ManyToOneAnnotation {
    fn default() -> Self {
        Self {
            target_entity: None,
            fetch: FetchType::Eager,
            optional: true,
            cascade: Vec::new(),
        }
    }
}

/// `@OneToOne`.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct OneToOneAnnotation {
    /// Target entity; the property type when absent.
    pub target_entity: Option<String>,
    /// Fetch type.
    pub fetch: FetchType,
    /// Whether the association may be null.
    pub optional: bool,
    /// Owning property on the target.
    pub mapped_by: Option<String>,
    /// Cascaded operations.
    pub cascade: Vec<CascadeType>,
    /// Whether orphans are deleted.
    pub orphan_removal: bool,
}

impl Default for OneToOneAnnotation {
    fn default() -> Self {
        Self {
            target_entity: None,
            fetch: FetchType::Eager,
            optional: true,
            mapped_by: None,
            cascade: Vec::new(),
            orphan_removal: false,
        }
    }
}

/// `@OneToMany`.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct OneToManyAnnotation {
    /// Element entity; the element type when absent.
    pub target_entity: Option<String>,
    /// Fetch type.
    pub fetch: FetchType,
    /// Owning many-to-one on the element entity.
    pub mapped_by: Option<String>,
    /// Cascaded operations.
    pub cascade: Vec<CascadeType>,
    /// Whether orphans are deleted.
    pub orphan_removal: bool,
}

impl Default for OneToManyAnnotation {
    fn default() -> Self {
        Self {
            target_entity: None,
            fetch: FetchType::Lazy,
            mapped_by: None,
            cascade: Vec::new(),
            orphan_removal: false,
        }
    }
}

/// `@Basic`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct BasicAnnotation {
    /// Fetch type.
    pub fetch: FetchType,
    /// Whether the value may be null.
    pub optional: bool,
}

impl Default for BasicAnnotation {
    fn default() -> Self {
        Self {
            fetch: FetchType::Eager,
            optional: true,
        }
    }
}

/// `@NaturalId`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct NaturalIdAnnotation {
    /// Whether the natural id may change.
    pub mutable: bool,
}

/// `@AttributeOverride`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct AttributeOverrideAnnotation {
    /// Overridden attribute path.
    pub name: String,
    /// Replacement column.
    pub column: ColumnAnnotation,
}

/// Property access style.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum AccessType {
    /// Through getters and setters.
    #[default]
    Property,
    /// Directly on fields.
    Field,
}

impl AccessType {
    /// Accessor name recorded on bound properties.
    #[must_use]
    pub fn accessor_name(self) -> &'static str {
        match self {
            Self::Property => "property",
            Self::Field => "field",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constraint_mode_respects_default() {
        let provider = ForeignKeyAnnotation::default();
        assert!(!provider.is_no_constraint(false));
        assert!(provider.is_no_constraint(true));
        assert!(ForeignKeyAnnotation::no_constraint().is_no_constraint(false));
        let explicit = ForeignKeyAnnotation {
            mode: ConstraintMode::Constraint,
            ..ForeignKeyAnnotation::default()
        };
        assert!(!explicit.is_no_constraint(true));
    }

    #[test]
    fn annotation_defaults_match_jpa() {
        assert!(ColumnAnnotation::default().nullable);
        assert!(JoinColumnAnnotation::default().insertable);
        assert_eq!(DiscriminatorColumnAnnotation::default().length, 31);
        assert_eq!(CacheAnnotation::default().include, "all");
        assert_eq!(OneToManyAnnotation::default().fetch, FetchType::Lazy);
        assert_eq!(ManyToOneAnnotation::default().fetch, FetchType::Eager);
        assert_eq!(DiscriminatorType::Integer.type_name(), "integer");
    }
}
