//! Entity, mapped superclass and embeddable descriptors.

use ormbind_foundation::names::{non_blank, unqualify};
use ormbind_model::CallbackDefinition;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::annotations::{
    AccessType, AttributeOverrideAnnotation, CacheAnnotation, ComplementaryTableAnnotation,
    CustomSqlAnnotation, DiscriminatorColumnAnnotation, DiscriminatorOptions, FilterAnnotation,
    ForeignKeyAnnotation, InheritanceType, NaturalIdCacheAnnotation, OnDeleteAction,
    OptimisticLockType, PolymorphismType, PrimaryKeyJoinColumnAnnotation, ProxyAnnotation,
    RowManagement, SecondaryRowAnnotation, SecondaryTableAnnotation, TableAnnotation,
};
use super::property::PropertyDescriptor;

/// An `@Entity` class and everything declared on it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct EntityDescriptor {
    /// Fully qualified class name; also the entity name.
    pub class_name: String,
    /// Direct superclass, entity or mapped superclass.
    pub superclass: Option<String>,
    /// `@Entity(name = ...)`.
    pub entity_name: Option<String>,
    /// Whether the class is abstract.
    pub is_abstract: bool,
    /// Default access style of the class.
    pub access: Option<AccessType>,

    /// `@Table`.
    pub table: Option<TableAnnotation>,
    /// `@SecondaryTable`s.
    pub secondary_tables: Vec<SecondaryTableAnnotation>,
    /// Complementary table definitions (`appliesTo`).
    pub complementary_tables: Vec<ComplementaryTableAnnotation>,
    /// `@SecondaryRow`s.
    pub secondary_rows: Vec<SecondaryRowAnnotation>,
    /// `@RowId`.
    pub row_id: Option<String>,
    /// `@Subselect`.
    pub subselect: Option<String>,
    /// `@Synchronize`.
    pub synchronize: Vec<String>,

    /// `@Inheritance`.
    pub inheritance: Option<InheritanceType>,
    /// `@DiscriminatorColumn`.
    pub discriminator_column: Option<DiscriminatorColumnAnnotation>,
    /// `@DiscriminatorFormula`.
    pub discriminator_formula: Option<String>,
    /// `@DiscriminatorValue`.
    pub discriminator_value: Option<String>,
    /// `@DiscriminatorOptions`.
    pub discriminator_options: Option<DiscriminatorOptions>,
    /// `@PrimaryKeyJoinColumn`s of a joined subclass.
    pub pk_join_columns: Vec<PrimaryKeyJoinColumnAnnotation>,
    /// `@PrimaryKeyJoinColumns(foreignKey = ...)`.
    pub pk_join_columns_foreign_key: Option<ForeignKeyAnnotation>,
    /// Class-level `@ForeignKey` for the joined subclass key.
    pub foreign_key: Option<ForeignKeyAnnotation>,
    /// `@OnDelete`.
    pub on_delete: Option<OnDeleteAction>,
    /// `@IdClass`.
    pub id_class: Option<String>,

    /// `@Cacheable`.
    pub cacheable: Option<bool>,
    /// `@Cache`.
    pub cache: Option<CacheAnnotation>,
    /// `@NaturalIdCache`.
    pub natural_id_cache: Option<NaturalIdCacheAnnotation>,
    /// `@Proxy`.
    pub proxy: Option<ProxyAnnotation>,
    /// `@DynamicInsert`, `@DynamicUpdate` and `@SelectBeforeUpdate`.
    pub row_management: RowManagement,
    /// `@OptimisticLocking`.
    pub optimistic_lock: Option<OptimisticLockType>,
    /// `@Polymorphism`.
    pub polymorphism: Option<PolymorphismType>,
    /// `@BatchSize`.
    pub batch_size: Option<i32>,
    /// `@Where`.
    pub where_clause: Option<String>,
    /// `@Immutable`.
    pub immutable: bool,
    /// `@Filter`s.
    pub filters: Vec<FilterAnnotation>,
    /// `@SQLInsert`, `@SQLUpdate`, `@SQLDelete` and `@SQLDeleteAll`.
    pub custom_sql: Vec<CustomSqlAnnotation>,
    /// `@Loader(namedQuery = ...)`.
    pub loader: Option<String>,
    /// `@AttributeOverride`s.
    pub attribute_overrides: Vec<AttributeOverrideAnnotation>,
    /// Lifecycle callbacks declared on the class.
    pub callbacks: Vec<CallbackDefinition>,

    /// Declared attributes, in declaration order.
    pub properties: Vec<PropertyDescriptor>,
}

impl EntityDescriptor {
    /// An entity for `class_name` with nothing declared yet.
    #[must_use]
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            ..Self::default()
        }
    }

    /// The JPA entity name: `@Entity(name)` or the unqualified class name.
    #[must_use]
    pub fn jpa_entity_name(&self) -> &str {
        non_blank(self.entity_name.as_deref()).unwrap_or_else(|| unqualify(&self.class_name))
    }

    /// Sets the direct superclass.
    #[must_use]
    pub fn extends(mut self, superclass: impl Into<String>) -> Self {
        self.superclass = Some(superclass.into());
        self
    }

    /// Sets `@Entity(name = ...)`.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.entity_name = Some(name.into());
        self
    }

    /// Sets `@Table`.
    #[must_use]
    pub fn with_table(mut self, table: TableAnnotation) -> Self {
        self.table = Some(table);
        self
    }

    /// Sets `@Inheritance`.
    #[must_use]
    pub fn with_inheritance(mut self, strategy: InheritanceType) -> Self {
        self.inheritance = Some(strategy);
        self
    }

    /// Sets `@DiscriminatorColumn`.
    #[must_use]
    pub fn with_discriminator_column(mut self, column: DiscriminatorColumnAnnotation) -> Self {
        self.discriminator_column = Some(column);
        self
    }

    /// Sets `@DiscriminatorValue`.
    #[must_use]
    pub fn with_discriminator_value(mut self, value: impl Into<String>) -> Self {
        self.discriminator_value = Some(value.into());
        self
    }

    /// Sets `@IdClass`.
    #[must_use]
    pub fn with_id_class(mut self, id_class: impl Into<String>) -> Self {
        self.id_class = Some(id_class.into());
        self
    }

    /// Adds a `@SecondaryTable`.
    #[must_use]
    pub fn with_secondary_table(mut self, table: SecondaryTableAnnotation) -> Self {
        self.secondary_tables.push(table);
        self
    }

    /// Sets `@Cache`.
    #[must_use]
    pub fn with_cache(mut self, cache: CacheAnnotation) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Sets `@Cacheable`.
    #[must_use]
    pub fn with_cacheable(mut self, cacheable: bool) -> Self {
        self.cacheable = Some(cacheable);
        self
    }

    /// Adds a `@Filter`.
    #[must_use]
    pub fn with_filter(mut self, filter: FilterAnnotation) -> Self {
        self.filters.push(filter);
        self
    }

    /// Adds a custom SQL statement.
    #[must_use]
    pub fn with_custom_sql(mut self, sql: CustomSqlAnnotation) -> Self {
        self.custom_sql.push(sql);
        self
    }

    /// Appends a declared attribute.
    #[must_use]
    pub fn with_property(mut self, property: PropertyDescriptor) -> Self {
        self.properties.push(property);
        self
    }

    /// Declared attribute by name.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.properties.iter().find(|p| p.name == name)
    }
}

/// A `@MappedSuperclass` contributing attributes to its entity subclasses.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct MappedSuperclassDescriptor {
    /// Fully qualified class name.
    pub class_name: String,
    /// Direct superclass.
    pub superclass: Option<String>,
    /// `@IdClass`.
    pub id_class: Option<String>,
    /// `@Filter`s.
    pub filters: Vec<FilterAnnotation>,
    /// Lifecycle callbacks declared on the class.
    pub callbacks: Vec<CallbackDefinition>,
    /// Declared attributes.
    pub properties: Vec<PropertyDescriptor>,
}

impl MappedSuperclassDescriptor {
    /// A mapped superclass with nothing declared yet.
    #[must_use]
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            ..Self::default()
        }
    }

    /// Appends a declared attribute.
    #[must_use]
    pub fn with_property(mut self, property: PropertyDescriptor) -> Self {
        self.properties.push(property);
        self
    }
}

/// An `@Embeddable` class, also used to describe `@IdClass` types.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct EmbeddableDescriptor {
    /// Fully qualified class name.
    pub class_name: String,
    /// Lifecycle callbacks declared on the class.
    pub callbacks: Vec<CallbackDefinition>,
    /// Declared attributes.
    pub properties: Vec<PropertyDescriptor>,
}

impl EmbeddableDescriptor {
    /// An embeddable with nothing declared yet.
    #[must_use]
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            ..Self::default()
        }
    }

    /// Appends a declared attribute.
    #[must_use]
    pub fn with_property(mut self, property: PropertyDescriptor) -> Self {
        self.properties.push(property);
        self
    }
}
