//! Mapped entity classes and their secondary-table joins.

use ormbind_foundation::Name;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::bindings::ClassId;
use crate::callback::CallbackDefinition;
use crate::column::ColumnId;
use crate::constraint::PrimaryKey;
use crate::database::Database;
use crate::property::{IDENTIFIER_MAPPER_PROPERTY, Property};
use crate::table::TableId;
use crate::value::{Component, DependantValue, SimpleValue, Value};

/// Optimistic locking strategy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum OptimisticLockStyle {
    /// No optimistic locking.
    None,
    /// A version column.
    #[default]
    Version,
    /// Compare dirty columns.
    Dirty,
    /// Compare every column.
    All,
}

/// How the row count of a custom statement is checked.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ResultCheckStyle {
    /// No check.
    #[default]
    None,
    /// Check the affected row count.
    Count,
    /// Check an output parameter.
    Param,
}

/// A user-supplied SQL statement replacing a generated one.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CustomSql {
    /// Statement text, trimmed.
    pub sql: String,
    /// Whether the statement is a procedure call.
    pub callable: bool,
    /// Row count check.
    pub check: ResultCheckStyle,
}

impl CustomSql {
    /// Creates a custom statement from raw text.
    #[must_use]
    pub fn new(sql: &str, callable: bool, check: ResultCheckStyle) -> Self {
        Self {
            sql: sql.trim().to_string(),
            callable,
            check,
        }
    }
}

/// A filter applied to an entity.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FilterConfig {
    /// Filter name, matching a filter definition.
    pub name: String,
    /// Effective condition.
    pub condition: String,
    /// Whether table aliases are injected into the condition.
    pub auto_alias_injection: bool,
    /// Alias to table mappings.
    pub alias_tables: Vec<(String, String)>,
    /// Alias to entity mappings.
    pub alias_entities: Vec<(String, String)>,
}

/// A secondary table joined to an entity's primary table.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Join {
    table: TableId,
    key: Option<DependantValue>,
    properties: Vec<Property>,
    inverse: bool,
    optional: bool,
    custom_sql_insert: Option<CustomSql>,
    custom_sql_update: Option<CustomSql>,
    custom_sql_delete: Option<CustomSql>,
}

impl Join {
    /// Creates an optional, non-inverse join to `table`.
    #[must_use]
    pub fn new(table: TableId) -> Self {
        Self {
            table,
            key: None,
            properties: Vec::new(),
            inverse: false,
            optional: true,
            custom_sql_insert: None,
            custom_sql_update: None,
            custom_sql_delete: None,
        }
    }

    /// The joined table.
    #[must_use]
    pub fn table(&self) -> TableId {
        self.table
    }

    /// Key mapping the join rows to the entity.
    #[must_use]
    pub fn key(&self) -> Option<&DependantValue> {
        self.key.as_ref()
    }

    /// Key for modification.
    pub fn key_mut(&mut self) -> Option<&mut DependantValue> {
        self.key.as_mut()
    }

    /// Sets the key.
    pub fn set_key(&mut self, key: DependantValue) {
        self.key = Some(key);
    }

    /// Properties stored on the joined table.
    #[must_use]
    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    /// Appends a property.
    pub fn add_property(&mut self, property: Property) {
        self.properties.push(property);
    }

    /// Looks up a property.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name() == name)
    }

    /// Looks up a property for modification.
    pub fn property_mut(&mut self, name: &str) -> Option<&mut Property> {
        self.properties.iter_mut().find(|p| p.name() == name)
    }

    /// Whether the entity never writes the joined row.
    #[must_use]
    pub fn is_inverse(&self) -> bool {
        self.inverse
    }

    /// Sets inverse.
    pub fn set_inverse(&mut self, inverse: bool) {
        self.inverse = inverse;
    }

    /// Whether the joined row may be absent.
    #[must_use]
    pub fn is_optional(&self) -> bool {
        self.optional
    }

    /// Sets optional.
    pub fn set_optional(&mut self, optional: bool) {
        self.optional = optional;
    }

    /// Custom insert, if any.
    #[must_use]
    pub fn custom_sql_insert(&self) -> Option<&CustomSql> {
        self.custom_sql_insert.as_ref()
    }

    /// Custom update, if any.
    #[must_use]
    pub fn custom_sql_update(&self) -> Option<&CustomSql> {
        self.custom_sql_update.as_ref()
    }

    /// Custom delete, if any.
    #[must_use]
    pub fn custom_sql_delete(&self) -> Option<&CustomSql> {
        self.custom_sql_delete.as_ref()
    }

    /// Sets the custom insert.
    pub fn set_custom_sql_insert(&mut self, sql: CustomSql) {
        self.custom_sql_insert = Some(sql);
    }

    /// Sets the custom update.
    pub fn set_custom_sql_update(&mut self, sql: CustomSql) {
        self.custom_sql_update = Some(sql);
    }

    /// Sets the custom delete.
    pub fn set_custom_sql_delete(&mut self, sql: CustomSql) {
        self.custom_sql_delete = Some(sql);
    }

    /// Makes the key columns the joined table's primary key.
    pub fn create_primary_key(&self, db: &mut Database) {
        let Some(key) = &self.key else { return };
        if let Some(table) = db.table_mut(self.table) {
            table.set_primary_key(PrimaryKey::new(key.columns()));
        }
    }
}

/// State that only a hierarchy root carries.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RootData {
    /// Identifier value: a simple value or a component.
    pub identifier: Option<Value>,
    /// Identifier property; absent for synthetic embedded identifiers.
    pub identifier_property: Option<Property>,
    /// Whether the identifier is a synthetic component of the entity's own attributes.
    pub embedded_identifier: bool,
    /// Discriminator column or formula.
    pub discriminator: Option<SimpleValue>,
    /// Whether the hierarchy is polymorphic.
    pub polymorphic: bool,
    /// Whether only explicit queries return this hierarchy.
    pub explicit_polymorphism: bool,
    /// Whether the discriminator restricts every select.
    pub force_discriminator: bool,
    /// Whether the discriminator is written on insert.
    pub discriminator_insertable: bool,
    /// Whether instances may be updated.
    pub mutable: bool,
    /// SQL restriction applied to every load.
    pub where_clause: Option<String>,
    /// Cache concurrency strategy name.
    pub cache_concurrency_strategy: Option<String>,
    /// Cache region name.
    pub cache_region_name: Option<String>,
    /// Whether lazy properties are cached.
    pub lazy_properties_cacheable: bool,
    /// Cache region for natural-id lookups.
    pub natural_id_cache_region_name: Option<String>,
    /// Name of the version property.
    pub version: Option<Name>,
}

impl Default for RootData {
    fn default() -> Self {
        Self {
            identifier: None,
            identifier_property: None,
            embedded_identifier: false,
            discriminator: None,
            polymorphic: false,
            explicit_polymorphism: false,
            force_discriminator: false,
            discriminator_insertable: true,
            mutable: true,
            where_clause: None,
            cache_concurrency_strategy: None,
            cache_region_name: None,
            lazy_properties_cacheable: true,
            natural_id_cache_region_name: None,
            version: None,
        }
    }
}

impl RootData {
    /// Identifier columns, if an identifier is bound.
    #[must_use]
    pub fn identifier_columns(&self) -> Vec<ColumnId> {
        self.identifier.as_ref().map(Value::columns).unwrap_or_default()
    }

    /// The identifier as a component, if it is one.
    #[must_use]
    pub fn identifier_component(&self) -> Option<&Component> {
        self.identifier.as_ref().and_then(Value::as_component)
    }

    /// Copies the identifier property's value back into `identifier`.
    ///
    /// Needed after the property's value was modified in place, e.g. when a
    /// derived identity association received its join columns.
    pub fn sync_identifier(&mut self) {
        if let Some(property) = &self.identifier_property {
            self.identifier = Some(property.value().clone());
        }
    }
}

/// Which kind of class in an inheritance hierarchy.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ClassKind {
    /// The hierarchy root, owning the identifier.
    Root(Box<RootData>),
    /// Shares the root's table.
    SingleTable,
    /// Has its own table joined to the parent's by `key`.
    Joined {
        /// Key columns referencing the parent's primary key.
        key: Option<DependantValue>,
    },
    /// Has a denormalized table holding all inherited columns.
    Union,
}

impl ClassKind {
    /// Short name of the inheritance role, for messages.
    #[must_use]
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Root(_) => "root",
            Self::SingleTable => "single-table subclass",
            Self::Joined { .. } => "joined subclass",
            Self::Union => "union subclass",
        }
    }
}

/// A mapped entity class.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PersistentClass {
    kind: ClassKind,
    entity_name: String,
    table: TableId,
    superclass: Option<ClassId>,
    subclasses: Vec<ClassId>,
    properties: Vec<Property>,
    joins: Vec<Join>,

    /// Name used in queries.
    pub jpa_entity_name: String,
    /// Mapped class name.
    pub class_name: String,
    /// Proxy interface; defaults to the class itself.
    pub proxy_interface_name: Option<String>,
    /// Discriminator value identifying this class's rows.
    pub discriminator_value: Option<String>,
    /// Insert only non-null columns.
    pub dynamic_insert: bool,
    /// Update only changed columns.
    pub dynamic_update: bool,
    /// Select the row before updating it.
    pub select_before_update: bool,
    /// Batch fetch size; `-1` when unset.
    pub batch_size: i32,
    /// Whether instances may be proxied.
    pub lazy: bool,
    /// Whether the class is abstract.
    pub is_abstract: Option<bool>,
    /// Whether instances are cached.
    pub cached: bool,
    /// Optimistic locking strategy.
    pub optimistic_lock_style: OptimisticLockStyle,
    /// Custom insert statement.
    pub custom_sql_insert: Option<CustomSql>,
    /// Custom update statement.
    pub custom_sql_update: Option<CustomSql>,
    /// Custom delete statement.
    pub custom_sql_delete: Option<CustomSql>,
    /// Named query used to load instances.
    pub loader_name: Option<String>,
    /// Tables a subselect entity depends on.
    pub synchronized_tables: Vec<String>,
    /// Filters applied to the entity.
    pub filters: Vec<FilterConfig>,
    /// Lifecycle callbacks of the entity.
    pub callback_definitions: Vec<CallbackDefinition>,
}

impl PersistentClass {
    fn with_kind(kind: ClassKind, entity_name: &str, table: TableId, superclass: Option<ClassId>) -> Self {
        Self {
            kind,
            entity_name: entity_name.to_string(),
            table,
            superclass,
            subclasses: Vec::new(),
            properties: Vec::new(),
            joins: Vec::new(),
            jpa_entity_name: String::new(),
            class_name: entity_name.to_string(),
            proxy_interface_name: None,
            discriminator_value: None,
            dynamic_insert: false,
            dynamic_update: false,
            select_before_update: false,
            batch_size: -1,
            lazy: true,
            is_abstract: None,
            cached: false,
            optimistic_lock_style: OptimisticLockStyle::Version,
            custom_sql_insert: None,
            custom_sql_update: None,
            custom_sql_delete: None,
            loader_name: None,
            synchronized_tables: Vec::new(),
            filters: Vec::new(),
            callback_definitions: Vec::new(),
        }
    }

    /// Creates a hierarchy root mapped to `table`.
    #[must_use]
    pub fn root(entity_name: &str, table: TableId) -> Self {
        Self::with_kind(ClassKind::Root(Box::default()), entity_name, table, None)
    }

    /// Creates a subclass of `superclass`.
    ///
    /// `kind` must not be [`ClassKind::Root`]. A single-table subclass is
    /// given its root's table.
    #[must_use]
    pub fn subclass(kind: ClassKind, entity_name: &str, table: TableId, superclass: ClassId) -> Self {
        Self::with_kind(kind, entity_name, table, Some(superclass))
    }

    /// Which kind of class this is.
    #[must_use]
    pub fn kind(&self) -> &ClassKind {
        &self.kind
    }

    /// Kind for modification.
    pub fn kind_mut(&mut self) -> &mut ClassKind {
        &mut self.kind
    }

    /// Whether this is a hierarchy root.
    #[must_use]
    pub fn is_root(&self) -> bool {
        matches!(self.kind, ClassKind::Root(_))
    }

    /// Whether this is a joined subclass.
    #[must_use]
    pub fn is_joined_subclass(&self) -> bool {
        matches!(self.kind, ClassKind::Joined { .. })
    }

    /// Root-only state; `None` for subclasses.
    #[must_use]
    pub fn root_data(&self) -> Option<&RootData> {
        match &self.kind {
            ClassKind::Root(data) => Some(data),
            _ => None,
        }
    }

    /// Root-only state for modification.
    pub fn root_data_mut(&mut self) -> Option<&mut RootData> {
        match &mut self.kind {
            ClassKind::Root(data) => Some(data),
            _ => None,
        }
    }

    /// Key of a joined subclass.
    #[must_use]
    pub fn joined_key(&self) -> Option<&DependantValue> {
        match &self.kind {
            ClassKind::Joined { key } => key.as_ref(),
            _ => None,
        }
    }

    /// Key of a joined subclass for modification.
    pub fn joined_key_mut(&mut self) -> Option<&mut DependantValue> {
        match &mut self.kind {
            ClassKind::Joined { key } => key.as_mut(),
            _ => None,
        }
    }

    /// Fully qualified entity name.
    #[must_use]
    pub fn entity_name(&self) -> &str {
        &self.entity_name
    }

    /// Table holding this class's own columns.
    #[must_use]
    pub fn table(&self) -> TableId {
        self.table
    }

    /// Parent entity, if any.
    #[must_use]
    pub fn superclass(&self) -> Option<ClassId> {
        self.superclass
    }

    /// Direct subclasses in registration order.
    #[must_use]
    pub fn subclasses(&self) -> &[ClassId] {
        &self.subclasses
    }

    pub(crate) fn add_subclass(&mut self, subclass: ClassId) {
        if !self.subclasses.contains(&subclass) {
            self.subclasses.push(subclass);
        }
    }

    /// Whether the class has direct subclasses.
    #[must_use]
    pub fn has_subclasses(&self) -> bool {
        !self.subclasses.is_empty()
    }

    /// Properties declared on the primary table.
    #[must_use]
    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    /// Appends a property.
    pub fn add_property(&mut self, property: Property) {
        self.properties.push(property);
    }

    /// Looks up a property on the primary table or any join.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties
            .iter()
            .find(|p| p.name() == name)
            .or_else(|| self.joins.iter().find_map(|j| j.property(name)))
    }

    /// Looks up a property on the primary table or any join for modification.
    pub fn property_mut(&mut self, name: &str) -> Option<&mut Property> {
        if let Some(pos) = self.properties.iter().position(|p| p.name() == name) {
            return Some(&mut self.properties[pos]);
        }
        self.joins.iter_mut().find_map(|j| j.property_mut(name))
    }

    /// Properties of the primary table followed by those of every join.
    pub fn property_closure(&self) -> impl Iterator<Item = &Property> + '_ {
        self.properties
            .iter()
            .chain(self.joins.iter().flat_map(|j| j.properties().iter()))
    }

    /// The `@IdClass` mapper component, if present.
    #[must_use]
    pub fn identifier_mapper(&self) -> Option<&Component> {
        self.properties
            .iter()
            .find(|p| p.name() == IDENTIFIER_MAPPER_PROPERTY)
            .and_then(|p| p.value().as_component())
    }

    /// Secondary table joins.
    #[must_use]
    pub fn joins(&self) -> &[Join] {
        &self.joins
    }

    /// Joins for modification.
    pub fn joins_mut(&mut self) -> &mut [Join] {
        &mut self.joins
    }

    /// Appends a join.
    pub fn add_join(&mut self, join: Join) {
        self.joins.push(join);
    }

    /// The join to `table`, if any.
    #[must_use]
    pub fn join_for_table(&self, table: TableId) -> Option<&Join> {
        self.joins.iter().find(|j| j.table() == table)
    }

    /// The join to `table` for modification.
    pub fn join_for_table_mut(&mut self, table: TableId) -> Option<&mut Join> {
        self.joins.iter_mut().find(|j| j.table() == table)
    }

    /// Whether the entity is abstract.
    #[must_use]
    pub fn is_abstract(&self) -> bool {
        self.is_abstract.unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::SimpleValue;

    #[test]
    fn root_defaults() {
        let class = PersistentClass::root("com.acme.Order", TableId::from_index(0));
        assert!(class.is_root());
        assert_eq!(class.batch_size, -1);
        assert!(class.lazy);
        assert_eq!(class.optimistic_lock_style, OptimisticLockStyle::Version);
        let root = class.root_data().unwrap();
        assert!(root.mutable);
        assert!(root.discriminator_insertable);
        assert!(root.lazy_properties_cacheable);
    }

    #[test]
    fn property_lookup_includes_joins() {
        let t = TableId::from_index(0);
        let s = TableId::from_index(1);
        let mut class = PersistentClass::root("Order", t);
        class.add_property(Property::new(Name::from("code"), Value::Simple(SimpleValue::new(t))));
        let mut join = Join::new(s);
        join.add_property(Property::new(Name::from("notes"), Value::Simple(SimpleValue::new(s))));
        class.add_join(join);

        assert!(class.property("code").is_some());
        assert!(class.property("notes").is_some());
        assert!(class.property_mut("notes").is_some());
        assert_eq!(class.property_closure().count(), 2);
        assert!(class.join_for_table(s).is_some());
    }

    #[test]
    fn custom_sql_is_trimmed() {
        let sql = CustomSql::new("  update t set x = ?  ", false, ResultCheckStyle::Count);
        assert_eq!(sql.sql, "update t set x = ?");
    }
}
