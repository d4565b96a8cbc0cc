//! Mapped values: what a property stores and how it maps to columns.
//!
//! [`Value`] is a closed sum. The column-backed variants share a
//! [`SimpleValue`] core; to-one associations layer a [`ToOne`] on top of it.
//! `ToOne` and its wrappers dereference to their core so column handling reads
//! the same for every variant.

use std::ops::{Deref, DerefMut};

use ormbind_foundation::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::column::{ColumnId, Selectable};
use crate::database::Database;
use crate::property::Property;
use crate::table::TableId;

/// How an association is fetched.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FetchMode {
    /// Outer-join fetch with the owner.
    Join,
    /// Separate select.
    #[default]
    Select,
    /// Subselect fetch; only meaningful for collections.
    Subselect,
}

/// What to do when a foreign key refers to a missing row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum NotFoundAction {
    /// Raise an error.
    Exception,
    /// Treat the association as null.
    Ignore,
}

/// Side of a one-to-one that owns the foreign key.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ForeignKeyDirection {
    /// The owner's primary key refers to the target.
    #[default]
    FromParent,
    /// The target refers back to the owner.
    ToParent,
}

/// Name, definition, and creation switch of a value's foreign key.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ForeignKeySettings {
    name: Option<String>,
    definition: Option<String>,
    disabled: bool,
}

impl ForeignKeySettings {
    /// Explicit constraint name.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Sets the constraint name; blank names are ignored.
    pub fn set_name(&mut self, name: Option<&str>) {
        if let Some(name) = ormbind_foundation::names::non_blank(name) {
            self.name = Some(name.to_string());
        }
    }

    /// Raw DDL definition.
    #[must_use]
    pub fn definition(&self) -> Option<&str> {
        self.definition.as_deref()
    }

    /// Sets the DDL definition; blank definitions are ignored.
    pub fn set_definition(&mut self, definition: Option<&str>) {
        if let Some(definition) = ormbind_foundation::names::non_blank(definition) {
            self.definition = Some(definition.to_string());
        }
    }

    /// Marks the value as having no physical constraint.
    pub fn disable(&mut self) {
        self.disabled = true;
    }

    /// Whether constraint creation is disabled.
    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.disabled
    }
}

/// A value backed directly by columns or formulas of one table.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SimpleValue {
    table: TableId,
    selectables: Vec<Selectable>,
    insertability: Vec<bool>,
    updatability: Vec<bool>,
    type_name: Option<String>,
    foreign_key: ForeignKeySettings,
    cascade_delete: bool,
    alternate_unique_key: bool,
}

impl SimpleValue {
    /// Creates a value with no columns yet.
    #[must_use]
    pub fn new(table: TableId) -> Self {
        Self {
            table,
            selectables: Vec::new(),
            insertability: Vec::new(),
            updatability: Vec::new(),
            type_name: None,
            foreign_key: ForeignKeySettings::default(),
            cascade_delete: false,
            alternate_unique_key: false,
        }
    }

    /// Table holding the columns.
    #[must_use]
    pub fn table(&self) -> TableId {
        self.table
    }

    /// Maps the value to another column.
    ///
    /// Adding a column twice with the same flags is a no-op.
    ///
    /// # Errors
    ///
    /// Returns a mapping error if the column is re-added with different
    /// insertable or updatable flags.
    pub fn add_column(&mut self, column: ColumnId, insertable: bool, updatable: bool) -> Result<()> {
        let selectable = Selectable::Column(column);
        if let Some(pos) = self.selectables.iter().position(|s| *s == selectable) {
            if self.insertability[pos] != insertable || self.updatability[pos] != updatable {
                return Err(Error::mapping(
                    "Same column is added more than once with different values for isInsertable or isUpdatable",
                ));
            }
            return Ok(());
        }
        self.selectables.push(selectable);
        self.insertability.push(insertable);
        self.updatability.push(updatable);
        Ok(())
    }

    /// Maps the value to a read-only formula.
    pub fn add_formula(&mut self, formula: impl Into<String>) {
        self.selectables.push(Selectable::Formula(formula.into()));
        self.insertability.push(false);
        self.updatability.push(false);
    }

    /// Columns and formulas in mapping order.
    #[must_use]
    pub fn selectables(&self) -> &[Selectable] {
        &self.selectables
    }

    /// Mapped columns in order, skipping formulas.
    #[must_use]
    pub fn columns(&self) -> Vec<ColumnId> {
        self.selectables.iter().filter_map(Selectable::column).collect()
    }

    /// Number of columns and formulas.
    #[must_use]
    pub fn column_span(&self) -> usize {
        self.selectables.len()
    }

    /// Whether any selectable is a formula.
    #[must_use]
    pub fn has_formula(&self) -> bool {
        self.selectables.iter().any(Selectable::is_formula)
    }

    /// Per-selectable insertability.
    #[must_use]
    pub fn column_insertability(&self) -> &[bool] {
        &self.insertability
    }

    /// Per-selectable updatability.
    #[must_use]
    pub fn column_updatability(&self) -> &[bool] {
        &self.updatability
    }

    /// Forces insertability of every column mapping.
    pub fn set_insertable(&mut self, insertable: bool) {
        for (flag, s) in self.insertability.iter_mut().zip(&self.selectables) {
            *flag = insertable && !s.is_formula();
        }
    }

    /// Forces updatability of every column mapping.
    pub fn set_updatable(&mut self, updatable: bool) {
        for (flag, s) in self.updatability.iter_mut().zip(&self.selectables) {
            *flag = updatable && !s.is_formula();
        }
    }

    /// A value is nullable unless one of its columns is non-null.
    ///
    /// Formulas are always considered nullable.
    #[must_use]
    pub fn is_nullable(&self, db: &Database) -> bool {
        for selectable in &self.selectables {
            match selectable {
                Selectable::Formula(_) => return true,
                Selectable::Column(id) => {
                    if db.column(*id).is_some_and(|c| !c.is_nullable()) {
                        return false;
                    }
                }
            }
        }
        true
    }

    /// Type name, if known.
    #[must_use]
    pub fn type_name(&self) -> Option<&str> {
        self.type_name.as_deref()
    }

    /// Sets the type name.
    pub fn set_type_name(&mut self, type_name: impl Into<String>) {
        self.type_name = Some(type_name.into());
    }

    /// Foreign key settings.
    #[must_use]
    pub fn foreign_key(&self) -> &ForeignKeySettings {
        &self.foreign_key
    }

    /// Foreign key settings for modification.
    pub fn foreign_key_mut(&mut self) -> &mut ForeignKeySettings {
        &mut self.foreign_key
    }

    /// Whether deleting the referenced row cascades to this one.
    #[must_use]
    pub fn is_cascade_delete(&self) -> bool {
        self.cascade_delete
    }

    /// Sets cascade delete.
    pub fn set_cascade_delete(&mut self, cascade: bool) {
        self.cascade_delete = cascade;
    }

    /// Whether the columns form an alternate unique key (a property reference target).
    #[must_use]
    pub fn is_alternate_unique_key(&self) -> bool {
        self.alternate_unique_key
    }

    /// Marks the columns as an alternate unique key.
    pub fn set_alternate_unique_key(&mut self, unique: bool) {
        self.alternate_unique_key = unique;
    }

    /// Creates the foreign key from this value's columns to `entity`.
    ///
    /// Nothing is created for a value with formulas, without columns, or
    /// with constraint creation disabled. An empty `referenced_columns`
    /// refers to the target's primary key.
    ///
    /// # Errors
    ///
    /// Returns an assertion failure if the value's table does not exist.
    pub fn create_foreign_key(
        &self,
        db: &mut Database,
        entity: &str,
        referenced_table: Option<TableId>,
        referenced_columns: Vec<ColumnId>,
    ) -> Result<()> {
        let columns = self.columns();
        if self.has_formula() || self.foreign_key.is_disabled() || columns.is_empty() {
            return Ok(());
        }
        let table = db.require_table_mut(self.table)?;
        let fk = table.create_foreign_key(
            self.foreign_key.name().map(str::to_string),
            columns,
            entity,
            self.foreign_key.definition().map(str::to_string),
            referenced_columns,
        );
        fk.set_cascade_delete(self.cascade_delete);
        if let Some(referenced) = referenced_table {
            fk.set_referenced_table(referenced);
        }
        Ok(())
    }
}

/// State shared by many-to-one and one-to-one values.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ToOne {
    simple: SimpleValue,
    referenced_entity_name: Option<String>,
    referenced_property_name: Option<String>,
    property_name: Option<String>,
    fetch_mode: FetchMode,
    lazy: bool,
    unwrap_proxy: bool,
    unwrap_proxy_implicit: bool,
    reference_to_primary_key: bool,
}

impl ToOne {
    fn new(table: TableId) -> Self {
        Self {
            simple: SimpleValue::new(table),
            referenced_entity_name: None,
            referenced_property_name: None,
            property_name: None,
            fetch_mode: FetchMode::Select,
            lazy: true,
            unwrap_proxy: false,
            unwrap_proxy_implicit: false,
            reference_to_primary_key: true,
        }
    }

    /// Target entity name.
    #[must_use]
    pub fn referenced_entity_name(&self) -> Option<&str> {
        self.referenced_entity_name.as_deref()
    }

    /// Sets the target entity name.
    pub fn set_referenced_entity_name(&mut self, name: impl Into<String>) {
        self.referenced_entity_name = Some(name.into());
    }

    /// Target property for a non-primary-key reference.
    #[must_use]
    pub fn referenced_property_name(&self) -> Option<&str> {
        self.referenced_property_name.as_deref()
    }

    /// Sets the referenced property; `Some` also clears the primary key reference flag.
    pub fn set_referenced_property_name(&mut self, name: Option<String>) {
        self.reference_to_primary_key = name.is_none();
        self.referenced_property_name = name;
    }

    /// Whether the association refers to the target's primary key.
    #[must_use]
    pub fn is_reference_to_primary_key(&self) -> bool {
        self.reference_to_primary_key
    }

    /// Overrides the primary key reference flag, e.g. for a `mappedBy` side
    /// whose target property is part of a derived identifier.
    pub fn set_reference_to_primary_key(&mut self, reference: bool) {
        self.reference_to_primary_key = reference;
    }

    /// Name of the owning property.
    #[must_use]
    pub fn property_name(&self) -> Option<&str> {
        self.property_name.as_deref()
    }

    /// Sets the owning property name.
    pub fn set_property_name(&mut self, name: impl Into<String>) {
        self.property_name = Some(name.into());
    }

    /// Fetch mode.
    #[must_use]
    pub fn fetch_mode(&self) -> FetchMode {
        self.fetch_mode
    }

    /// Sets the fetch mode.
    pub fn set_fetch_mode(&mut self, mode: FetchMode) {
        self.fetch_mode = mode;
    }

    /// Whether the target loads lazily.
    #[must_use]
    pub fn is_lazy(&self) -> bool {
        self.lazy
    }

    /// Sets laziness.
    pub fn set_lazy(&mut self, lazy: bool) {
        self.lazy = lazy;
    }

    /// Whether the proxy is unwrapped on access.
    #[must_use]
    pub fn is_unwrap_proxy(&self) -> bool {
        self.unwrap_proxy
    }

    /// Sets proxy unwrapping.
    pub fn set_unwrap_proxy(&mut self, unwrap: bool) {
        self.unwrap_proxy = unwrap;
    }

    /// Whether unwrapping was derived rather than declared.
    #[must_use]
    pub fn is_unwrap_proxy_implicit(&self) -> bool {
        self.unwrap_proxy_implicit
    }

    /// Sets the implicit-unwrap marker.
    pub fn set_unwrap_proxy_implicit(&mut self, implicit: bool) {
        self.unwrap_proxy_implicit = implicit;
    }
}

impl Deref for ToOne {
    type Target = SimpleValue;

    fn deref(&self) -> &SimpleValue {
        &self.simple
    }
}

impl DerefMut for ToOne {
    fn deref_mut(&mut self) -> &mut SimpleValue {
        &mut self.simple
    }
}

/// A foreign-key association to a single entity.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ManyToOne {
    to_one: ToOne,
    not_found_action: Option<NotFoundAction>,
    logical_one_to_one: bool,
}

impl ManyToOne {
    /// Creates an unmapped many-to-one on `table`.
    #[must_use]
    pub fn new(table: TableId) -> Self {
        Self {
            to_one: ToOne::new(table),
            not_found_action: None,
            logical_one_to_one: false,
        }
    }

    /// Declared not-found handling.
    #[must_use]
    pub fn not_found_action(&self) -> Option<NotFoundAction> {
        self.not_found_action
    }

    /// Sets not-found handling.
    pub fn set_not_found_action(&mut self, action: Option<NotFoundAction>) {
        self.not_found_action = action;
    }

    /// Whether missing targets are ignored.
    #[must_use]
    pub fn is_ignore_not_found(&self) -> bool {
        self.not_found_action == Some(NotFoundAction::Ignore)
    }

    /// Whether this many-to-one stands in for a one-to-one and must be unique.
    #[must_use]
    pub fn is_logical_one_to_one(&self) -> bool {
        self.logical_one_to_one
    }

    /// Marks the association as a logical one-to-one.
    pub fn mark_as_logical_one_to_one(&mut self) {
        self.logical_one_to_one = true;
    }
}

impl Deref for ManyToOne {
    type Target = ToOne;

    fn deref(&self) -> &ToOne {
        &self.to_one
    }
}

impl DerefMut for ManyToOne {
    fn deref_mut(&mut self) -> &mut ToOne {
        &mut self.to_one
    }
}

/// A primary-key-shared or `mappedBy` association to a single entity.
///
/// The value maps no columns of its own; its constraint columns are the
/// owner's identifier columns.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OneToOne {
    to_one: ToOne,
    owner_entity_name: String,
    foreign_key_direction: ForeignKeyDirection,
    constrained: bool,
    mapped_by: Option<String>,
    identifier_columns: Vec<ColumnId>,
}

impl OneToOne {
    /// Creates a one-to-one owned by `owner_entity_name`, stored on `table`.
    #[must_use]
    pub fn new(table: TableId, owner_entity_name: impl Into<String>) -> Self {
        Self {
            to_one: ToOne::new(table),
            owner_entity_name: owner_entity_name.into(),
            foreign_key_direction: ForeignKeyDirection::FromParent,
            constrained: false,
            mapped_by: None,
            identifier_columns: Vec::new(),
        }
    }

    /// Entity that declares the association.
    #[must_use]
    pub fn owner_entity_name(&self) -> &str {
        &self.owner_entity_name
    }

    /// Which side holds the foreign key.
    #[must_use]
    pub fn foreign_key_direction(&self) -> ForeignKeyDirection {
        self.foreign_key_direction
    }

    /// Sets the foreign key direction.
    pub fn set_foreign_key_direction(&mut self, direction: ForeignKeyDirection) {
        self.foreign_key_direction = direction;
    }

    /// Whether the owner's primary key is constrained by the target's.
    #[must_use]
    pub fn is_constrained(&self) -> bool {
        self.constrained
    }

    /// Sets the constrained flag.
    pub fn set_constrained(&mut self, constrained: bool) {
        self.constrained = constrained;
    }

    /// Property on the target that owns the association, if inverse.
    #[must_use]
    pub fn mapped_by(&self) -> Option<&str> {
        self.mapped_by.as_deref()
    }

    /// Sets the inverse side's property name.
    pub fn set_mapped_by(&mut self, mapped_by: Option<String>) {
        self.mapped_by = mapped_by;
    }

    /// Owner identifier columns the constraint is built on.
    #[must_use]
    pub fn identifier_columns(&self) -> &[ColumnId] {
        &self.identifier_columns
    }

    /// Sets the owner identifier columns.
    pub fn set_identifier_columns(&mut self, columns: Vec<ColumnId>) {
        self.identifier_columns = columns;
    }

    /// A one-to-one is nullable unless constrained.
    #[must_use]
    pub fn is_nullable(&self) -> bool {
        !self.constrained
    }

    /// Creates the foreign key from the owner's primary key to the target's.
    ///
    /// Only constrained primary-key associations get a constraint.
    ///
    /// # Errors
    ///
    /// Returns an assertion failure if the owner table does not exist.
    pub fn create_foreign_key(&self, db: &mut Database, referenced_table: Option<TableId>) -> Result<()> {
        if !self.constrained
            || self.referenced_property_name().is_some()
            || self.foreign_key().is_disabled()
            || self.identifier_columns.is_empty()
        {
            return Ok(());
        }
        let Some(entity) = self.referenced_entity_name() else {
            return Err(Error::assertion_failure("one-to-one without a referenced entity"));
        };
        let table = db.require_table_mut(self.table())?;
        let fk = table.create_foreign_key(
            self.foreign_key().name().map(str::to_string),
            self.identifier_columns.clone(),
            entity,
            self.foreign_key().definition().map(str::to_string),
            Vec::new(),
        );
        fk.set_cascade_delete(self.is_cascade_delete());
        if let Some(referenced) = referenced_table {
            fk.set_referenced_table(referenced);
        }
        Ok(())
    }
}

impl Deref for OneToOne {
    type Target = ToOne;

    fn deref(&self) -> &ToOne {
        &self.to_one
    }
}

impl DerefMut for OneToOne {
    fn deref_mut(&mut self) -> &mut ToOne {
        &mut self.to_one
    }
}

/// A value whose columns mirror another entity's key, such as a joined
/// subclass key or a secondary table key.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DependantValue {
    simple: SimpleValue,
    wrapped_entity: String,
    nullable: bool,
    updateable: bool,
}

impl DependantValue {
    /// Creates a key on `table` wrapping `wrapped_entity`'s identifier.
    #[must_use]
    pub fn new(table: TableId, wrapped_entity: impl Into<String>) -> Self {
        Self {
            simple: SimpleValue::new(table),
            wrapped_entity: wrapped_entity.into(),
            nullable: false,
            updateable: false,
        }
    }

    /// Entity whose identifier the key mirrors.
    #[must_use]
    pub fn wrapped_entity(&self) -> &str {
        &self.wrapped_entity
    }

    /// Whether the key columns may be null.
    #[must_use]
    pub fn is_key_nullable(&self) -> bool {
        self.nullable
    }

    /// Sets key nullability.
    pub fn set_key_nullable(&mut self, nullable: bool) {
        self.nullable = nullable;
    }

    /// Whether the key may be updated.
    #[must_use]
    pub fn is_key_updateable(&self) -> bool {
        self.updateable
    }

    /// Sets key updatability.
    pub fn set_key_updateable(&mut self, updateable: bool) {
        self.updateable = updateable;
    }
}

impl Deref for DependantValue {
    type Target = SimpleValue;

    fn deref(&self) -> &SimpleValue {
        &self.simple
    }
}

impl DerefMut for DependantValue {
    fn deref_mut(&mut self) -> &mut SimpleValue {
        &mut self.simple
    }
}

/// An embedded group of properties.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Component {
    owner_table: TableId,
    role_name: String,
    component_class_name: Option<String>,
    properties: Vec<Property>,
    key: bool,
    embedded: bool,
}

impl Component {
    /// Creates an empty component on `owner_table`.
    #[must_use]
    pub fn new(owner_table: TableId, role_name: impl Into<String>) -> Self {
        Self {
            owner_table,
            role_name: role_name.into(),
            component_class_name: None,
            properties: Vec::new(),
            key: false,
            embedded: false,
        }
    }

    /// Table holding the component's columns.
    #[must_use]
    pub fn table(&self) -> TableId {
        self.owner_table
    }

    /// Role path of the component within its owner.
    #[must_use]
    pub fn role_name(&self) -> &str {
        &self.role_name
    }

    /// Embeddable class name; `None` for synthetic components.
    #[must_use]
    pub fn component_class_name(&self) -> Option<&str> {
        self.component_class_name.as_deref()
    }

    /// Sets the embeddable class name.
    pub fn set_component_class_name(&mut self, name: impl Into<String>) {
        self.component_class_name = Some(name.into());
    }

    /// Whether the component is an identifier.
    #[must_use]
    pub fn is_key(&self) -> bool {
        self.key
    }

    /// Marks the component as an identifier.
    pub fn set_key(&mut self, key: bool) {
        self.key = key;
    }

    /// Whether the component is synthetic, made of the entity's own attributes.
    #[must_use]
    pub fn is_embedded(&self) -> bool {
        self.embedded
    }

    /// Sets the synthetic flag.
    pub fn set_embedded(&mut self, embedded: bool) {
        self.embedded = embedded;
    }

    /// Appends a property.
    pub fn add_property(&mut self, property: Property) {
        self.properties.push(property);
    }

    /// Properties in declaration order.
    #[must_use]
    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    /// Properties for modification.
    pub fn properties_mut(&mut self) -> &mut [Property] {
        &mut self.properties
    }

    /// Looks up a direct property.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name() == name)
    }

    /// Looks up a direct property for modification.
    pub fn property_mut(&mut self, name: &str) -> Option<&mut Property> {
        self.properties.iter_mut().find(|p| p.name() == name)
    }

    /// Whether a direct property with this name exists.
    #[must_use]
    pub fn has_property(&self, name: &str) -> bool {
        self.property(name).is_some()
    }

    /// Number of direct properties.
    #[must_use]
    pub fn property_span(&self) -> usize {
        self.properties.len()
    }
}

/// A one-to-many collection; element rows carry the foreign key.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Collection {
    role: String,
    owner_entity_name: String,
    element_entity_name: String,
    collection_table: TableId,
    mapped_by: Option<String>,
    inverse: bool,
    lazy: bool,
    fetch_mode: FetchMode,
    key: Option<DependantValue>,
}

impl Collection {
    /// Creates a collection of `element_entity_name` owned by `owner_entity_name`.
    #[must_use]
    pub fn new(
        role: impl Into<String>,
        owner_entity_name: impl Into<String>,
        element_entity_name: impl Into<String>,
        collection_table: TableId,
    ) -> Self {
        Self {
            role: role.into(),
            owner_entity_name: owner_entity_name.into(),
            element_entity_name: element_entity_name.into(),
            collection_table,
            mapped_by: None,
            inverse: false,
            lazy: true,
            fetch_mode: FetchMode::Select,
            key: None,
        }
    }

    /// Qualified role, `<entity>.<property>`.
    #[must_use]
    pub fn role(&self) -> &str {
        &self.role
    }

    /// Entity declaring the collection.
    #[must_use]
    pub fn owner_entity_name(&self) -> &str {
        &self.owner_entity_name
    }

    /// Entity of the elements.
    #[must_use]
    pub fn element_entity_name(&self) -> &str {
        &self.element_entity_name
    }

    /// Table the key columns live on.
    #[must_use]
    pub fn collection_table(&self) -> TableId {
        self.collection_table
    }

    /// Re-targets the collection at the element table.
    pub fn set_collection_table(&mut self, table: TableId) {
        self.collection_table = table;
    }

    /// Owning property on the element side, if inverse.
    #[must_use]
    pub fn mapped_by(&self) -> Option<&str> {
        self.mapped_by.as_deref()
    }

    /// Sets the owning property on the element side.
    pub fn set_mapped_by(&mut self, mapped_by: Option<String>) {
        self.inverse = mapped_by.is_some();
        self.mapped_by = mapped_by;
    }

    /// Whether the element side owns the association.
    #[must_use]
    pub fn is_inverse(&self) -> bool {
        self.inverse
    }

    /// Whether elements load lazily.
    #[must_use]
    pub fn is_lazy(&self) -> bool {
        self.lazy
    }

    /// Sets laziness.
    pub fn set_lazy(&mut self, lazy: bool) {
        self.lazy = lazy;
    }

    /// Fetch mode.
    #[must_use]
    pub fn fetch_mode(&self) -> FetchMode {
        self.fetch_mode
    }

    /// Sets the fetch mode.
    pub fn set_fetch_mode(&mut self, mode: FetchMode) {
        self.fetch_mode = mode;
    }

    /// Key mapping the element rows back to the owner.
    #[must_use]
    pub fn key(&self) -> Option<&DependantValue> {
        self.key.as_ref()
    }

    /// Sets the key.
    pub fn set_key(&mut self, key: DependantValue) {
        self.key = Some(key);
    }
}

/// A mapped value.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Value {
    /// A basic value: columns or a formula.
    Simple(SimpleValue),
    /// A foreign-key association.
    ManyToOne(ManyToOne),
    /// A primary-key or inverse one-to-one association.
    OneToOne(OneToOne),
    /// An embedded component.
    Component(Component),
    /// A one-to-many collection.
    Collection(Collection),
    /// A key mirroring another entity's identifier.
    Dependant(DependantValue),
}

impl Value {
    /// Short variant name for messages.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Simple(_) => "basic",
            Self::ManyToOne(_) => "many-to-one",
            Self::OneToOne(_) => "one-to-one",
            Self::Component(_) => "component",
            Self::Collection(_) => "collection",
            Self::Dependant(_) => "dependant key",
        }
    }

    /// Table the value's columns live on.
    #[must_use]
    pub fn table(&self) -> TableId {
        match self {
            Self::Simple(v) => v.table(),
            Self::ManyToOne(v) => v.table(),
            Self::OneToOne(v) => v.table(),
            Self::Component(c) => c.table(),
            Self::Collection(c) => c.collection_table(),
            Self::Dependant(v) => v.table(),
        }
    }

    /// The column-backed core, if the variant has one.
    #[must_use]
    pub fn simple(&self) -> Option<&SimpleValue> {
        match self {
            Self::Simple(v) => Some(v),
            Self::ManyToOne(v) => Some(&v.to_one.simple),
            Self::OneToOne(v) => Some(&v.to_one.simple),
            Self::Dependant(v) => Some(&v.simple),
            Self::Component(_) | Self::Collection(_) => None,
        }
    }

    /// The column-backed core for modification.
    pub fn simple_mut(&mut self) -> Option<&mut SimpleValue> {
        match self {
            Self::Simple(v) => Some(v),
            Self::ManyToOne(v) => Some(&mut v.to_one.simple),
            Self::OneToOne(v) => Some(&mut v.to_one.simple),
            Self::Dependant(v) => Some(&mut v.simple),
            Self::Component(_) | Self::Collection(_) => None,
        }
    }

    /// Mapped columns; components contribute all nested columns.
    #[must_use]
    pub fn columns(&self) -> Vec<ColumnId> {
        match self {
            Self::Component(c) => c
                .properties()
                .iter()
                .flat_map(|p| p.value().columns())
                .collect(),
            Self::Collection(_) => Vec::new(),
            other => other.simple().map(SimpleValue::columns).unwrap_or_default(),
        }
    }

    /// Whether any nested selectable is a formula.
    #[must_use]
    pub fn has_formula(&self) -> bool {
        match self {
            Self::Component(c) => c.properties().iter().any(|p| p.value().has_formula()),
            Self::Collection(_) => false,
            other => other.simple().is_some_and(SimpleValue::has_formula),
        }
    }

    /// Per-selectable insertability, flattened through components.
    #[must_use]
    pub fn column_insertability(&self) -> Vec<bool> {
        match self {
            Self::Component(c) => c
                .properties()
                .iter()
                .flat_map(|p| p.value().column_insertability())
                .collect(),
            Self::Collection(_) => Vec::new(),
            other => other
                .simple()
                .map(|v| v.column_insertability().to_vec())
                .unwrap_or_default(),
        }
    }

    /// Per-selectable updatability, flattened through components.
    #[must_use]
    pub fn column_updatability(&self) -> Vec<bool> {
        match self {
            Self::Component(c) => c
                .properties()
                .iter()
                .flat_map(|p| p.value().column_updatability())
                .collect(),
            Self::Collection(_) => Vec::new(),
            other => other
                .simple()
                .map(|v| v.column_updatability().to_vec())
                .unwrap_or_default(),
        }
    }

    /// Whether the value accepts null.
    #[must_use]
    pub fn is_nullable(&self, db: &Database) -> bool {
        match self {
            Self::OneToOne(v) => v.is_nullable(),
            Self::Collection(_) => true,
            Self::Component(c) => c.properties().iter().all(|p| p.value().is_nullable(db)),
            other => other.simple().is_none_or(|v| v.is_nullable(db)),
        }
    }

    /// Whether the value is a many-to-one or one-to-one.
    #[must_use]
    pub fn is_to_one(&self) -> bool {
        matches!(self, Self::ManyToOne(_) | Self::OneToOne(_))
    }

    /// Shared to-one state.
    #[must_use]
    pub fn as_to_one(&self) -> Option<&ToOne> {
        match self {
            Self::ManyToOne(v) => Some(&v.to_one),
            Self::OneToOne(v) => Some(&v.to_one),
            _ => None,
        }
    }

    /// Shared to-one state for modification.
    pub fn as_to_one_mut(&mut self) -> Option<&mut ToOne> {
        match self {
            Self::ManyToOne(v) => Some(&mut v.to_one),
            Self::OneToOne(v) => Some(&mut v.to_one),
            _ => None,
        }
    }

    /// The many-to-one, if this is one.
    #[must_use]
    pub fn as_many_to_one(&self) -> Option<&ManyToOne> {
        match self {
            Self::ManyToOne(v) => Some(v),
            _ => None,
        }
    }

    /// The many-to-one for modification.
    pub fn as_many_to_one_mut(&mut self) -> Option<&mut ManyToOne> {
        match self {
            Self::ManyToOne(v) => Some(v),
            _ => None,
        }
    }

    /// The one-to-one, if this is one.
    #[must_use]
    pub fn as_one_to_one(&self) -> Option<&OneToOne> {
        match self {
            Self::OneToOne(v) => Some(v),
            _ => None,
        }
    }

    /// The one-to-one for modification.
    pub fn as_one_to_one_mut(&mut self) -> Option<&mut OneToOne> {
        match self {
            Self::OneToOne(v) => Some(v),
            _ => None,
        }
    }

    /// The component, if this is one.
    #[must_use]
    pub fn as_component(&self) -> Option<&Component> {
        match self {
            Self::Component(c) => Some(c),
            _ => None,
        }
    }

    /// The component for modification.
    pub fn as_component_mut(&mut self) -> Option<&mut Component> {
        match self {
            Self::Component(c) => Some(c),
            _ => None,
        }
    }

    /// The collection, if this is one.
    #[must_use]
    pub fn as_collection(&self) -> Option<&Collection> {
        match self {
            Self::Collection(c) => Some(c),
            _ => None,
        }
    }

    /// The collection for modification.
    pub fn as_collection_mut(&mut self) -> Option<&mut Collection> {
        match self {
            Self::Collection(c) => Some(c),
            _ => None,
        }
    }
}
