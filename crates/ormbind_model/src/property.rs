//! Mapped properties.

use std::fmt;

use ormbind_foundation::{Error, Name, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::callback::CallbackDefinition;
use crate::column::Selectable;
use crate::database::Database;
use crate::value::Value;

/// Name of the synthetic property holding an `@IdClass` mapper component.
pub const IDENTIFIER_MAPPER_PROPERTY: &str = "_identifierMapper";

/// Accessor name used for synthetic and mapper properties.
pub const EMBEDDED_ACCESSOR: &str = "embedded";

/// One cascade style from a cascade specification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CascadeStyle {
    /// Every operation.
    All,
    /// Every operation plus orphan deletion.
    AllDeleteOrphan,
    /// Save and update.
    SaveUpdate,
    /// Persist.
    Persist,
    /// Merge.
    Merge,
    /// Lock.
    Lock,
    /// Refresh.
    Refresh,
    /// Replicate.
    Replicate,
    /// Evict (detach).
    Evict,
    /// Delete (remove).
    Delete,
    /// Delete orphans.
    DeleteOrphan,
    /// No cascading.
    None,
}

impl CascadeStyle {
    /// Parses one style name.
    ///
    /// # Errors
    ///
    /// Returns a mapping error for an unknown style.
    pub fn parse(name: &str) -> Result<Self> {
        Ok(match name {
            "all" => Self::All,
            "all-delete-orphan" => Self::AllDeleteOrphan,
            "save-update" => Self::SaveUpdate,
            "persist" => Self::Persist,
            "merge" => Self::Merge,
            "lock" => Self::Lock,
            "refresh" => Self::Refresh,
            "replicate" => Self::Replicate,
            "evict" => Self::Evict,
            "delete" => Self::Delete,
            "delete-orphan" => Self::DeleteOrphan,
            "none" => Self::None,
            other => {
                return Err(Error::mapping(format!("Unsupported cascade style: {other}")));
            }
        })
    }

    /// The style's name in a cascade specification.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::AllDeleteOrphan => "all-delete-orphan",
            Self::SaveUpdate => "save-update",
            Self::Persist => "persist",
            Self::Merge => "merge",
            Self::Lock => "lock",
            Self::Refresh => "refresh",
            Self::Replicate => "replicate",
            Self::Evict => "evict",
            Self::Delete => "delete",
            Self::DeleteOrphan => "delete-orphan",
            Self::None => "none",
        }
    }
}

impl fmt::Display for CascadeStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A mapped attribute of a class, join, or component.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Property {
    name: Name,
    value: Value,
    cascade: Option<String>,
    insertable: bool,
    updateable: bool,
    selectable: bool,
    optimistic_locked: bool,
    lazy: bool,
    lazy_group: Option<String>,
    optional: bool,
    natural_identifier: bool,
    lob: bool,
    property_accessor_name: Option<String>,
    returned_class_name: Option<String>,
    callback_definitions: Vec<CallbackDefinition>,
}

impl Property {
    /// Creates an insertable, updatable, eager property.
    #[must_use]
    pub fn new(name: Name, value: Value) -> Self {
        Self {
            name,
            value,
            cascade: None,
            insertable: true,
            updateable: true,
            selectable: true,
            optimistic_locked: true,
            lazy: false,
            lazy_group: None,
            optional: false,
            natural_identifier: false,
            lob: false,
            property_accessor_name: None,
            returned_class_name: None,
            callback_definitions: Vec::new(),
        }
    }

    /// Property name.
    #[must_use]
    pub fn name(&self) -> &Name {
        &self.name
    }

    /// Renames the property.
    pub fn set_name(&mut self, name: Name) {
        self.name = name;
    }

    /// The mapped value.
    #[must_use]
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// The mapped value for modification.
    pub fn value_mut(&mut self) -> &mut Value {
        &mut self.value
    }

    /// Replaces the mapped value.
    pub fn set_value(&mut self, value: Value) {
        self.value = value;
    }

    /// Whether the value is a component.
    #[must_use]
    pub fn is_composite(&self) -> bool {
        matches!(self.value, Value::Component(_))
    }

    /// Whether the property loads lazily; never true for to-one values.
    #[must_use]
    pub fn is_lazy(&self) -> bool {
        if self.value.is_to_one() {
            return false;
        }
        self.lazy
    }

    /// Sets laziness.
    pub fn set_lazy(&mut self, lazy: bool) {
        self.lazy = lazy;
    }

    /// Lazy fetch group, if any.
    #[must_use]
    pub fn lazy_group(&self) -> Option<&str> {
        self.lazy_group.as_deref()
    }

    /// Sets the lazy fetch group.
    pub fn set_lazy_group(&mut self, group: Option<String>) {
        self.lazy_group = group;
    }

    /// Whether the property is written on insert.
    ///
    /// Requires the flag and, when the value has columns, at least one
    /// insertable column.
    #[must_use]
    pub fn is_insertable(&self) -> bool {
        let columns = self.value.column_insertability();
        self.insertable && (columns.is_empty() || columns.iter().any(|b| *b))
    }

    /// Sets the insertable flag.
    pub fn set_insertable(&mut self, insertable: bool) {
        self.insertable = insertable;
    }

    /// Whether the property is written on update.
    #[must_use]
    pub fn is_updateable(&self) -> bool {
        let columns = self.value.column_updatability();
        self.updateable && (columns.is_empty() || columns.iter().any(|b| *b))
    }

    /// Sets the updateable flag.
    pub fn set_updateable(&mut self, updateable: bool) {
        self.updateable = updateable;
    }

    /// Whether the property is selected.
    #[must_use]
    pub fn is_selectable(&self) -> bool {
        self.selectable
    }

    /// Sets selectability.
    pub fn set_selectable(&mut self, selectable: bool) {
        self.selectable = selectable;
    }

    /// Whether changes bump the optimistic lock.
    #[must_use]
    pub fn is_optimistic_locked(&self) -> bool {
        self.optimistic_locked
    }

    /// Sets optimistic locking.
    pub fn set_optimistic_locked(&mut self, locked: bool) {
        self.optimistic_locked = locked;
    }

    /// Whether the property may be null: declared optional or nullable columns.
    #[must_use]
    pub fn is_optional(&self, db: &Database) -> bool {
        self.optional || self.value.is_nullable(db)
    }

    /// The declared optional flag alone.
    #[must_use]
    pub fn optional_flag(&self) -> bool {
        self.optional
    }

    /// Sets the declared optional flag.
    pub fn set_optional(&mut self, optional: bool) {
        self.optional = optional;
    }

    /// Sets the optional flag and makes every mapped column match it.
    pub fn reset_optional(&mut self, optional: bool, db: &mut Database) {
        self.optional = optional;
        if let Some(simple) = self.value.simple() {
            for selectable in simple.selectables() {
                if let Selectable::Column(id) = selectable {
                    if let Some(column) = db.column_mut(*id) {
                        column.set_nullable(optional);
                    }
                }
            }
        } else if let Value::Component(component) = &mut self.value {
            for property in component.properties_mut() {
                property.reset_optional(optional, db);
            }
        }
    }

    /// Whether the property is part of the natural id.
    #[must_use]
    pub fn is_natural_identifier(&self) -> bool {
        self.natural_identifier
    }

    /// Marks the property as part of the natural id.
    pub fn set_natural_identifier(&mut self, natural: bool) {
        self.natural_identifier = natural;
    }

    /// Whether the property is a large object.
    #[must_use]
    pub fn is_lob(&self) -> bool {
        self.lob
    }

    /// Marks the property as a large object.
    pub fn set_lob(&mut self, lob: bool) {
        self.lob = lob;
    }

    /// Raw cascade specification.
    #[must_use]
    pub fn cascade(&self) -> Option<&str> {
        self.cascade.as_deref()
    }

    /// Sets the cascade specification.
    pub fn set_cascade(&mut self, cascade: Option<String>) {
        self.cascade = cascade;
    }

    /// Parsed cascade styles.
    ///
    /// A component cascades whatever its nested properties cascade.
    ///
    /// # Errors
    ///
    /// Returns a mapping error for an unknown style name.
    pub fn cascade_styles(&self) -> Result<Vec<CascadeStyle>> {
        if let Value::Component(component) = &self.value {
            let mut styles = Vec::new();
            for property in component.properties() {
                for style in property.cascade_styles()? {
                    if style != CascadeStyle::None && !styles.contains(&style) {
                        styles.push(style);
                    }
                }
            }
            if styles.is_empty() {
                styles.push(CascadeStyle::None);
            }
            return Ok(styles);
        }
        match &self.cascade {
            None => Ok(vec![CascadeStyle::None]),
            Some(spec) => spec
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(CascadeStyle::parse)
                .collect(),
        }
    }

    /// Accessor strategy name.
    #[must_use]
    pub fn property_accessor_name(&self) -> Option<&str> {
        self.property_accessor_name.as_deref()
    }

    /// Sets the accessor strategy name.
    pub fn set_property_accessor_name(&mut self, name: impl Into<String>) {
        self.property_accessor_name = Some(name.into());
    }

    /// Declared Java-side type of the attribute.
    #[must_use]
    pub fn returned_class_name(&self) -> Option<&str> {
        self.returned_class_name.as_deref()
    }

    /// Sets the declared attribute type.
    pub fn set_returned_class_name(&mut self, name: impl Into<String>) {
        self.returned_class_name = Some(name.into());
    }

    /// Callbacks contributed by an embeddable.
    #[must_use]
    pub fn callback_definitions(&self) -> &[CallbackDefinition] {
        &self.callback_definitions
    }

    /// Appends callbacks.
    pub fn add_callback_definitions(&mut self, definitions: impl IntoIterator<Item = CallbackDefinition>) {
        self.callback_definitions.extend(definitions);
    }

    /// Whether this is the synthetic `@IdClass` mapper.
    #[must_use]
    pub fn is_identifier_mapper(&self) -> bool {
        self.name == IDENTIFIER_MAPPER_PROPERTY
    }

    /// An independent copy.
    #[must_use]
    pub fn copy(&self) -> Self {
        self.clone()
    }
}
