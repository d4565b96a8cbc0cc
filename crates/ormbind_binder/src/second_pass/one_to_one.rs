//! Primary-key and inverse one-to-one associations.

use ormbind_foundation::names::qualify;
use ormbind_foundation::{Error, Result};
use ormbind_model::{
    ClassId, ForeignKeyDirection, ForeignKeySettings, OneToOne, Property, TableId, Value,
};

use super::fk::ToOneFkSecondPass;
use crate::collector::InFlightMetadata;
use crate::descriptor::AccessType;
use crate::join_column::AnnotatedJoinColumns;
use crate::to_one::FetchSettings;

/// Builds a one-to-one that maps no columns of its own.
///
/// Without `mappedBy` the owner's primary key references the target's;
/// with it, the association is the inverse of a property on the target.
#[derive(Clone, Debug)]
pub struct OneToOneSecondPass {
    pub(crate) class: ClassId,
    pub(crate) entity_name: String,
    /// Path of the component holding the property; `None` for the entity.
    pub(crate) holder_path: Option<String>,
    pub(crate) property_name: String,
    pub(crate) target_entity: String,
    pub(crate) mapped_by: Option<String>,
    pub(crate) optional: bool,
    pub(crate) cascade_on_delete: bool,
    pub(crate) cascade: Option<String>,
    pub(crate) fetch: FetchSettings,
    pub(crate) foreign_key: ForeignKeySettings,
    pub(crate) join_columns: AnnotatedJoinColumns,
    pub(crate) table: TableId,
    pub(crate) access: AccessType,
    pub(crate) lazy_group: Option<String>,
    pub(crate) optimistic_locked: bool,
}

impl OneToOneSecondPass {
    /// Path of the property relative to its entity.
    #[must_use]
    pub fn path(&self) -> String {
        match &self.holder_path {
            Some(holder) => qualify(holder, &self.property_name),
            None => self.property_name.clone(),
        }
    }

    /// `<entity>.<path>`.
    #[must_use]
    pub fn association_path(&self) -> String {
        qualify(&self.entity_name, &self.path())
    }

    /// Builds the value and adds the property to its holder.
    ///
    /// # Errors
    ///
    /// Returns a mapping error for an unknown target, or a `mappedBy` that
    /// names a missing property or one that is not a to-one.
    pub fn do_second_pass(self, meta: &mut InFlightMetadata) -> Result<()> {
        let mut value = OneToOne::new(self.table, self.entity_name.clone());
        value.set_property_name(self.property_name.clone());
        value.set_referenced_entity_name(self.target_entity.clone());
        self.fetch.apply(&mut value);
        value.set_cascade_delete(self.cascade_on_delete);
        value.set_constrained(!self.optional);
        value.set_foreign_key_direction(if self.mapped_by.is_none() {
            ForeignKeyDirection::FromParent
        } else {
            ForeignKeyDirection::ToParent
        });
        *value.foreign_key_mut() = self.foreign_key.clone();
        value.set_mapped_by(self.mapped_by.clone());

        let value = match &self.mapped_by {
            None => {
                let fk = ToOneFkSecondPass::new(
                    self.class,
                    &self.entity_name,
                    &self.path(),
                    &self.target_entity,
                    self.join_columns.clone(),
                    !self.optional,
                );
                let mut wrapped = Value::OneToOne(value);
                fk.resolve(meta, &mut wrapped)?;
                wrapped
            }
            Some(mapped_by) => {
                self.bind_unowned(meta, &mut value, mapped_by)?;
                Value::OneToOne(value)
            }
        };

        let mut property = Property::new(meta.intern(&self.property_name), value);
        property.set_cascade(self.cascade.clone());
        property.set_property_accessor_name(self.access.accessor_name());
        property.set_lazy_group(self.lazy_group.clone());
        property.set_optional(self.optional);
        property.set_optimistic_locked(self.optimistic_locked);
        self.add_to_holder(meta, property)?;
        tracing::debug!(
            association = %self.association_path(),
            target = %self.target_entity,
            mapped_by = ?self.mapped_by,
            "bound one-to-one"
        );
        Ok(())
    }

    fn bind_unowned(&self, meta: &mut InFlightMetadata, value: &mut OneToOne, mapped_by: &str) -> Result<()> {
        let target = meta
            .entity_binding(&self.target_entity)
            .ok_or_else(|| Error::unknown_entity(self.association_path(), &self.target_entity))?;
        let other = meta.bindings.property(target, mapped_by).ok_or_else(|| {
            Error::annotation(format!(
                "Association '{}' is 'mappedBy' a property named '{mapped_by}' which does not exist in the target entity type '{}'",
                self.association_path(),
                self.target_entity
            ))
        })?;
        match other.value() {
            Value::OneToOne(_) => return Ok(()),
            Value::ManyToOne(_) => {}
            _ => {
                return Err(Error::annotation(format!(
                    "Association '{}' is 'mappedBy' a property named '{mapped_by}' of the target entity type '{}' which is not a '@OneToOne' or '@ManyToOne' association",
                    self.association_path(),
                    self.target_entity
                )));
            }
        }

        value.set_referenced_property_name(Some(mapped_by.to_string()));
        let part_of_identifier = meta
            .bindings
            .identifier(target)
            .and_then(Value::as_component)
            .is_some_and(|c| c.has_property(mapped_by));
        value.set_reference_to_primary_key(part_of_identifier);
        meta.add_property_reference(&self.target_entity, mapped_by, true);
        Ok(())
    }

    fn add_to_holder(&self, meta: &mut InFlightMetadata, property: Property) -> Result<()> {
        match &self.holder_path {
            None => meta.bindings.require_mut(self.class)?.add_property(property),
            Some(path) => {
                meta.bindings
                    .value_mut(self.class, path)
                    .and_then(Value::as_component_mut)
                    .ok_or_else(|| {
                        Error::assertion_failure(format!(
                            "no component at '{path}' of entity '{}'",
                            self.entity_name
                        ))
                    })?
                    .add_property(property);
                if let Some(root) = meta.bindings.root_data_mut(self.class) {
                    root.sync_identifier();
                }
            }
        }
        Ok(())
    }
}
