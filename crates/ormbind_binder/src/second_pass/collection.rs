//! One-to-many collection keys.

use ormbind_foundation::names::qualify;
use ormbind_foundation::{Error, Result};
use ormbind_model::{ClassId, DependantValue, ForeignKeySettings, Value};

use crate::collector::InFlightMetadata;
use crate::descriptor::JoinColumnAnnotation;
use crate::join_column::{AnnotatedJoinColumns, annotations_nullable};
use crate::table_binder::bind_foreign_key_columns;

/// Binds the key of a one-to-many collection once its element entity is known.
///
/// An inverse collection reuses the columns of the element's many-to-one;
/// a unidirectional one puts join columns on the element table.
#[derive(Clone, Debug)]
pub struct CollectionSecondPass {
    pub(crate) class: ClassId,
    pub(crate) entity_name: String,
    pub(crate) path: String,
    pub(crate) element_entity: String,
    pub(crate) mapped_by: Option<String>,
    pub(crate) join_columns: Vec<JoinColumnAnnotation>,
    pub(crate) foreign_key: ForeignKeySettings,
    pub(crate) cascade_delete: bool,
}

impl CollectionSecondPass {
    /// `<entity>.<path>`.
    #[must_use]
    pub fn role(&self) -> String {
        qualify(&self.entity_name, &self.path)
    }

    /// Binds the key and re-targets the collection at the element table.
    ///
    /// # Errors
    ///
    /// Returns a mapping error for an unknown element entity or an invalid
    /// `mappedBy`.
    pub fn do_second_pass(self, meta: &mut InFlightMetadata) -> Result<()> {
        let role = self.role();
        let element = meta
            .entity_binding(&self.element_entity)
            .ok_or_else(|| Error::unknown_entity(&role, &self.element_entity))?;
        let owner_table = meta.bindings.require(self.class)?.table();
        let element_table = meta.bindings.require(element)?.table();

        let key = match &self.mapped_by {
            Some(mapped_by) => {
                let other = meta.bindings.property(element, mapped_by).ok_or_else(|| {
                    Error::annotation(format!(
                        "Collection '{role}' is 'mappedBy' a property named '{mapped_by}' which does not exist in the target entity '{}'",
                        self.element_entity
                    ))
                })?;
                let Value::ManyToOne(many_to_one) = other.value() else {
                    return Err(Error::annotation(format!(
                        "Collection '{role}' is 'mappedBy' a property named '{mapped_by}' of the target entity '{}' which is not a '@ManyToOne' association",
                        self.element_entity
                    )));
                };
                let mut key = DependantValue::new(many_to_one.table(), self.entity_name.clone());
                for column in many_to_one.columns() {
                    key.add_column(column, false, false)?;
                }
                key.set_key_nullable(many_to_one.is_nullable(&meta.database));
                key
            }
            None => {
                let referenced = meta.bindings.key_columns(self.class);
                let annotations: Vec<&JoinColumnAnnotation> = self.join_columns.iter().collect();
                let join_columns = AnnotatedJoinColumns::from_annotations(
                    &annotations,
                    &self.entity_name,
                    &self.path,
                    element_table,
                );
                let mut key = DependantValue::new(element_table, self.entity_name.clone());
                key.set_key_nullable(annotations_nullable(&annotations));
                *key.foreign_key_mut() = self.foreign_key.clone();
                key.set_cascade_delete(self.cascade_delete);
                bind_foreign_key_columns(meta, &join_columns, &self.entity_name, &referenced, &mut key)?;
                key.create_foreign_key(&mut meta.database, &self.entity_name, Some(owner_table), Vec::new())?;
                key
            }
        };

        let collection = meta
            .bindings
            .value_mut(self.class, &self.path)
            .and_then(Value::as_collection_mut)
            .ok_or_else(|| Error::assertion_failure(format!("no collection at '{role}'")))?;
        collection.set_collection_table(element_table);
        collection.set_key(key);
        tracing::debug!(%role, element = %self.element_entity, inverse = self.mapped_by.is_some(), "bound collection key");
        Ok(())
    }
}
