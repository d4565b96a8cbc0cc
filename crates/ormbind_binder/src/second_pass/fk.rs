//! Foreign key second passes.

use ormbind_foundation::names::qualify;
use ormbind_foundation::{Error, Result};
use ormbind_model::{
    ClassId, ColumnId, EntityBindings, ManyToOne, OneToOne, Property, TableId, Value,
    same_column_set,
};

use crate::collector::InFlightMetadata;
use crate::join_column::AnnotatedJoinColumns;
use crate::naming::implicit_primary_key_join_column_name;
use crate::table_binder::{bind_foreign_key_columns, referenced_name_matches};

// =============================================================================
// To-one associations
// =============================================================================

/// Binds the columns and foreign key of a to-one association.
#[derive(Clone, Debug)]
pub struct ToOneFkSecondPass {
    class: ClassId,
    entity_name: String,
    path: String,
    referenced_entity: String,
    join_columns: AnnotatedJoinColumns,
    unique: bool,
}

impl ToOneFkSecondPass {
    /// Creates the pass for the association at `path` of `entity_name`.
    ///
    /// A leading `<entity_name>.` on `path` is stripped.
    #[must_use]
    pub fn new(
        class: ClassId,
        entity_name: &str,
        path: &str,
        referenced_entity: &str,
        join_columns: AnnotatedJoinColumns,
        unique: bool,
    ) -> Self {
        let path = path
            .strip_prefix(entity_name)
            .and_then(|rest| rest.strip_prefix('.'))
            .unwrap_or(path);
        Self {
            class,
            entity_name: entity_name.to_string(),
            path: path.to_string(),
            referenced_entity: referenced_entity.to_string(),
            join_columns,
            unique,
        }
    }

    /// Path of the association relative to its entity.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// `<entity>.<path>`.
    #[must_use]
    pub fn association_path(&self) -> String {
        qualify(&self.entity_name, &self.path)
    }

    /// Entity the association targets.
    #[must_use]
    pub fn referenced_entity_name(&self) -> &str {
        &self.referenced_entity
    }

    /// Table the join columns are created on.
    #[must_use]
    pub fn value_table(&self) -> TableId {
        self.join_columns.table
    }

    /// Whether the association is part of its entity's identifier.
    #[must_use]
    pub fn is_in_primary_key(&self, bindings: &EntityBindings) -> bool {
        let Some(root) = bindings.root_data(self.class) else {
            return false;
        };
        if let Some(property) = &root.identifier_property {
            return self.path.starts_with(&format!("{}.", property.name()));
        }
        let Some(component) = root.identifier_component() else {
            return false;
        };
        let local = self.path.strip_prefix("id.").unwrap_or(&self.path);
        component.properties().iter().any(|p| {
            let name = p.name().as_str();
            local == name || local.starts_with(&format!("{name}."))
        })
    }

    /// Resolves the association in place and writes it back.
    ///
    /// # Errors
    ///
    /// Returns a recoverable error while the referenced key is incomplete,
    /// and a mapping error for an unknown target or unmatched columns.
    pub fn do_second_pass(&self, meta: &mut InFlightMetadata) -> Result<()> {
        let missing = || {
            Error::assertion_failure(format!(
                "no value at '{}' of entity '{}'",
                self.path, self.entity_name
            ))
        };
        let mut value = meta
            .bindings
            .value(self.class, &self.path)
            .cloned()
            .ok_or_else(missing)?;
        self.resolve(meta, &mut value)?;
        *meta.bindings.value_mut(self.class, &self.path).ok_or_else(missing)? = value;
        if let Some(root) = meta.bindings.root_data_mut(self.class) {
            root.sync_identifier();
        }
        Ok(())
    }

    pub(crate) fn resolve(&self, meta: &mut InFlightMetadata, value: &mut Value) -> Result<()> {
        match value {
            Value::ManyToOne(many_to_one) => self.resolve_many_to_one(meta, many_to_one),
            Value::OneToOne(one_to_one) => self.resolve_one_to_one(meta, one_to_one),
            other => Err(Error::assertion_failure(format!(
                "FkSecondPass for a wrong value type: {}",
                other.kind_name()
            ))),
        }
    }

    fn target(&self, meta: &InFlightMetadata) -> Result<ClassId> {
        meta.entity_binding(&self.referenced_entity).ok_or_else(|| {
            Error::unknown_entity(self.association_path(), &self.referenced_entity)
        })
    }

    fn resolve_many_to_one(&self, meta: &mut InFlightMetadata, value: &mut ManyToOne) -> Result<()> {
        let target = self.target(meta)?;
        value.set_property_name(self.path.clone());
        let referenced = self.referenced_columns(meta, target, value)?;
        bind_foreign_key_columns(
            meta,
            &self.join_columns,
            &self.referenced_entity,
            &referenced,
            value,
        )?;

        let target_table = meta.bindings.require(target)?.table();
        if value.is_reference_to_primary_key() {
            value.create_foreign_key(
                &mut meta.database,
                &self.referenced_entity,
                Some(target_table),
                Vec::new(),
            )?;
        }
        if self.unique {
            let columns = value.columns();
            if !columns.is_empty() {
                meta.database
                    .require_table_mut(value.table())?
                    .create_unique_key(&columns);
            }
        }
        if !value.is_ignore_not_found() {
            if let Some(property) = value.referenced_property_name() {
                let referenced_property = meta
                    .bindings
                    .property(target, property)
                    .ok_or_else(|| {
                        Error::mapping(format!(
                            "property-ref not found: {property} in class: {}",
                            self.referenced_entity
                        ))
                    })?;
                let columns = referenced_property.value().columns();
                let table = referenced_property.value().table();
                value.create_foreign_key(
                    &mut meta.database,
                    &self.referenced_entity,
                    Some(table),
                    columns,
                )?;
            }
        }
        tracing::debug!(
            association = %self.association_path(),
            target = %self.referenced_entity,
            columns = value.column_span(),
            "bound to-one foreign key"
        );
        Ok(())
    }

    /// Columns of the target the join columns point at.
    ///
    /// Without explicit referenced columns these are the target's key. When
    /// the referenced columns are exactly the key, likewise. Otherwise they
    /// must be the columns of one target property, which becomes the
    /// association's referenced property.
    fn referenced_columns(
        &self,
        meta: &mut InFlightMetadata,
        target: ClassId,
        value: &mut ManyToOne,
    ) -> Result<Vec<ColumnId>> {
        let key = meta.bindings.key_columns(target);
        if !self.join_columns.has_explicit_references() {
            if key.is_empty() {
                return Err(Error::recoverable(Error::mapping(format!(
                    "Association '{}' targets entity '{}' whose identifier is not bound yet",
                    self.association_path(),
                    self.referenced_entity
                ))));
            }
            return Ok(key);
        }

        let tables = meta.bindings.table_closure(target);
        let mut referenced = Vec::with_capacity(self.join_columns.columns.len());
        for join_column in &self.join_columns.columns {
            let Some(name) = join_column.referenced_column.as_deref() else {
                continue;
            };
            let found = tables.iter().find_map(|&table_id| {
                let table = meta.database.table(table_id)?;
                table
                    .columns()
                    .find(|(_, c)| referenced_name_matches(meta, name, c.name().text()))
                    .map(|(id, _)| id)
            });
            match found {
                Some(id) => referenced.push(id),
                None => {
                    return Err(Error::recoverable(Error::mapping(format!(
                        "A '@JoinColumn' references a column named '{name}' but the target entity '{}' has no property which maps to this column",
                        self.referenced_entity
                    ))));
                }
            }
        }

        if same_column_set(&referenced, &key) {
            return Ok(key);
        }

        let class = meta.bindings.require(target)?;
        let mut owners = vec![class];
        owners.extend(
            meta.bindings
                .ancestors(target)
                .into_iter()
                .filter_map(|a| meta.bindings.get(a)),
        );
        let property: Option<&Property> = owners
            .iter()
            .flat_map(|c| c.property_closure())
            .find(|p| {
                let columns = p.value().columns();
                !columns.is_empty() && same_column_set(&columns, &referenced)
            });
        let Some(property) = property else {
            let names = referenced
                .iter()
                .filter_map(|id| meta.database.column(*id))
                .map(|c| c.name().text().to_string())
                .collect::<Vec<_>>()
                .join(", ");
            return Err(Error::mapping(format!(
                "Referenced column(s) '{names}' of association '{}' are not mapped to a single property of entity '{}'",
                self.association_path(),
                self.referenced_entity
            )));
        };
        let property_name = property.name().to_string();
        let columns = property.value().columns();

        value.set_referenced_property_name(Some(property_name.clone()));
        meta.add_property_reference(&self.referenced_entity, &property_name, true);
        Ok(columns)
    }

    fn resolve_one_to_one(&self, meta: &mut InFlightMetadata, value: &mut OneToOne) -> Result<()> {
        let target = self.target(meta)?;
        value.set_property_name(self.path.clone());
        value.set_identifier_columns(meta.bindings.key_columns(self.class));
        let target_table = meta.bindings.require(target)?.table();
        value.create_foreign_key(&mut meta.database, Some(target_table))
    }
}

// =============================================================================
// Joined subclasses
// =============================================================================

/// Binds the key of a joined subclass table to its parent's key.
#[derive(Clone, Debug)]
pub struct JoinedSubclassFkSecondPass {
    class: ClassId,
    entity_name: String,
    super_entity: String,
    join_columns: AnnotatedJoinColumns,
}

impl JoinedSubclassFkSecondPass {
    /// Creates the pass for `entity_name`, a joined subclass of `super_entity`.
    #[must_use]
    pub fn new(
        class: ClassId,
        entity_name: &str,
        super_entity: &str,
        join_columns: AnnotatedJoinColumns,
    ) -> Self {
        Self {
            class,
            entity_name: entity_name.to_string(),
            super_entity: super_entity.to_string(),
            join_columns,
        }
    }

    /// The subclass.
    #[must_use]
    pub fn entity_name(&self) -> &str {
        &self.entity_name
    }

    /// The parent entity.
    #[must_use]
    pub fn referenced_entity_name(&self) -> &str {
        &self.super_entity
    }

    /// The subclass table.
    #[must_use]
    pub fn value_table(&self) -> TableId {
        self.join_columns.table
    }

    /// Creates the key columns and the foreign key to the parent table.
    ///
    /// # Errors
    ///
    /// Returns a recoverable error while the parent key is incomplete and a
    /// mapping error when the primary key join columns do not match it.
    pub fn do_second_pass(&self, meta: &mut InFlightMetadata) -> Result<()> {
        let parent = meta
            .entity_binding(&self.super_entity)
            .ok_or_else(|| Error::unknown_entity(&self.entity_name, &self.super_entity))?;
        let referenced = meta.bindings.key_columns(parent);
        if referenced.is_empty() {
            return Err(Error::recoverable(Error::mapping(format!(
                "Entity '{}' has no identifier to join subclass '{}' on",
                self.super_entity, self.entity_name
            ))));
        }
        let parent_table = meta.bindings.require(parent)?.table();
        let parent_names = meta.database.require_table(parent_table)?.column_names(&referenced);

        let mut join_columns = self.join_columns.clone();
        join_columns.implicit_names = Some(
            parent_names
                .iter()
                .map(|n| implicit_primary_key_join_column_name(n))
                .collect(),
        );

        let mut key = meta
            .bindings
            .require(self.class)?
            .joined_key()
            .cloned()
            .ok_or_else(|| {
                Error::assertion_failure(format!("'{}' is not a joined subclass", self.entity_name))
            })?;
        bind_foreign_key_columns(meta, &join_columns, &self.super_entity, &referenced, &mut key)?;
        key.create_foreign_key(
            &mut meta.database,
            &self.super_entity,
            Some(parent_table),
            Vec::new(),
        )?;
        if let Some(slot) = meta.bindings.require_mut(self.class)?.joined_key_mut() {
            *slot = key;
        }
        tracing::debug!(
            entity = %self.entity_name,
            parent = %self.super_entity,
            "bound joined subclass key"
        );
        Ok(())
    }
}
