//! Primary keys, secondary table joins and discriminator nullability.

use ormbind_foundation::{Error, Result};
use ormbind_model::{ClassId, DependantValue, ForeignKeySettings, PrimaryKey, TableId};

use crate::collector::InFlightMetadata;
use crate::descriptor::PrimaryKeyJoinColumnAnnotation;
use crate::join_column::AnnotatedJoinColumns;
use crate::naming::join_key_column_name;
use crate::table_binder::bind_foreign_key_columns;

// =============================================================================
// Primary keys
// =============================================================================

/// Makes the identifier (or joined key) columns the entity table's primary key.
#[derive(Clone, Debug)]
pub struct CreateKeySecondPass {
    class: ClassId,
    entity_name: String,
}

impl CreateKeySecondPass {
    /// Creates the pass for `entity_name`.
    #[must_use]
    pub fn new(class: ClassId, entity_name: &str) -> Self {
        Self {
            class,
            entity_name: entity_name.to_string(),
        }
    }

    /// The entity.
    #[must_use]
    pub fn entity_name(&self) -> &str {
        &self.entity_name
    }

    /// Sets the primary key; primary key columns become non-null.
    ///
    /// # Errors
    ///
    /// Returns a mapping error when the entity has no key columns.
    pub fn do_second_pass(self, meta: &mut InFlightMetadata) -> Result<()> {
        let columns = meta.bindings.key_columns(self.class);
        if columns.is_empty() {
            return Err(Error::mapping(format!(
                "Entity '{}' has no identifier (every '@Entity' class must declare or inherit at least one '@Id' or '@EmbeddedId' property)",
                self.entity_name
            )));
        }
        let table_id = meta.bindings.require(self.class)?.table();
        let table = meta.database.require_table_mut(table_id)?;
        for column in &columns {
            if let Some(c) = table.column_mut(*column) {
                c.set_nullable(false);
            }
        }
        table.set_primary_key(PrimaryKey::new(columns));
        tracing::debug!(entity = %self.entity_name, table = %table.qualified_name(), "primary key");
        Ok(())
    }
}

// =============================================================================
// Secondary tables
// =============================================================================

/// Binds the key of one secondary table join.
#[derive(Clone, Debug)]
pub struct SecondaryTableSecondPass {
    class: ClassId,
    entity_name: String,
    join_table: TableId,
    pk_join_columns: Vec<PrimaryKeyJoinColumnAnnotation>,
    foreign_key: ForeignKeySettings,
}

impl SecondaryTableSecondPass {
    /// Creates the pass for the join of `entity_name` to `join_table`.
    #[must_use]
    pub fn new(
        class: ClassId,
        entity_name: &str,
        join_table: TableId,
        pk_join_columns: Vec<PrimaryKeyJoinColumnAnnotation>,
        foreign_key: ForeignKeySettings,
    ) -> Self {
        Self {
            class,
            entity_name: entity_name.to_string(),
            join_table,
            pk_join_columns,
            foreign_key,
        }
    }

    /// The entity.
    #[must_use]
    pub fn entity_name(&self) -> &str {
        &self.entity_name
    }

    /// Creates the key columns, the join table's primary key, and the
    /// foreign key to the entity table.
    ///
    /// # Errors
    ///
    /// Returns a mapping error when the key columns do not match the
    /// entity's key, or an assertion failure when the join is missing.
    pub fn do_second_pass(self, meta: &mut InFlightMetadata) -> Result<()> {
        let referenced = meta.bindings.key_columns(self.class);
        let entity_table = meta.bindings.require(self.class)?.table();
        let join_table_name = meta
            .database
            .require_table(self.join_table)?
            .name()
            .text()
            .to_string();
        let referenced_names = meta.database.require_table(entity_table)?.column_names(&referenced);

        let mut join_columns = AnnotatedJoinColumns::from_primary_key_annotations(
            &self.pk_join_columns,
            &self.entity_name,
            "",
            self.join_table,
        );
        join_columns.implicit_names = Some(
            referenced_names
                .iter()
                .map(|n| join_key_column_name(n, &join_table_name))
                .collect(),
        );

        let mut key = DependantValue::new(self.join_table, self.entity_name.clone());
        key.set_key_nullable(false);
        *key.foreign_key_mut() = self.foreign_key.clone();
        bind_foreign_key_columns(meta, &join_columns, &self.entity_name, &referenced, &mut key)?;
        key.create_foreign_key(&mut meta.database, &self.entity_name, Some(entity_table), Vec::new())?;

        let class = meta.bindings.require_mut(self.class)?;
        let join = class.join_for_table_mut(self.join_table).ok_or_else(|| {
            Error::assertion_failure(format!(
                "entity '{}' has no join to table '{join_table_name}'",
                self.entity_name
            ))
        })?;
        join.set_key(key);
        join.create_primary_key(&mut meta.database);
        tracing::debug!(entity = %self.entity_name, table = %join_table_name, "secondary table key");
        Ok(())
    }
}

// =============================================================================
// Discriminators
// =============================================================================

/// Makes the discriminator column nullable when a class of the hierarchy
/// uses `null` as its discriminator value.
#[derive(Clone, Debug)]
pub struct NullableDiscriminatorSecondPass {
    root: ClassId,
    entity_name: String,
}

impl NullableDiscriminatorSecondPass {
    /// Creates the pass for the hierarchy rooted at `entity_name`.
    #[must_use]
    pub fn new(root: ClassId, entity_name: &str) -> Self {
        Self {
            root,
            entity_name: entity_name.to_string(),
        }
    }

    /// The root entity.
    #[must_use]
    pub fn entity_name(&self) -> &str {
        &self.entity_name
    }

    /// Checks every class of the hierarchy.
    ///
    /// # Errors
    ///
    /// Returns an assertion failure for a dangling class handle.
    pub fn do_second_pass(self, meta: &mut InFlightMetadata) -> Result<()> {
        let Some(discriminator) = meta.bindings.root_data(self.root).and_then(|r| r.discriminator.clone())
        else {
            return Ok(());
        };
        let mut uses_null = false;
        for class in meta.bindings.subclass_closure(self.root) {
            if meta.bindings.require(class)?.discriminator_value.as_deref() == Some("null") {
                uses_null = true;
                break;
            }
        }
        if !uses_null {
            return Ok(());
        }
        for column in discriminator.columns() {
            if let Some(c) = meta.database.column_mut(column) {
                c.set_nullable(true);
            }
        }
        tracing::debug!(entity = %self.entity_name, "discriminator made nullable");
        Ok(())
    }
}
