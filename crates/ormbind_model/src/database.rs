//! The arena of tables built during binding.

use std::collections::HashMap;

use ormbind_foundation::{Error, Identifier, QualifiedTableName, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::column::ColumnId;
use crate::constraint::PrimaryKey;
use crate::table::{Table, TableId};

/// Owns every [`Table`] and resolves them by qualified name.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Database {
    tables: Vec<Table>,
    #[cfg_attr(feature = "serde", serde(skip))]
    by_name: HashMap<QualifiedTableName, TableId>,
}

impl Database {
    /// Creates an empty database.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, name: QualifiedTableName) -> TableId {
        let id = TableId::from_index(u32::try_from(self.tables.len()).unwrap_or(u32::MAX));
        self.tables.push(Table::new(id, name));
        id
    }

    /// Adds a table, or returns the one already registered under the same name.
    ///
    /// Reusing a table with `is_abstract == false` clears its abstract flag, so
    /// a concrete mapping always wins. A subselect always yields a fresh,
    /// unregistered table.
    pub fn add_table(
        &mut self,
        catalog: Option<Identifier>,
        schema: Option<Identifier>,
        name: Identifier,
        subselect: Option<String>,
        is_abstract: bool,
    ) -> TableId {
        let qualified = QualifiedTableName::new(catalog, schema, name);
        if subselect.is_some() {
            let id = self.push(qualified);
            let table = &mut self.tables[id.index()];
            table.set_subselect(subselect);
            table.set_abstract(is_abstract);
            return id;
        }
        if let Some(&existing) = self.by_name.get(&qualified) {
            if !is_abstract {
                self.tables[existing.index()].set_abstract(false);
            }
            return existing;
        }
        let id = self.push(qualified.clone());
        self.tables[id.index()].set_abstract(is_abstract);
        self.by_name.insert(qualified, id);
        id
    }

    /// Adds a table that will receive copies of `include`'s columns and keys.
    ///
    /// # Errors
    ///
    /// Returns a mapping error if a table with the same name is already mapped.
    pub fn add_denormalized_table(
        &mut self,
        catalog: Option<Identifier>,
        schema: Option<Identifier>,
        name: Identifier,
        is_abstract: bool,
        subselect: Option<String>,
        include: TableId,
    ) -> Result<TableId> {
        let qualified = QualifiedTableName::new(catalog, schema, name);
        if self.by_name.contains_key(&qualified) {
            return Err(Error::mapping(format!("Duplicate table mapping {qualified}")));
        }
        let id = self.push(qualified.clone());
        {
            let table = &mut self.tables[id.index()];
            table.set_abstract(is_abstract);
            table.set_subselect(subselect);
            table.set_included_table(include);
        }
        if let Some(parent) = self.tables.get_mut(include.index()) {
            parent.mark_denormalized_parent();
        }
        self.by_name.insert(qualified, id);
        Ok(id)
    }

    /// Looks up a table by handle.
    #[must_use]
    pub fn table(&self, id: TableId) -> Option<&Table> {
        self.tables.get(id.index())
    }

    /// Looks up a table by handle for modification.
    pub fn table_mut(&mut self, id: TableId) -> Option<&mut Table> {
        self.tables.get_mut(id.index())
    }

    /// Same as [`Database::table_mut`], but a missing table is an error.
    ///
    /// # Errors
    ///
    /// Returns an assertion failure for a dangling handle.
    pub fn require_table_mut(&mut self, id: TableId) -> Result<&mut Table> {
        self.tables
            .get_mut(id.index())
            .ok_or_else(|| Error::assertion_failure(format!("no table with handle {id:?}")))
    }

    /// Same as [`Database::table`], but a missing table is an error.
    ///
    /// # Errors
    ///
    /// Returns an assertion failure for a dangling handle.
    pub fn require_table(&self, id: TableId) -> Result<&Table> {
        self.tables
            .get(id.index())
            .ok_or_else(|| Error::assertion_failure(format!("no table with handle {id:?}")))
    }

    /// Finds a registered table by its qualified name.
    #[must_use]
    pub fn find_table(&self, name: &QualifiedTableName) -> Option<TableId> {
        self.by_name.get(name).copied()
    }

    /// Finds the first table whose unqualified name matches `name`.
    #[must_use]
    pub fn table_by_name(&self, name: &str) -> Option<TableId> {
        let wanted = Identifier::to_identifier(name)?;
        self.tables
            .iter()
            .find(|t| !t.is_subselect() && *t.name() == wanted)
            .map(Table::id)
    }

    /// All tables in creation order.
    pub fn tables(&self) -> impl Iterator<Item = &Table> + '_ {
        self.tables.iter()
    }

    /// All tables in creation order, for modification.
    pub fn tables_mut(&mut self) -> impl Iterator<Item = &mut Table> + '_ {
        self.tables.iter_mut()
    }

    /// Number of tables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Whether no table was added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Looks up a column across tables.
    #[must_use]
    pub fn column(&self, id: ColumnId) -> Option<&crate::Column> {
        self.table(id.table)?.column(id)
    }

    /// Looks up a column across tables for modification.
    pub fn column_mut(&mut self, id: ColumnId) -> Option<&mut crate::Column> {
        self.table_mut(id.table)?.column_mut(id)
    }

    /// Copies columns, primary keys, and foreign keys of included tables into
    /// the denormalized tables that include them.
    ///
    /// Parents are materialized before children, so a chain of union
    /// subclasses sees every ancestor's columns.
    pub fn materialize_denormalized_tables(&mut self) {
        let mut done = vec![false; self.tables.len()];
        for i in 0..self.tables.len() {
            self.materialize(TableId::from_index(u32::try_from(i).unwrap_or(u32::MAX)), &mut done);
        }
    }

    fn materialize(&mut self, id: TableId, done: &mut [bool]) {
        if done[id.index()] {
            return;
        }
        done[id.index()] = true;
        let Some(parent_id) = self.tables[id.index()].included_table() else {
            return;
        };
        self.materialize(parent_id, done);

        let parent = self.tables[parent_id.index()].clone();
        let child = &mut self.tables[id.index()];
        let mut mapped: HashMap<ColumnId, ColumnId> = HashMap::new();
        for (parent_col, column) in parent.columns() {
            let child_col = child.add_column(column.clone());
            mapped.insert(parent_col, child_col);
        }
        let remap = |cols: &[ColumnId]| -> Vec<ColumnId> {
            cols.iter().filter_map(|c| mapped.get(c).copied()).collect()
        };
        if let Some(pk) = parent.primary_key() {
            let mut copy = PrimaryKey::new(remap(pk.columns()));
            if let Some(name) = pk.name() {
                copy = copy.with_name(name);
            }
            child.set_primary_key(copy);
        }
        for fk in parent.foreign_keys() {
            let copy = child.create_foreign_key(
                None,
                remap(fk.columns()),
                fk.referenced_entity_name(),
                fk.key_definition().map(str::to_string),
                fk.referenced_columns().to_vec(),
            );
            if let Some(table) = fk.referenced_table() {
                copy.set_referenced_table(table);
            }
            if !fk.is_creation_enabled() {
                copy.disable_creation();
            }
            copy.set_cascade_delete(fk.is_cascade_delete());
        }
    }
}
