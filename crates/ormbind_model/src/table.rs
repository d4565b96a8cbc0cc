//! Relational tables.
//!
//! A [`Table`] owns its columns and constraints. Columns are kept in insertion
//! order and indexed by canonical name, so the same logical column bound by two
//! properties resolves to one physical column.

use std::collections::HashMap;

use ormbind_foundation::{Error, Identifier, IdentifierRenderer, QualifiedTableName, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::column::{Column, ColumnId};
use crate::constraint::{
    ForeignKey, ForeignKeyKey, Index, PrimaryKey, UniqueKey, generate_name, same_column_set,
};

/// Stable handle to a table in a [`Database`](crate::Database).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TableId(u32);

impl TableId {
    /// Creates a handle from a raw arena index.
    #[must_use]
    pub const fn from_index(index: u32) -> Self {
        Self(index)
    }

    /// The raw arena index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// A relational table, or a named subselect standing in for one.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Table {
    id: TableId,
    name: QualifiedTableName,
    columns: Vec<Column>,
    column_index: HashMap<String, u32>,
    primary_key: Option<PrimaryKey>,
    #[cfg_attr(feature = "serde", serde(skip))]
    foreign_key_index: HashMap<ForeignKeyKey, usize>,
    foreign_keys: Vec<ForeignKey>,
    unique_keys: Vec<UniqueKey>,
    unique_keys_on_last_cleanse: usize,
    indexes: Vec<Index>,
    check_constraints: Vec<String>,
    row_id: Option<String>,
    subselect: Option<String>,
    comment: Option<String>,
    is_abstract: bool,
    has_denormalized_tables: bool,
    included_table: Option<TableId>,
}

impl Table {
    pub(crate) fn new(id: TableId, name: QualifiedTableName) -> Self {
        Self {
            id,
            name,
            columns: Vec::new(),
            column_index: HashMap::new(),
            primary_key: None,
            foreign_key_index: HashMap::new(),
            foreign_keys: Vec::new(),
            unique_keys: Vec::new(),
            unique_keys_on_last_cleanse: 0,
            indexes: Vec::new(),
            check_constraints: Vec::new(),
            row_id: None,
            subselect: None,
            comment: None,
            is_abstract: false,
            has_denormalized_tables: false,
            included_table: None,
        }
    }

    /// This table's handle.
    #[must_use]
    pub fn id(&self) -> TableId {
        self.id
    }

    /// Unqualified table name.
    #[must_use]
    pub fn name(&self) -> &Identifier {
        &self.name.table
    }

    /// Catalog, schema, and table name.
    #[must_use]
    pub fn qualified_name(&self) -> &QualifiedTableName {
        &self.name
    }

    /// Renders the qualified name through `renderer`.
    #[must_use]
    pub fn render_name(&self, renderer: &dyn IdentifierRenderer) -> String {
        self.name.render(renderer)
    }

    // ---- columns ----

    /// Adds a column, or returns the existing column with the same canonical name.
    ///
    /// A new column whose name matches a primary key column is forced non-null.
    pub fn add_column(&mut self, mut column: Column) -> ColumnId {
        let canonical = column.canonical_name();
        if let Some(&index) = self.column_index.get(&canonical) {
            return ColumnId::new(self.id, index);
        }
        if self.is_primary_key_column_name(&canonical) {
            tracing::debug!(
                column = %canonical,
                table = %self.name.table.canonical_name(),
                "forcing primary key column to be non-null"
            );
            column.set_nullable(false);
        }
        let index = u32::try_from(self.columns.len()).unwrap_or(u32::MAX);
        column.set_unique_integer(self.columns.len() + 1);
        self.columns.push(column);
        self.column_index.insert(canonical, index);
        ColumnId::new(self.id, index)
    }

    fn is_primary_key_column_name(&self, canonical: &str) -> bool {
        self.primary_key.as_ref().is_some_and(|pk| {
            pk.columns()
                .iter()
                .filter_map(|id| self.column(*id))
                .any(|c| c.canonical_name() == canonical)
        })
    }

    /// Looks up a column by handle.
    #[must_use]
    pub fn column(&self, id: ColumnId) -> Option<&Column> {
        if id.table != self.id {
            return None;
        }
        self.columns.get(id.index as usize)
    }

    /// Looks up a column by handle for modification.
    pub fn column_mut(&mut self, id: ColumnId) -> Option<&mut Column> {
        if id.table != self.id {
            return None;
        }
        self.columns.get_mut(id.index as usize)
    }

    /// Finds a column by name as written in mapping metadata.
    #[must_use]
    pub fn column_by_name(&self, name: &str) -> Option<ColumnId> {
        let canonical = Identifier::to_identifier(name)?.canonical_name();
        self.column_index
            .get(&canonical)
            .map(|&index| ColumnId::new(self.id, index))
    }

    /// Whether the handle names a column of this table.
    #[must_use]
    pub fn contains_column(&self, id: ColumnId) -> bool {
        self.column(id).is_some()
    }

    /// Columns in insertion order.
    pub fn columns(&self) -> impl Iterator<Item = (ColumnId, &Column)> + '_ {
        let table = self.id;
        self.columns.iter().enumerate().map(move |(i, c)| {
            let index = u32::try_from(i).unwrap_or(u32::MAX);
            (ColumnId::new(table, index), c)
        })
    }

    /// Number of columns.
    #[must_use]
    pub fn column_span(&self) -> usize {
        self.columns.len()
    }

    /// Names of the given columns, skipping handles from other tables.
    #[must_use]
    pub fn column_names(&self, ids: &[ColumnId]) -> Vec<String> {
        ids.iter()
            .filter_map(|id| self.column(*id))
            .map(|c| c.name().text().to_string())
            .collect()
    }

    // ---- primary key ----

    /// The primary key, if set.
    #[must_use]
    pub fn primary_key(&self) -> Option<&PrimaryKey> {
        self.primary_key.as_ref()
    }

    /// Whether a primary key is set.
    #[must_use]
    pub fn has_primary_key(&self) -> bool {
        self.primary_key.is_some()
    }

    /// Sets the primary key and forces its columns non-null.
    pub fn set_primary_key(&mut self, primary_key: PrimaryKey) {
        for id in primary_key.columns() {
            if let Some(column) = self.column_mut(*id) {
                column.set_nullable(false);
            }
        }
        self.primary_key = Some(primary_key);
    }

    /// Primary key columns, or an empty slice.
    #[must_use]
    pub fn primary_key_columns(&self) -> &[ColumnId] {
        self.primary_key.as_ref().map_or(&[], PrimaryKey::columns)
    }

    // ---- unique keys ----

    /// Unique keys as currently stored, without cleansing.
    #[must_use]
    pub fn unique_keys(&self) -> &[UniqueKey] {
        &self.unique_keys
    }

    /// Cleanses redundant unique keys if any were added since the last
    /// cleanse, then returns the survivors.
    ///
    /// A key duplicating another remaining key's column set is dropped, as is
    /// a key over exactly the primary key columns. Of several duplicates, the
    /// last one declared survives.
    pub fn cleanse_unique_keys(&mut self) -> &[UniqueKey] {
        if self.unique_keys.len() != self.unique_keys_on_last_cleanse {
            self.cleanse_unique_key_map();
            self.unique_keys_on_last_cleanse = self.unique_keys.len();
        }
        &self.unique_keys
    }

    fn cleanse_unique_key_map(&mut self) {
        if self.unique_keys.len() == 1 {
            if self.is_same_as_primary_key_columns(&self.unique_keys[0]) {
                self.unique_keys.clear();
            }
            return;
        }
        let mut i = 0;
        while i < self.unique_keys.len() {
            let candidate = &self.unique_keys[i];
            let duplicated = self
                .unique_keys
                .iter()
                .enumerate()
                .any(|(j, other)| j != i && same_column_set(other.columns(), candidate.columns()));
            if duplicated || self.is_same_as_primary_key_columns(candidate) {
                self.unique_keys.remove(i);
            } else {
                i += 1;
            }
        }
    }

    fn is_same_as_primary_key_columns(&self, unique_key: &UniqueKey) -> bool {
        match &self.primary_key {
            Some(pk) if !pk.is_empty() => same_column_set(pk.columns(), unique_key.columns()),
            _ => false,
        }
    }

    /// Looks up a unique key by name.
    #[must_use]
    pub fn unique_key(&self, name: &str) -> Option<&UniqueKey> {
        self.unique_keys.iter().find(|uk| uk.name() == name)
    }

    /// Adds a unique key.
    ///
    /// # Errors
    ///
    /// Returns a mapping error if a key with the same name already exists.
    pub fn add_unique_key(&mut self, unique_key: UniqueKey) -> Result<()> {
        if self.unique_key(unique_key.name()).is_some() {
            return Err(Error::mapping(format!(
                "UniqueKey {} already exists",
                unique_key.name()
            )));
        }
        self.unique_keys.push(unique_key);
        Ok(())
    }

    /// Returns the named unique key, creating an empty one if absent.
    pub fn get_or_create_unique_key(&mut self, name: &str) -> &mut UniqueKey {
        let pos = match self.unique_keys.iter().position(|uk| uk.name() == name) {
            Some(pos) => pos,
            None => {
                self.unique_keys.push(UniqueKey::new(name));
                self.unique_keys.len() - 1
            }
        };
        &mut self.unique_keys[pos]
    }

    /// Creates a unique key with a generated name over the given columns.
    pub fn create_unique_key(&mut self, columns: &[ColumnId]) -> &UniqueKey {
        let name = generate_name(
            "UK_",
            self.name.table.text(),
            &self.column_names(columns),
        );
        let key = self.get_or_create_unique_key(&name);
        for column in columns {
            key.add_column(*column);
        }
        key
    }

    // ---- indexes ----

    /// Indexes in declaration order.
    #[must_use]
    pub fn indexes(&self) -> &[Index] {
        &self.indexes
    }

    /// Adds an index.
    ///
    /// # Errors
    ///
    /// Returns a mapping error if an index with the same name already exists.
    pub fn add_index(&mut self, index: Index) -> Result<()> {
        if self.indexes.iter().any(|i| i.name() == index.name()) {
            return Err(Error::mapping(format!(
                "Index {} already exists",
                index.name()
            )));
        }
        self.indexes.push(index);
        Ok(())
    }

    /// Returns the named index, creating an empty one if absent.
    pub fn get_or_create_index(&mut self, name: &str) -> &mut Index {
        let pos = match self.indexes.iter().position(|i| i.name() == name) {
            Some(pos) => pos,
            None => {
                self.indexes.push(Index::new(name));
                self.indexes.len() - 1
            }
        };
        &mut self.indexes[pos]
    }

    // ---- foreign keys ----

    /// Creates a foreign key, or merges into an equivalent existing one.
    ///
    /// Equivalence is decided by [`ForeignKeyKey`]. When `name` is given it
    /// replaces whatever name the existing key carried.
    pub fn create_foreign_key(
        &mut self,
        name: Option<String>,
        columns: Vec<ColumnId>,
        referenced_entity_name: &str,
        key_definition: Option<String>,
        referenced_columns: Vec<ColumnId>,
    ) -> &mut ForeignKey {
        let key = ForeignKeyKey::new(
            columns.clone(),
            referenced_entity_name,
            referenced_columns.clone(),
        );
        let pos = if let Some(&pos) = self.foreign_key_index.get(&key) {
            pos
        } else {
            self.foreign_keys.push(ForeignKey::new(
                None,
                columns,
                referenced_entity_name,
                key_definition,
                referenced_columns,
            ));
            let pos = self.foreign_keys.len() - 1;
            self.foreign_key_index.insert(key, pos);
            pos
        };
        let fk = &mut self.foreign_keys[pos];
        if let Some(name) = name {
            fk.set_name(name);
        }
        fk
    }

    /// Foreign keys in creation order.
    #[must_use]
    pub fn foreign_keys(&self) -> &[ForeignKey] {
        &self.foreign_keys
    }

    /// Foreign keys for modification.
    pub fn foreign_keys_mut(&mut self) -> &mut [ForeignKey] {
        &mut self.foreign_keys
    }

    /// Assigns generated names to foreign keys that have none.
    pub fn name_foreign_keys(&mut self) {
        let table_name = self.name.table.text().to_string();
        let names: Vec<Option<String>> = self
            .foreign_keys
            .iter()
            .map(|fk| {
                fk.name()
                    .is_none()
                    .then(|| generate_name("FK", &table_name, &self.column_names(fk.columns())))
            })
            .collect();
        for (fk, name) in self.foreign_keys.iter_mut().zip(names) {
            if let Some(name) = name {
                fk.set_name(name);
            }
        }
    }

    // ---- other table attributes ----

    /// Table-level check constraints.
    #[must_use]
    pub fn check_constraints(&self) -> &[String] {
        &self.check_constraints
    }

    /// Adds a table-level check constraint.
    pub fn add_check_constraint(&mut self, constraint: impl Into<String>) {
        self.check_constraints.push(constraint.into());
    }

    /// Row id column name, if any.
    #[must_use]
    pub fn row_id(&self) -> Option<&str> {
        self.row_id.as_deref()
    }

    /// Sets the row id column name.
    pub fn set_row_id(&mut self, row_id: Option<String>) {
        self.row_id = row_id;
    }

    /// Table comment, if any.
    #[must_use]
    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    /// Sets the table comment.
    pub fn set_comment(&mut self, comment: Option<String>) {
        self.comment = comment;
    }

    /// Subselect text for a table backed by a query.
    #[must_use]
    pub fn subselect(&self) -> Option<&str> {
        self.subselect.as_deref()
    }

    pub(crate) fn set_subselect(&mut self, subselect: Option<String>) {
        self.subselect = subselect;
    }

    /// Whether the table is backed by a subselect.
    #[must_use]
    pub fn is_subselect(&self) -> bool {
        self.subselect.is_some()
    }

    /// Whether the table belongs to an abstract class.
    #[must_use]
    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    /// Sets the abstract flag.
    pub fn set_abstract(&mut self, is_abstract: bool) {
        self.is_abstract = is_abstract;
    }

    /// Whether other tables denormalize this one.
    #[must_use]
    pub fn has_denormalized_tables(&self) -> bool {
        self.has_denormalized_tables
    }

    pub(crate) fn mark_denormalized_parent(&mut self) {
        self.has_denormalized_tables = true;
    }

    /// Table whose columns this one includes, for union subclasses.
    #[must_use]
    pub fn included_table(&self) -> Option<TableId> {
        self.included_table
    }

    pub(crate) fn set_included_table(&mut self, table: TableId) {
        self.included_table = Some(table);
    }

    /// An abstract root of a union hierarchy; never created physically.
    #[must_use]
    pub fn is_abstract_union_table(&self) -> bool {
        self.has_denormalized_tables && self.is_abstract
    }

    /// Whether DDL should create this table.
    #[must_use]
    pub fn is_physical_table(&self) -> bool {
        !self.is_subselect() && !self.is_abstract_union_table()
    }
}
