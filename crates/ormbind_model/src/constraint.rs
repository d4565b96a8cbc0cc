//! Primary keys, unique keys, indexes, and foreign keys.

use xxhash_rust::xxh3::xxh3_64;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::column::ColumnId;
use crate::table::TableId;

/// Generates a deterministic constraint name from a table and its columns.
///
/// Column names are sorted first, so the same column set always yields the
/// same name regardless of declaration order.
#[must_use]
pub fn generate_name(prefix: &str, table_name: &str, column_names: &[String]) -> String {
    let mut sorted: Vec<&str> = column_names.iter().map(String::as_str).collect();
    sorted.sort_unstable();
    let mut source = format!("table`{table_name}`");
    for name in sorted {
        source.push_str("column`");
        source.push_str(name);
        source.push('`');
    }
    format!("{prefix}{}", to_base35(xxh3_64(source.as_bytes())))
}

fn to_base35(mut n: u64) -> String {
    const DIGITS: &[u8; 35] = b"0123456789abcdefghijklmnopqrstuvwxy";
    if n == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while n > 0 {
        #[allow(clippy::cast_possible_truncation)]
        let digit = (n % 35) as usize;
        out.push(DIGITS[digit]);
        n /= 35;
    }
    out.reverse();
    out.into_iter().map(char::from).collect()
}

/// Returns `true` if both column lists contain the same columns, in any order.
#[must_use]
pub fn same_column_set(a: &[ColumnId], b: &[ColumnId]) -> bool {
    a.iter().all(|c| b.contains(c)) && b.iter().all(|c| a.contains(c))
}

fn push_unique(columns: &mut Vec<ColumnId>, column: ColumnId) {
    if !columns.contains(&column) {
        columns.push(column);
    }
}

/// A table's primary key.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PrimaryKey {
    name: Option<String>,
    columns: Vec<ColumnId>,
}

impl PrimaryKey {
    /// Creates an unnamed primary key over the given columns.
    #[must_use]
    pub fn new(columns: Vec<ColumnId>) -> Self {
        Self {
            name: None,
            columns,
        }
    }

    /// Sets the constraint name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Constraint name, if set.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Key columns in order.
    #[must_use]
    pub fn columns(&self) -> &[ColumnId] {
        &self.columns
    }

    /// Appends a column; duplicates are ignored.
    pub fn add_column(&mut self, column: ColumnId) {
        push_unique(&mut self.columns, column);
    }

    /// Whether the key covers no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// A named unique constraint.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UniqueKey {
    name: String,
    columns: Vec<ColumnId>,
    explicit: bool,
}

impl UniqueKey {
    /// Creates an empty unique key.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            explicit: false,
        }
    }

    /// Marks the key as declared by the user rather than derived.
    #[must_use]
    pub fn explicit(mut self) -> Self {
        self.explicit = true;
        self
    }

    /// Constraint name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Key columns in order.
    #[must_use]
    pub fn columns(&self) -> &[ColumnId] {
        &self.columns
    }

    /// Whether the user declared this key.
    #[must_use]
    pub fn is_explicit(&self) -> bool {
        self.explicit
    }

    /// Appends a column; duplicates are ignored.
    pub fn add_column(&mut self, column: ColumnId) {
        push_unique(&mut self.columns, column);
    }

    /// Adds a column and returns `self`.
    #[must_use]
    pub fn with_column(mut self, column: ColumnId) -> Self {
        self.add_column(column);
        self
    }
}

/// A named index.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Index {
    name: String,
    columns: Vec<ColumnId>,
}

impl Index {
    /// Creates an empty index.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
        }
    }

    /// Index name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Indexed columns in order.
    #[must_use]
    pub fn columns(&self) -> &[ColumnId] {
        &self.columns
    }

    /// Appends a column; duplicates are ignored.
    pub fn add_column(&mut self, column: ColumnId) {
        push_unique(&mut self.columns, column);
    }
}

/// Identity of a foreign key within its table.
///
/// Two keys are equal when their key columns and referenced columns match
/// position by position. The referenced entity name is carried along but is
/// not part of equality, so equivalent keys created for different
/// associations merge into one.
#[derive(Clone, Debug)]
pub struct ForeignKeyKey {
    columns: Vec<ColumnId>,
    referenced_entity_name: String,
    referenced_columns: Vec<ColumnId>,
}

impl ForeignKeyKey {
    /// Builds a key. An empty `referenced_columns` means "the referenced primary key".
    #[must_use]
    pub fn new(
        columns: Vec<ColumnId>,
        referenced_entity_name: impl Into<String>,
        referenced_columns: Vec<ColumnId>,
    ) -> Self {
        Self {
            columns,
            referenced_entity_name: referenced_entity_name.into(),
            referenced_columns,
        }
    }

    /// Entity the key was created for.
    #[must_use]
    pub fn referenced_entity_name(&self) -> &str {
        &self.referenced_entity_name
    }
}

impl PartialEq for ForeignKeyKey {
    fn eq(&self, other: &Self) -> bool {
        self.columns == other.columns && self.referenced_columns == other.referenced_columns
    }
}

impl Eq for ForeignKeyKey {}

impl std::hash::Hash for ForeignKeyKey {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.columns.hash(state);
        self.referenced_columns.hash(state);
    }
}

/// A foreign key constraint.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ForeignKey {
    name: Option<String>,
    columns: Vec<ColumnId>,
    referenced_entity_name: String,
    referenced_table: Option<TableId>,
    referenced_columns: Vec<ColumnId>,
    key_definition: Option<String>,
    cascade_delete: bool,
    creation_enabled: bool,
}

impl ForeignKey {
    /// Creates a foreign key over `columns` pointing at an entity.
    #[must_use]
    pub fn new(
        name: Option<String>,
        columns: Vec<ColumnId>,
        referenced_entity_name: impl Into<String>,
        key_definition: Option<String>,
        referenced_columns: Vec<ColumnId>,
    ) -> Self {
        Self {
            name,
            columns,
            referenced_entity_name: referenced_entity_name.into(),
            referenced_table: None,
            referenced_columns,
            key_definition,
            cascade_delete: false,
            creation_enabled: true,
        }
    }

    /// Constraint name; `None` until an implicit name is assigned.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Sets the constraint name.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
    }

    /// Key columns.
    #[must_use]
    pub fn columns(&self) -> &[ColumnId] {
        &self.columns
    }

    /// Entity the key points at.
    #[must_use]
    pub fn referenced_entity_name(&self) -> &str {
        &self.referenced_entity_name
    }

    /// Referenced table, once resolved.
    #[must_use]
    pub fn referenced_table(&self) -> Option<TableId> {
        self.referenced_table
    }

    /// Records the referenced table.
    pub fn set_referenced_table(&mut self, table: TableId) {
        self.referenced_table = Some(table);
    }

    /// Referenced columns; empty means the referenced primary key.
    #[must_use]
    pub fn referenced_columns(&self) -> &[ColumnId] {
        &self.referenced_columns
    }

    /// Whether the key points at the referenced table's primary key.
    #[must_use]
    pub fn is_referencing_primary_key(&self) -> bool {
        self.referenced_columns.is_empty()
    }

    /// Raw DDL definition, if one was supplied.
    #[must_use]
    pub fn key_definition(&self) -> Option<&str> {
        self.key_definition.as_deref()
    }

    /// Whether deleting the referenced row cascades.
    #[must_use]
    pub fn is_cascade_delete(&self) -> bool {
        self.cascade_delete
    }

    /// Sets delete cascading.
    pub fn set_cascade_delete(&mut self, cascade: bool) {
        self.cascade_delete = cascade;
    }

    /// Whether DDL should create this constraint.
    #[must_use]
    pub fn is_creation_enabled(&self) -> bool {
        self.creation_enabled
    }

    /// Turns DDL creation off.
    pub fn disable_creation(&mut self) {
        self.creation_enabled = false;
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn col(table: u32, index: u32) -> ColumnId {
        ColumnId::new(TableId::from_index(table), index)
    }

    #[test]
    fn generated_names_ignore_column_order() {
        let a = generate_name("UK_", "orders", &["a".into(), "b".into()]);
        let b = generate_name("UK_", "orders", &["b".into(), "a".into()]);
        assert_eq!(a, b);
        assert!(a.starts_with("UK_"));
        let other = generate_name("UK_", "items", &["a".into(), "b".into()]);
        assert_ne!(a, other);
    }

    #[test]
    fn base35_digits() {
        assert_eq!(to_base35(0), "0");
        assert_eq!(to_base35(34), "y");
        assert_eq!(to_base35(35), "10");
    }

    #[test]
    fn column_sets_compare_unordered() {
        assert!(same_column_set(&[col(0, 0), col(0, 1)], &[col(0, 1), col(0, 0)]));
        assert!(!same_column_set(&[col(0, 0)], &[col(0, 0), col(0, 1)]));
    }

    #[test]
    fn foreign_key_key_ignores_entity_name() {
        let a = ForeignKeyKey::new(vec![col(0, 1)], "Customer", vec![]);
        let b = ForeignKeyKey::new(vec![col(0, 1)], "Person", vec![]);
        assert_eq!(a, b);
        let set: HashSet<_> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn foreign_key_key_is_order_sensitive() {
        let a = ForeignKeyKey::new(vec![col(0, 1), col(0, 2)], "X", vec![]);
        let b = ForeignKeyKey::new(vec![col(0, 2), col(0, 1)], "X", vec![]);
        assert_ne!(a, b);
    }

    #[test]
    fn unique_key_dedups_columns() {
        let uk = UniqueKey::new("UK_x").with_column(col(0, 0)).with_column(col(0, 0));
        assert_eq!(uk.columns().len(), 1);
        assert!(!uk.is_explicit());
    }
}
