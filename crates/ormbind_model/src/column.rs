//! Columns and the selectable expressions a value maps to.

use ormbind_foundation::{Identifier, IdentifierRenderer};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::table::TableId;

/// Default length for character columns.
pub const DEFAULT_LENGTH: u32 = 255;

/// Stable handle to a column: the owning table plus the column's position.
///
/// Positions never change once a column is added, so the handle stays valid
/// for the life of the [`Database`](crate::Database).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ColumnId {
    /// Table the column belongs to.
    pub table: TableId,
    /// Zero-based position in the table's column list.
    pub index: u32,
}

impl ColumnId {
    /// Creates a column handle.
    #[must_use]
    pub const fn new(table: TableId, index: u32) -> Self {
        Self { table, index }
    }
}

/// A physical column.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Column {
    name: Identifier,
    nullable: bool,
    unique: bool,
    length: Option<u32>,
    precision: Option<u32>,
    scale: Option<u32>,
    sql_type: Option<String>,
    check_constraint: Option<String>,
    default_value: Option<String>,
    comment: Option<String>,
    unique_integer: usize,
}

impl Column {
    /// Creates a nullable, non-unique column.
    #[must_use]
    pub fn new(name: Identifier) -> Self {
        Self {
            name,
            nullable: true,
            unique: false,
            length: None,
            precision: None,
            scale: None,
            sql_type: None,
            check_constraint: None,
            default_value: None,
            comment: None,
            unique_integer: 0,
        }
    }

    /// Sets nullability.
    #[must_use]
    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Sets the unique flag.
    #[must_use]
    pub fn with_unique(mut self, unique: bool) -> Self {
        self.unique = unique;
        self
    }

    /// Sets the length.
    #[must_use]
    pub fn with_length(mut self, length: u32) -> Self {
        self.length = Some(length);
        self
    }

    /// Sets precision and scale.
    #[must_use]
    pub fn with_precision(mut self, precision: u32, scale: u32) -> Self {
        self.precision = Some(precision);
        self.scale = Some(scale);
        self
    }

    /// Sets an explicit SQL type (a column definition).
    #[must_use]
    pub fn with_sql_type(mut self, sql_type: impl Into<String>) -> Self {
        self.sql_type = Some(sql_type.into());
        self
    }

    /// Sets a column check constraint.
    #[must_use]
    pub fn with_check(mut self, check: impl Into<String>) -> Self {
        self.check_constraint = Some(check.into());
        self
    }

    /// Sets a default value expression.
    #[must_use]
    pub fn with_default(mut self, default_value: impl Into<String>) -> Self {
        self.default_value = Some(default_value.into());
        self
    }

    /// Sets a column comment.
    #[must_use]
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// The column name.
    #[must_use]
    pub fn name(&self) -> &Identifier {
        &self.name
    }

    /// Canonical name used for lookups.
    #[must_use]
    pub fn canonical_name(&self) -> String {
        self.name.canonical_name()
    }

    /// Renders the name, quoting through `renderer` when needed.
    #[must_use]
    pub fn quoted_name(&self, renderer: &dyn IdentifierRenderer) -> String {
        self.name.render(renderer)
    }

    /// Whether the column accepts nulls.
    #[must_use]
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Changes nullability.
    pub fn set_nullable(&mut self, nullable: bool) {
        self.nullable = nullable;
    }

    /// Whether the column carries a single-column unique constraint.
    #[must_use]
    pub fn is_unique(&self) -> bool {
        self.unique
    }

    /// Changes the unique flag.
    pub fn set_unique(&mut self, unique: bool) {
        self.unique = unique;
    }

    /// Declared length, if any.
    #[must_use]
    pub fn length(&self) -> Option<u32> {
        self.length
    }

    /// Declared precision, if any.
    #[must_use]
    pub fn precision(&self) -> Option<u32> {
        self.precision
    }

    /// Declared scale, if any.
    #[must_use]
    pub fn scale(&self) -> Option<u32> {
        self.scale
    }

    /// Explicit SQL type, if any.
    #[must_use]
    pub fn sql_type(&self) -> Option<&str> {
        self.sql_type.as_deref()
    }

    /// Column check constraint, if any.
    #[must_use]
    pub fn check_constraint(&self) -> Option<&str> {
        self.check_constraint.as_deref()
    }

    /// Default value expression, if any.
    #[must_use]
    pub fn default_value(&self) -> Option<&str> {
        self.default_value.as_deref()
    }

    /// Column comment, if any.
    #[must_use]
    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    /// One-based position assigned when the column joined its table.
    #[must_use]
    pub fn unique_integer(&self) -> usize {
        self.unique_integer
    }

    pub(crate) fn set_unique_integer(&mut self, unique_integer: usize) {
        self.unique_integer = unique_integer;
    }
}

/// Something a simple value selects: a mapped column or a SQL formula.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Selectable {
    /// A column of the value's table.
    Column(ColumnId),
    /// A read-only SQL fragment.
    Formula(String),
}

impl Selectable {
    /// Returns the column handle, or `None` for a formula.
    #[must_use]
    pub fn column(&self) -> Option<ColumnId> {
        match self {
            Self::Column(id) => Some(*id),
            Self::Formula(_) => None,
        }
    }

    /// Returns `true` for a formula.
    #[must_use]
    pub fn is_formula(&self) -> bool {
        matches!(self, Self::Formula(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(name: &str) -> Identifier {
        Identifier::to_identifier(name).unwrap()
    }

    #[test]
    fn new_column_defaults() {
        let col = Column::new(ident("NAME"));
        assert!(col.is_nullable());
        assert!(!col.is_unique());
        assert_eq!(col.canonical_name(), "name");
        assert!(col.length().is_none());
    }

    #[test]
    fn builder_sets_attributes() {
        let col = Column::new(ident("price"))
            .with_nullable(false)
            .with_precision(10, 2)
            .with_sql_type("decimal(10,2)")
            .with_comment("unit price");
        assert!(!col.is_nullable());
        assert_eq!(col.precision(), Some(10));
        assert_eq!(col.scale(), Some(2));
        assert_eq!(col.sql_type(), Some("decimal(10,2)"));
        assert_eq!(col.comment(), Some("unit price"));
    }

    #[test]
    fn selectable_accessors() {
        let id = ColumnId::new(TableId::from_index(0), 3);
        assert_eq!(Selectable::Column(id).column(), Some(id));
        let formula = Selectable::Formula("upper(name)".into());
        assert!(formula.is_formula());
        assert!(formula.column().is_none());
    }
}
