//! Transient join column groups.
//!
//! An [`AnnotatedJoinColumns`] is built while an association is bound in the
//! first pass and consumed by the foreign key second pass, which turns each
//! [`AnnotatedJoinColumn`] into a real column once the referenced key is known.

use ormbind_foundation::names::non_blank;
use ormbind_model::TableId;

use crate::descriptor::{JoinColumnAnnotation, PrimaryKeyJoinColumnAnnotation};

/// One join column as declared, or an implicit placeholder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnnotatedJoinColumn {
    /// Explicit column name.
    pub explicit_name: Option<String>,
    /// Name of the referenced column in the target table.
    pub referenced_column: Option<String>,
    /// Whether the column may hold null.
    pub nullable: bool,
    /// Whether the column is written on insert.
    pub insertable: bool,
    /// Whether the column is written on update.
    pub updatable: bool,
    /// Whether the column is unique on its own.
    pub unique: bool,
    /// Table the column lives on, when not the owner's primary table.
    pub explicit_table: Option<String>,
    /// SQL fragment replacing the derived column type.
    pub column_definition: Option<String>,
}

impl Default for AnnotatedJoinColumn {
    fn default() -> Self {
        Self::implicit()
    }
}

impl AnnotatedJoinColumn {
    /// A column whose name and reference are derived later.
    #[must_use]
    pub fn implicit() -> Self {
        Self {
            explicit_name: None,
            referenced_column: None,
            nullable: true,
            insertable: true,
            updatable: true,
            unique: false,
            explicit_table: None,
            column_definition: None,
        }
    }

    /// From a `@JoinColumn`; blank members count as absent.
    #[must_use]
    pub fn from_annotation(annotation: &JoinColumnAnnotation) -> Self {
        Self {
            explicit_name: non_blank(annotation.name.as_deref()).map(str::to_string),
            referenced_column: non_blank(annotation.referenced_column_name.as_deref())
                .map(str::to_string),
            nullable: annotation.nullable,
            insertable: annotation.insertable,
            updatable: annotation.updatable,
            unique: annotation.unique,
            explicit_table: non_blank(annotation.table.as_deref()).map(str::to_string),
            column_definition: non_blank(annotation.column_definition.as_deref())
                .map(str::to_string),
        }
    }

    /// From a `@PrimaryKeyJoinColumn`.
    #[must_use]
    pub fn from_primary_key_annotation(annotation: &PrimaryKeyJoinColumnAnnotation) -> Self {
        Self {
            explicit_name: non_blank(annotation.name.as_deref()).map(str::to_string),
            referenced_column: non_blank(annotation.referenced_column_name.as_deref())
                .map(str::to_string),
            nullable: false,
            column_definition: non_blank(annotation.column_definition.as_deref())
                .map(str::to_string),
            ..Self::implicit()
        }
    }

    /// Whether neither a name nor a referenced column was given.
    #[must_use]
    pub fn is_implicit(&self) -> bool {
        self.explicit_name.is_none() && self.referenced_column.is_none()
    }
}

/// The join columns of one association.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnnotatedJoinColumns {
    /// Columns in declaration order; never empty.
    pub columns: Vec<AnnotatedJoinColumn>,
    /// Entity owning the association.
    pub entity_name: String,
    /// Path of the association relative to its entity.
    pub property_path: String,
    /// Table the columns are created on.
    pub table: TableId,
    /// `mappedBy` of the owning annotation.
    pub mapped_by: Option<String>,
    /// Names used for implicit columns instead of the derived ones.
    pub implicit_names: Option<Vec<String>>,
}

impl AnnotatedJoinColumns {
    /// Builds the group from `@JoinColumn`s; none yields one implicit column.
    #[must_use]
    pub fn from_annotations(
        annotations: &[&JoinColumnAnnotation],
        entity_name: &str,
        property_path: &str,
        table: TableId,
    ) -> Self {
        let mut columns: Vec<AnnotatedJoinColumn> = annotations
            .iter()
            .map(|a| AnnotatedJoinColumn::from_annotation(a))
            .collect();
        if columns.is_empty() {
            columns.push(AnnotatedJoinColumn::implicit());
        }
        Self::with_columns(columns, entity_name, property_path, table)
    }

    /// Builds the group from `@PrimaryKeyJoinColumn`s; none yields one
    /// implicit column.
    #[must_use]
    pub fn from_primary_key_annotations(
        annotations: &[PrimaryKeyJoinColumnAnnotation],
        entity_name: &str,
        property_path: &str,
        table: TableId,
    ) -> Self {
        let mut columns: Vec<AnnotatedJoinColumn> = annotations
            .iter()
            .map(AnnotatedJoinColumn::from_primary_key_annotation)
            .collect();
        if columns.is_empty() {
            let mut implicit = AnnotatedJoinColumn::implicit();
            implicit.nullable = false;
            columns.push(implicit);
        }
        Self::with_columns(columns, entity_name, property_path, table)
    }

    fn with_columns(
        columns: Vec<AnnotatedJoinColumn>,
        entity_name: &str,
        property_path: &str,
        table: TableId,
    ) -> Self {
        Self {
            columns,
            entity_name: entity_name.to_string(),
            property_path: property_path.to_string(),
            table,
            mapped_by: None,
            implicit_names: None,
        }
    }

    /// Sets `mappedBy`; blank counts as absent.
    #[must_use]
    pub fn with_mapped_by(mut self, mapped_by: Option<&str>) -> Self {
        self.mapped_by = non_blank(mapped_by).map(str::to_string);
        self
    }

    /// Whether every column is implicit.
    #[must_use]
    pub fn is_implicit(&self) -> bool {
        self.columns.iter().all(AnnotatedJoinColumn::is_implicit)
    }

    /// Whether any column names its referenced column.
    #[must_use]
    pub fn has_explicit_references(&self) -> bool {
        self.columns.iter().any(|c| c.referenced_column.is_some())
    }

    /// Explicit column names, in order; `None` if any column is unnamed.
    #[must_use]
    pub fn explicit_names(&self) -> Option<Vec<&str>> {
        self.columns
            .iter()
            .map(|c| c.explicit_name.as_deref())
            .collect()
    }

    /// Marks every column non-null.
    pub fn set_mandatory(&mut self) {
        for column in &mut self.columns {
            column.nullable = false;
        }
    }

    /// Marks every column non-insertable and non-updatable.
    pub fn set_read_only(&mut self) {
        for column in &mut self.columns {
            column.insertable = false;
            column.updatable = false;
        }
    }

    /// Insertability of the first column.
    #[must_use]
    pub fn first_insertable(&self) -> bool {
        self.columns.first().is_none_or(|c| c.insertable)
    }

    /// Updatability of the first column.
    #[must_use]
    pub fn first_updatable(&self) -> bool {
        self.columns.first().is_none_or(|c| c.updatable)
    }
}

/// Whether an association may be null judging by its join column
/// annotations: a single column decides alone, a group if any member is
/// nullable, and no annotation at all means nullable.
#[must_use]
pub fn annotations_nullable(annotations: &[&JoinColumnAnnotation]) -> bool {
    match annotations {
        [] => true,
        [single] => single.nullable,
        many => many.iter().any(|a| a.nullable),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: TableId = TableId::from_index(0);

    #[test]
    fn no_annotation_means_one_implicit_column() {
        let group = AnnotatedJoinColumns::from_annotations(&[], "Order", "customer", TABLE);
        assert_eq!(group.columns.len(), 1);
        assert!(group.is_implicit());
        assert!(group.explicit_names().is_none());
    }

    #[test]
    fn blank_members_are_absent() {
        let annotation = JoinColumnAnnotation::referencing(" ", "code");
        let group =
            AnnotatedJoinColumns::from_annotations(&[&annotation], "Order", "customer", TABLE);
        assert!(!group.is_implicit());
        assert!(group.has_explicit_references());
        assert_eq!(group.columns[0].explicit_name, None);
    }

    #[test]
    fn primary_key_join_columns_are_mandatory() {
        let group = AnnotatedJoinColumns::from_primary_key_annotations(&[], "Dog", "", TABLE);
        assert!(!group.columns[0].nullable);
    }

    #[test]
    fn nullability_of_annotations() {
        let a = JoinColumnAnnotation::named("a").with_nullable(false);
        let b = JoinColumnAnnotation::named("b");
        assert!(annotations_nullable(&[]));
        assert!(!annotations_nullable(&[&a]));
        assert!(annotations_nullable(&[&a, &b]));
    }
}
