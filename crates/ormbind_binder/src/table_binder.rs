//! Tables, table-level constraints and foreign key columns.
//!
//! Creating a table maps its logical name through the physical naming
//! strategy. Unique constraints and indexes refer to columns that may only
//! exist once every property and association is bound, so they are applied
//! from a deferred second pass. [`bind_foreign_key_columns`] is the column
//! linking step shared by every foreign key pass.

use ormbind_foundation::names::non_blank;
use ormbind_foundation::{Error, Identifier, Result};
use ormbind_model::constraint::generate_name;
use ormbind_model::{Column, ColumnId, Index, SimpleValue, TableId, UniqueKey};

use crate::collector::InFlightMetadata;
use crate::descriptor::{IndexAnnotation, UniqueConstraintAnnotation};
use crate::join_column::{AnnotatedJoinColumn, AnnotatedJoinColumns};
use crate::naming::{implicit_join_column_name, physical_column_name, physical_table_name};

// =============================================================================
// Tables
// =============================================================================

/// What is known about a table before it is created.
#[derive(Clone, Debug, Default)]
pub struct TableSpec<'a> {
    /// Explicit catalog.
    pub catalog: Option<&'a str>,
    /// Explicit schema.
    pub schema: Option<&'a str>,
    /// Logical table name.
    pub logical_name: String,
    /// Subselect the table stands for.
    pub subselect: Option<String>,
    /// Whether only subclasses are ever stored.
    pub is_abstract: bool,
    /// Parent table whose columns are copied in, for union subclasses.
    pub denormalized_parent: Option<TableId>,
}

/// Creates (or reuses) the table described by `spec`.
///
/// # Errors
///
/// Returns an annotation error for a blank table name and a mapping error
/// for a union subclass table whose name is already taken.
pub fn bind_table(meta: &mut InFlightMetadata, spec: &TableSpec<'_>) -> Result<TableId> {
    let naming = meta.options.physical_naming.clone();
    let name = physical_table_name(&*naming, &spec.logical_name).ok_or_else(|| {
        Error::annotation(format!("Table name '{}' is blank", spec.logical_name))
    })?;
    let catalog = non_blank(spec.catalog)
        .and_then(Identifier::to_identifier)
        .map(|c| naming.to_physical_catalog_name(&c));
    let schema = non_blank(spec.schema)
        .and_then(Identifier::to_identifier)
        .map(|s| naming.to_physical_schema_name(&s));
    let id = match spec.denormalized_parent {
        Some(parent) => meta.database.add_denormalized_table(
            catalog,
            schema,
            name,
            spec.is_abstract,
            spec.subselect.clone(),
            parent,
        )?,
        None => meta.database.add_table(
            catalog,
            schema,
            name,
            spec.subselect.clone(),
            spec.is_abstract,
        ),
    };
    tracing::debug!(table = %spec.logical_name, "bound table");
    Ok(id)
}

/// Resolves constraint column names against `table`.
fn resolve_columns(
    meta: &InFlightMetadata,
    table: TableId,
    column_names: &[String],
    constraint: &str,
) -> Result<Vec<ColumnId>> {
    let target = meta.database.require_table(table)?;
    column_names
        .iter()
        .map(|name| {
            physical_column_name(&*meta.options.physical_naming, name)
                .and_then(|physical| target.column_by_name(&physical.to_string()))
                .ok_or_else(|| {
                    Error::annotation(format!(
                        "Unable to create {constraint} ({}) on table '{}': database column '{name}' not found",
                        column_names.join(", "),
                        target.name()
                    ))
                })
        })
        .collect()
}

/// Applies `@UniqueConstraint`s and `@Index`es to a bound table.
///
/// # Errors
///
/// Returns an annotation error for a constraint naming an unmapped column.
pub fn apply_table_constraints(
    meta: &mut InFlightMetadata,
    table: TableId,
    unique_constraints: &[UniqueConstraintAnnotation],
    indexes: &[IndexAnnotation],
) -> Result<()> {
    for constraint in unique_constraints {
        let columns = resolve_columns(meta, table, &constraint.columns, "unique key constraint")?;
        let target = meta.database.require_table_mut(table)?;
        let name = non_blank(constraint.name.as_deref()).map_or_else(
            || generate_name("UK", target.name().text(), &target.column_names(&columns)),
            str::to_string,
        );
        let key = target.get_or_create_unique_key(&name);
        for column in columns {
            key.add_column(column);
        }
    }
    for index in indexes {
        let columns = resolve_columns(meta, table, &index.columns, "index")?;
        let target = meta.database.require_table_mut(table)?;
        let column_names = target.column_names(&columns);
        if index.unique {
            let name = non_blank(index.name.as_deref()).map_or_else(
                || generate_name("UK", target.name().text(), &column_names),
                str::to_string,
            );
            let mut key = UniqueKey::new(name).explicit();
            for column in columns {
                key.add_column(column);
            }
            target.add_unique_key(key)?;
        } else {
            let name = non_blank(index.name.as_deref()).map_or_else(
                || generate_name("IDX", target.name().text(), &column_names),
                str::to_string,
            );
            let mut created = Index::new(name);
            for column in columns {
                created.add_column(column);
            }
            target.add_index(created)?;
        }
    }
    Ok(())
}

// =============================================================================
// Foreign key columns
// =============================================================================

/// Creates the columns of `join_columns` on `value`, mirroring `referenced`.
///
/// Implicit columns are named `<property>_<referenced column>` (or take the
/// group's implicit names), explicit ones keep their names. Columns that
/// name their referenced column are matched by that name, the others by
/// position. Type attributes missing on a join column are copied from the
/// referenced column.
///
/// # Errors
///
/// Returns a mapping error when the join columns cannot be matched to the
/// referenced columns.
pub fn bind_foreign_key_columns(
    meta: &mut InFlightMetadata,
    join_columns: &AnnotatedJoinColumns,
    referenced_entity: &str,
    referenced: &[ColumnId],
    value: &mut SimpleValue,
) -> Result<()> {
    let pairs = match_join_columns(meta, join_columns, referenced_entity, referenced)?;
    let naming = meta.options.physical_naming.clone();
    for (position, (join_column, referenced_id)) in pairs.into_iter().enumerate() {
        let referenced_column = meta
            .database
            .column(referenced_id)
            .cloned()
            .ok_or_else(|| Error::assertion_failure("referenced column vanished"))?;
        let logical = match &join_column.explicit_name {
            Some(name) => name.clone(),
            None => join_columns
                .implicit_names
                .as_ref()
                .and_then(|names| names.get(position).cloned())
                .unwrap_or_else(|| {
                    implicit_join_column_name(
                        &join_columns.property_path,
                        referenced_column.name().text(),
                    )
                }),
        };
        let physical = physical_column_name(&*naming, &logical).ok_or_else(|| {
            Error::annotation(format!(
                "Join column of '{}.{}' has a blank name",
                join_columns.entity_name, join_columns.property_path
            ))
        })?;
        let mut column = Column::new(physical)
            .with_nullable(join_column.nullable)
            .with_unique(join_column.unique);
        if let Some(definition) = &join_column.column_definition {
            column = column.with_sql_type(definition.clone());
        } else if let Some(sql_type) = referenced_column.sql_type() {
            column = column.with_sql_type(sql_type);
        }
        if let Some(length) = referenced_column.length() {
            column = column.with_length(length);
        }
        if let Some(precision) = referenced_column.precision() {
            column = column.with_precision(precision, referenced_column.scale().unwrap_or(0));
        }

        let table = meta.database.require_table_mut(value.table())?;
        let id = table.add_column(column);
        if !join_column.nullable {
            if let Some(existing) = table.column_mut(id) {
                existing.set_nullable(false);
            }
        }
        value.add_column(id, join_column.insertable, join_column.updatable)?;
    }
    Ok(())
}

fn match_join_columns(
    meta: &InFlightMetadata,
    join_columns: &AnnotatedJoinColumns,
    referenced_entity: &str,
    referenced: &[ColumnId],
) -> Result<Vec<(AnnotatedJoinColumn, ColumnId)>> {
    let count_mismatch = || {
        Error::annotation(format!(
            "An association that targets entity '{referenced_entity}' from entity '{}' has {} '@JoinColumn's but the primary key has {} columns",
            join_columns.entity_name,
            join_columns.columns.len(),
            referenced.len()
        ))
    };

    if join_columns.has_explicit_references() {
        let mut pairs = Vec::with_capacity(referenced.len());
        for &referenced_id in referenced {
            let name = meta
                .database
                .column(referenced_id)
                .map(|c| c.name().text().to_string())
                .unwrap_or_default();
            let join_column = join_columns
                .columns
                .iter()
                .find(|c| {
                    c.referenced_column
                        .as_deref()
                        .is_some_and(|r| referenced_name_matches(meta, r, &name))
                })
                .ok_or_else(count_mismatch)?;
            pairs.push((join_column.clone(), referenced_id));
        }
        if pairs.len() != join_columns.columns.len() {
            return Err(count_mismatch());
        }
        return Ok(pairs);
    }

    if join_columns.is_implicit() && join_columns.columns.len() == 1 {
        let template = &join_columns.columns[0];
        return Ok(referenced
            .iter()
            .map(|&id| (template.clone(), id))
            .collect());
    }
    if join_columns.columns.len() != referenced.len() {
        return Err(count_mismatch());
    }
    Ok(join_columns
        .columns
        .iter()
        .cloned()
        .zip(referenced.iter().copied())
        .collect())
}

/// Whether the logical `referenced` name denotes the physical column `name`.
pub(crate) fn referenced_name_matches(meta: &InFlightMetadata, referenced: &str, name: &str) -> bool {
    physical_column_name(&*meta.options.physical_naming, referenced)
        .is_some_and(|physical| physical.text().eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use ormbind_model::Database;

    use super::*;
    use crate::descriptor::JoinColumnAnnotation;

    fn meta_with_target() -> (InFlightMetadata, TableId, TableId, Vec<ColumnId>) {
        let mut meta = InFlightMetadata::default();
        let target = meta.database.add_table(
            None,
            None,
            Identifier::new("Customer", false),
            None,
            false,
        );
        let owner = meta
            .database
            .add_table(None, None, Identifier::new("Orders", false), None, false);
        let table = meta.database.table_mut(target).unwrap();
        let id = table.add_column(
            Column::new(Identifier::new("id", false))
                .with_nullable(false)
                .with_sql_type("bigint"),
        );
        let region = table.add_column(Column::new(Identifier::new("region", false)).with_length(8));
        (meta, target, owner, vec![id, region])
    }

    fn column_names(db: &Database, ids: &[ColumnId]) -> Vec<String> {
        ids.iter()
            .map(|id| db.column(*id).unwrap().name().text().to_string())
            .collect()
    }

    #[test]
    fn implicit_columns_follow_every_referenced_column() {
        let (mut meta, _, owner, referenced) = meta_with_target();
        let group = AnnotatedJoinColumns::from_annotations(&[], "Order", "customer", owner);
        let mut value = SimpleValue::new(owner);
        bind_foreign_key_columns(&mut meta, &group, "Customer", &referenced, &mut value).unwrap();
        assert_eq!(
            column_names(&meta.database, &value.columns()),
            ["customer_id", "customer_region"]
        );
        let first = meta.database.column(value.columns()[0]).unwrap();
        assert_eq!(first.sql_type(), Some("bigint"));
        let second = meta.database.column(value.columns()[1]).unwrap();
        assert_eq!(second.length(), Some(8));
    }

    #[test]
    fn explicit_references_are_matched_by_name() {
        let (mut meta, _, owner, referenced) = meta_with_target();
        let a = JoinColumnAnnotation::referencing("cust_region", "region");
        let b = JoinColumnAnnotation::referencing("cust_id", "ID");
        let group = AnnotatedJoinColumns::from_annotations(&[&a, &b], "Order", "customer", owner);
        let mut value = SimpleValue::new(owner);
        bind_foreign_key_columns(&mut meta, &group, "Customer", &referenced, &mut value).unwrap();
        assert_eq!(
            column_names(&meta.database, &value.columns()),
            ["cust_id", "cust_region"]
        );
    }

    #[test]
    fn column_count_must_match() {
        let (mut meta, _, owner, referenced) = meta_with_target();
        let a = JoinColumnAnnotation::named("only_one");
        let group = AnnotatedJoinColumns::from_annotations(&[&a], "Order", "customer", owner);
        let mut value = SimpleValue::new(owner);
        let err = bind_foreign_key_columns(&mut meta, &group, "Customer", &referenced, &mut value)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "An association that targets entity 'Customer' from entity 'Order' has 1 '@JoinColumn's but the primary key has 2 columns"
        );
    }

    #[test]
    fn constraints_resolve_physical_columns() {
        let (mut meta, target, _, _) = meta_with_target();
        let unique = UniqueConstraintAnnotation {
            name: None,
            columns: vec!["region".into()],
        };
        let index = IndexAnnotation {
            name: Some("idx_region".into()),
            columns: vec!["region".into()],
            unique: false,
        };
        apply_table_constraints(&mut meta, target, &[unique], &[index]).unwrap();
        let table = meta.database.table(target).unwrap();
        assert_eq!(table.unique_keys().len(), 1);
        assert_eq!(table.indexes()[0].name(), "idx_region");

        let missing = UniqueConstraintAnnotation {
            name: None,
            columns: vec!["nope".into()],
        };
        let err = apply_table_constraints(&mut meta, target, &[missing], &[]).unwrap_err();
        assert!(err.to_string().contains("database column 'nope' not found"));
    }
}
