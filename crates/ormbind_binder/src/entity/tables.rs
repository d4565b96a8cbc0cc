//! Primary, secondary and complementary tables of an entity.

use ormbind_foundation::names::non_blank;
use ormbind_foundation::{Error, Result};
use ormbind_model::{ClassId, CustomSql, ForeignKeySettings, Join, PersistentClass, TableId};

use crate::collector::InFlightMetadata;
use crate::descriptor::{
    ComplementaryTableAnnotation, CustomSqlAnnotation, EntityDescriptor, ForeignKeyAnnotation,
    IndexAnnotation, InheritanceType, SqlKind, UniqueConstraintAnnotation,
};
use crate::diagnostics::Anomaly;
use crate::inheritance::InheritanceState;
use crate::naming::class_to_table_name;
use crate::second_pass::{SecondPass, SecondaryTableSecondPass};
use crate::table_binder::{TableSpec, apply_table_constraints, bind_table};

/// The primary table of an entity and the name it was declared under.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(super) struct PrimaryTable {
    pub(super) table: TableId,
    pub(super) logical_name: String,
}

/// Binds the entity's own table, or finds the table it shares with its
/// parent.
pub(super) fn bind_primary_table(
    meta: &mut InFlightMetadata,
    entity: &EntityDescriptor,
    state: &InheritanceState,
    parent: Option<(ClassId, &str)>,
) -> Result<PrimaryTable> {
    if !state.has_table() {
        let (_, super_entity) = parent.ok_or_else(|| {
            Error::assertion_failure(format!(
                "entity '{}' has no table and no superclass",
                entity.class_name
            ))
        })?;
        if entity.table.is_some() {
            meta.diagnostics.record(Anomaly::TableAnnotationWithoutTable {
                entity: entity.class_name.clone(),
            });
        }
        let xref = meta.entity_table_xref(super_entity).ok_or_else(|| {
            Error::assertion_failure(format!("no table cross-reference for '{super_entity}'"))
        })?;
        return Ok(PrimaryTable {
            table: xref.primary_table,
            logical_name: xref.primary_logical_name.clone(),
        });
    }

    let annotation = entity.table.as_ref();
    let logical_name = non_blank(annotation.and_then(|t| t.name.as_deref()))
        .map_or_else(|| class_to_table_name(entity.jpa_entity_name()), str::to_string);
    let denormalized_parent = match parent {
        Some((super_class, _)) if state.has_denormalized_table() => {
            Some(meta.bindings.require(super_class)?.table())
        }
        _ => None,
    };
    let spec = TableSpec {
        catalog: annotation.and_then(|t| t.catalog.as_deref()),
        schema: annotation.and_then(|t| t.schema.as_deref()),
        logical_name: logical_name.clone(),
        subselect: entity.subselect.clone(),
        is_abstract: entity.is_abstract && state.strategy == InheritanceType::TablePerClass,
        denormalized_parent,
    };
    let table = bind_table(meta, &spec)?;
    Ok(PrimaryTable {
        table,
        logical_name,
    })
}

/// Whether `name` designates `table`, declared as `logical`.
fn names_table(meta: &InFlightMetadata, name: &str, logical: &str, table: TableId) -> bool {
    let name = name.trim();
    logical.eq_ignore_ascii_case(name)
        || meta
            .database
            .table(table)
            .is_some_and(|t| t.name().text().eq_ignore_ascii_case(name))
}

fn custom_sql(annotation: &CustomSqlAnnotation) -> CustomSql {
    CustomSql::new(&annotation.sql, annotation.callable, annotation.check)
}

/// Applies entity-level custom SQL that targets the primary table, named
/// `primary` or not named at all.
///
/// # Errors
///
/// Returns an annotation error for `@SQLDeleteAll` on an entity.
pub(super) fn apply_entity_custom_sql(
    class: &mut PersistentClass,
    entity: &EntityDescriptor,
    primary: &str,
) -> Result<()> {
    let targets_primary = |a: &&CustomSqlAnnotation| {
        non_blank(a.table.as_deref()).is_none_or(|t| t.trim().eq_ignore_ascii_case(primary))
    };
    for annotation in entity.custom_sql.iter().filter(targets_primary) {
        let sql = custom_sql(annotation);
        match annotation.kind {
            SqlKind::Insert => class.custom_sql_insert = Some(sql),
            SqlKind::Update => class.custom_sql_update = Some(sql),
            SqlKind::Delete => class.custom_sql_delete = Some(sql),
            SqlKind::DeleteAll => {
                return Err(Error::annotation(format!(
                    "Entity '{}' has a '@SQLDeleteAll', which applies only to collections",
                    entity.class_name
                )));
            }
        }
    }
    Ok(())
}

/// Settings of a foreign key declared by a `@ForeignKey`.
pub(super) fn annotated_foreign_key(
    annotation: Option<&ForeignKeyAnnotation>,
    no_constraint_by_default: bool,
) -> ForeignKeySettings {
    let mut settings = ForeignKeySettings::default();
    if let Some(fk) = annotation {
        if fk.is_no_constraint(no_constraint_by_default) {
            settings.disable();
        } else {
            settings.set_name(non_blank(fk.name.as_deref()));
            settings.set_definition(non_blank(fk.definition.as_deref()));
        }
    }
    settings
}

fn queue_constraints(
    meta: &mut InFlightMetadata,
    entity_name: &str,
    table: TableId,
    unique_constraints: Vec<UniqueConstraintAnnotation>,
    indexes: Vec<IndexAnnotation>,
) {
    if unique_constraints.is_empty() && indexes.is_empty() {
        return;
    }
    meta.add_second_pass(SecondPass::deferred(
        format!("table constraints of {entity_name}"),
        move |meta| apply_table_constraints(meta, table, &unique_constraints, &indexes),
    ));
}

/// Applies `@Table` options and complementary definitions to the primary
/// table. Constraints are applied once every column exists.
///
/// # Errors
///
/// Returns an assertion failure when the table is missing.
pub(super) fn apply_primary_table_options(
    meta: &mut InFlightMetadata,
    entity: &EntityDescriptor,
    state: &InheritanceState,
    primary: &PrimaryTable,
) -> Result<()> {
    if !state.has_table() {
        return Ok(());
    }
    let complementary: Vec<&ComplementaryTableAnnotation> = entity
        .complementary_tables
        .iter()
        .filter(|c| names_table(meta, &c.applies_to, &primary.logical_name, primary.table))
        .collect();

    let table = meta.database.require_table_mut(primary.table)?;
    if let Some(annotation) = &entity.table {
        if let Some(check) = non_blank(annotation.check.as_deref()) {
            table.add_check_constraint(check);
        }
        if let Some(comment) = non_blank(annotation.comment.as_deref()) {
            table.set_comment(Some(comment.to_string()));
        }
    }
    if let Some(row_id) = non_blank(entity.row_id.as_deref()) {
        table.set_row_id(Some(row_id.to_string()));
    }
    for c in &complementary {
        if let Some(comment) = non_blank(c.comment.as_deref()) {
            table.set_comment(Some(comment.to_string()));
        }
        if let Some(check) = non_blank(c.check.as_deref()) {
            table.add_check_constraint(check);
        }
    }

    let unique_constraints = entity
        .table
        .as_ref()
        .map(|t| t.unique_constraints.clone())
        .unwrap_or_default();
    let mut indexes = entity
        .table
        .as_ref()
        .map(|t| t.indexes.clone())
        .unwrap_or_default();
    indexes.extend(complementary.iter().flat_map(|c| c.indexes.iter().cloned()));
    queue_constraints(meta, &entity.class_name, primary.table, unique_constraints, indexes);
    Ok(())
}

/// Binds every `@SecondaryTable` of the entity as a join and queues its key.
///
/// # Errors
///
/// Returns an annotation error for a complementary table, secondary row, or
/// custom SQL statement that names an undeclared table.
pub(super) fn bind_secondary_tables(
    meta: &mut InFlightMetadata,
    class: ClassId,
    entity: &EntityDescriptor,
    primary: &PrimaryTable,
) -> Result<()> {
    let mut declared = Vec::with_capacity(entity.secondary_tables.len());
    for annotation in &entity.secondary_tables {
        let logical_name = annotation.name.trim().to_string();
        let table = bind_table(
            meta,
            &TableSpec {
                catalog: annotation.catalog.as_deref(),
                schema: annotation.schema.as_deref(),
                logical_name: logical_name.clone(),
                subselect: None,
                is_abstract: false,
                denormalized_parent: None,
            },
        )?;
        meta.add_secondary_table(&entity.class_name, &logical_name, table)?;

        let mut join = Join::new(table);
        let complementary = entity
            .complementary_tables
            .iter()
            .find(|c| names_table(meta, &c.applies_to, &logical_name, table));
        let row = entity.secondary_rows.iter().find(|r| {
            r.table
                .as_deref()
                .is_some_and(|t| names_table(meta, t, &logical_name, table))
        });
        match (row, complementary) {
            (Some(row), _) => {
                join.set_inverse(!row.owned);
                join.set_optional(row.optional);
            }
            (None, Some(c)) => {
                join.set_inverse(c.inverse);
                join.set_optional(c.optional);
            }
            (None, None) => {
                join.set_inverse(false);
                join.set_optional(true);
            }
        }

        let mut statements: Vec<&CustomSqlAnnotation> = entity
            .custom_sql
            .iter()
            .filter(|a| {
                a.table
                    .as_deref()
                    .is_some_and(|t| names_table(meta, t, &logical_name, table))
            })
            .collect();
        if let Some(c) = complementary {
            statements.extend([&c.sql_insert, &c.sql_update, &c.sql_delete].into_iter().flatten());
        }
        for statement in statements {
            match statement.kind {
                SqlKind::Insert => join.set_custom_sql_insert(custom_sql(statement)),
                SqlKind::Update => join.set_custom_sql_update(custom_sql(statement)),
                SqlKind::Delete => join.set_custom_sql_delete(custom_sql(statement)),
                SqlKind::DeleteAll => {
                    return Err(Error::annotation(format!(
                        "Entity '{}' has a '@SQLDeleteAll' for secondary table '{logical_name}', which applies only to collections",
                        entity.class_name
                    )));
                }
            }
        }

        if let Some(c) = complementary {
            let target = meta.database.require_table_mut(table)?;
            if let Some(comment) = non_blank(c.comment.as_deref()) {
                target.set_comment(Some(comment.to_string()));
            }
            if let Some(check) = non_blank(c.check.as_deref()) {
                target.add_check_constraint(check);
            }
        }

        let foreign_key = match complementary.and_then(|c| non_blank(c.foreign_key_name.as_deref())) {
            Some(name) => {
                let mut settings = ForeignKeySettings::default();
                settings.set_name(Some(name));
                settings
            }
            None => annotated_foreign_key(
                annotation.foreign_key.as_ref(),
                meta.options.no_constraint_by_default,
            ),
        };

        meta.bindings.require_mut(class)?.add_join(join);
        meta.add_second_pass(SecondPass::SecondaryTable(SecondaryTableSecondPass::new(
            class,
            &entity.class_name,
            table,
            annotation.pk_join_columns.clone(),
            foreign_key,
        )));
        let mut indexes = annotation.indexes.clone();
        indexes.extend(complementary.iter().flat_map(|c| c.indexes.iter().cloned()));
        queue_constraints(
            meta,
            &entity.class_name,
            table,
            annotation.unique_constraints.clone(),
            indexes,
        );
        tracing::debug!(entity = %entity.class_name, table = %logical_name, "bound secondary table");
        declared.push((logical_name, table));
    }

    let known = |meta: &InFlightMetadata, name: &str| {
        names_table(meta, name, &primary.logical_name, primary.table)
            || declared
                .iter()
                .any(|(logical, table)| names_table(meta, name, logical, *table))
    };
    let referenced = entity
        .complementary_tables
        .iter()
        .map(|c| c.applies_to.as_str())
        .chain(entity.secondary_rows.iter().filter_map(|r| r.table.as_deref()))
        .chain(entity.custom_sql.iter().filter_map(|s| non_blank(s.table.as_deref())));
    for name in referenced {
        if !known(meta, name) {
            return Err(Error::annotation(format!(
                "Entity '{}' has a '@Table' annotation which references an unknown table: {name}",
                entity.class_name
            )));
        }
    }
    Ok(())
}
