//! Discriminator columns and values.

use ormbind_foundation::names::{java_string_hash, non_blank};
use ormbind_foundation::{Error, Result};
use ormbind_model::{ClassId, Column, SimpleValue, TableId};

use crate::collector::InFlightMetadata;
use crate::descriptor::{DiscriminatorColumnAnnotation, EntityDescriptor, InheritanceType};
use crate::diagnostics::Anomaly;
use crate::inheritance::InheritanceState;
use crate::naming::{IMPLICIT_DISCRIMINATOR_COLUMN, physical_column_name};
use crate::second_pass::{NullableDiscriminatorSecondPass, SecondPass};

/// Binds the discriminator of a hierarchy root, or checks that a subclass
/// does not declare one.
///
/// A single-table root gets a discriminator when it has subclasses or
/// declares one. A joined root gets one when it declares a column, unless
/// explicit discriminators are ignored, or when implicit discriminators are
/// enabled.
///
/// # Errors
///
/// Returns an annotation error for a discriminator formula on a joined
/// hierarchy.
pub(super) fn bind_discriminator(
    meta: &mut InFlightMetadata,
    class: ClassId,
    entity: &EntityDescriptor,
    state: &InheritanceState,
    table: TableId,
) -> Result<()> {
    let formula = non_blank(entity.discriminator_formula.as_deref());
    let column = entity.discriminator_column.as_ref();

    if state.strategy == InheritanceType::Joined && formula.is_some() {
        return Err(Error::annotation(format!(
            "Entity '{}' has a '@DiscriminatorFormula' but uses 'JOINED' inheritance",
            entity.class_name
        )));
    }
    if state.has_parents() {
        if column.is_some() || formula.is_some() {
            meta.diagnostics.record(Anomaly::DiscriminatorAnnotationOnSubclass {
                entity: entity.class_name.clone(),
            });
        }
        return Ok(());
    }

    let wanted = match state.strategy {
        InheritanceType::SingleTable => {
            state.has_children || column.is_some() || formula.is_some()
        }
        InheritanceType::Joined => match column {
            Some(_) if meta.options.ignore_explicit_discriminators_for_joined => {
                tracing::debug!(entity = %entity.class_name, "ignoring explicit discriminator of joined hierarchy");
                false
            }
            Some(_) => {
                meta.diagnostics.record(Anomaly::ExplicitDiscriminatorForJoined {
                    entity: entity.class_name.clone(),
                });
                true
            }
            None => meta.options.implicit_discriminators_for_joined,
        },
        InheritanceType::TablePerClass => false,
    };
    if !wanted {
        return Ok(());
    }

    let value = discriminator_value(meta, entity, column, formula, table)?;
    let force = entity
        .discriminator_options
        .map_or(meta.options.force_discriminator_in_select, |o| {
            o.force || meta.options.force_discriminator_in_select
        });
    let insertable = formula.is_none() && entity.discriminator_options.is_none_or(|o| o.insert);

    let root = meta.bindings.root_data_mut(class).ok_or_else(|| {
        Error::assertion_failure(format!("'{}' is not a hierarchy root", entity.class_name))
    })?;
    root.discriminator = Some(value);
    root.polymorphic = true;
    root.force_discriminator = force;
    root.discriminator_insertable = insertable;
    tracing::debug!(entity = %entity.class_name, force, insertable, "bound discriminator");

    meta.add_second_pass(SecondPass::NullableDiscriminator(
        NullableDiscriminatorSecondPass::new(class, &entity.class_name),
    ));
    Ok(())
}

fn discriminator_value(
    meta: &mut InFlightMetadata,
    entity: &EntityDescriptor,
    column: Option<&DiscriminatorColumnAnnotation>,
    formula: Option<&str>,
    table: TableId,
) -> Result<SimpleValue> {
    let annotation = column.cloned().unwrap_or_default();
    let mut value = SimpleValue::new(table);
    value.set_type_name(annotation.discriminator_type.type_name());
    if let Some(formula) = formula {
        value.add_formula(formula);
        return Ok(value);
    }

    let logical = non_blank(annotation.name.as_deref()).unwrap_or(IMPLICIT_DISCRIMINATOR_COLUMN);
    let physical = physical_column_name(&*meta.options.physical_naming, logical).ok_or_else(|| {
        Error::annotation(format!(
            "Discriminator column of entity '{}' has a blank name",
            entity.class_name
        ))
    })?;
    let mut discriminator = Column::new(physical)
        .with_nullable(false)
        .with_length(annotation.length);
    if let Some(definition) = non_blank(annotation.column_definition.as_deref()) {
        discriminator = discriminator.with_sql_type(definition);
    }
    let target = meta.database.require_table_mut(table)?;
    let id = target.add_column(discriminator);
    if let Some(existing) = target.column_mut(id) {
        existing.set_nullable(false);
    }
    value.add_column(id, true, true)?;
    Ok(value)
}

/// Sets the discriminator value of a bound class.
///
/// An explicit `@DiscriminatorValue` wins. Otherwise the entity name is
/// used, or its string hash for an integer discriminator. A character
/// discriminator needs an explicit value.
///
/// # Errors
///
/// Returns an annotation error when a character discriminator has no
/// explicit value.
pub(super) fn bind_discriminator_value(
    meta: &mut InFlightMetadata,
    class: ClassId,
    entity: &EntityDescriptor,
) -> Result<()> {
    let name = entity.jpa_entity_name();
    let value = match non_blank(entity.discriminator_value.as_deref()) {
        Some(explicit) => explicit.to_string(),
        None => {
            let type_name = meta
                .bindings
                .root_data(class)
                .and_then(|r| r.discriminator.as_ref())
                .and_then(SimpleValue::type_name);
            match type_name {
                Some("character") => {
                    return Err(Error::annotation(format!(
                        "Entity '{name}' has a discriminator of character type and must specify its '@DiscriminatorValue'"
                    )));
                }
                Some("integer") => java_string_hash(name).to_string(),
                _ => name.to_string(),
            }
        }
    };
    meta.bindings.require_mut(class)?.discriminator_value = Some(value);
    Ok(())
}
