//! Entity binding.
//!
//! [`bind_entity`] turns one [`EntityDescriptor`] into a registered
//! [`PersistentClass`]: it binds the entity's tables, its place in the
//! inheritance hierarchy, its class-level options, its identifier and its
//! properties, and queues the second passes that need other entities.
//! Entities must be bound parents first; see
//! [`InheritanceStates::ordered`](crate::inheritance::InheritanceStates::ordered).

pub mod cache;
mod discriminator;
pub mod identifier;
mod tables;

use std::collections::BTreeMap;

use ormbind_foundation::names::non_blank;
use ormbind_foundation::{Error, ErrorContext, Result};
use ormbind_model::{
    CallbackDefinition, ClassId, ClassKind, ColumnId, DependantValue, FilterConfig,
    ForeignKeySettings, OptimisticLockStyle, PersistentClass, TableId, Value, constraint,
};

use crate::collector::{EntityTableXref, InFlightMetadata};
use crate::descriptor::{
    EntityDescriptor, InheritanceType, OnDeleteAction, OptimisticLockType, PolymorphismType,
    PropertyDescriptor,
};
use crate::diagnostics::Anomaly;
use crate::inheritance::InheritanceState;
use crate::join_column::AnnotatedJoinColumns;
use crate::naming::physical_table_name;
use crate::property_binder::{BindingContext, PropertyHolder, bind_property};
use crate::second_pass::{CreateKeySecondPass, JoinedSubclassFkSecondPass, SecondPass};

use tables::PrimaryTable;

// =============================================================================
// Entry point
// =============================================================================

/// Binds `entity` and registers it with `meta`.
///
/// The entity's superclass, if any, must already be bound.
///
/// # Errors
///
/// Returns an annotation or mapping error for an invalid mapping, with the
/// entity recorded in the error context.
pub fn bind_entity(
    meta: &mut InFlightMetadata,
    ctx: BindingContext<'_>,
    entity: &EntityDescriptor,
) -> Result<ClassId> {
    bind_entity_inner(meta, ctx, entity).map_err(|e| {
        e.with_context(ErrorContext::new().with_entity(entity.class_name.clone()))
    })
}

fn bind_entity_inner(
    meta: &mut InFlightMetadata,
    ctx: BindingContext<'_>,
    entity: &EntityDescriptor,
) -> Result<ClassId> {
    let entity_name = entity.class_name.as_str();
    let state = ctx.states.get(entity_name).ok_or_else(|| {
        Error::assertion_failure(format!("no inheritance state for entity '{entity_name}'"))
    })?;
    let span = tracing::debug_span!("bind_entity", entity = entity_name);
    let _guard = span.enter();

    let parent = match state.super_entity.as_deref() {
        Some(super_entity) => {
            let super_class = meta.entity_binding(super_entity).ok_or_else(|| {
                Error::assertion_failure(format!(
                    "superclass '{super_entity}' of '{entity_name}' is not bound yet"
                ))
            })?;
            Some((super_class, super_entity))
        }
        None => None,
    };

    let primary = tables::bind_primary_table(meta, entity, state, parent)?;
    let mut class = new_class(meta, entity, state, parent, primary.table);
    bind_class_options(meta, ctx, &mut class, entity)?;
    tables::apply_entity_custom_sql(&mut class, entity, &primary.logical_name)?;

    let class_id = meta.add_entity_binding(class)?;
    if let Some((super_class, _)) = parent {
        meta.bindings.link_subclass(super_class, class_id);
    }
    meta.add_entity_table_xref(
        entity_name,
        EntityTableXref::new(
            primary.table,
            primary.logical_name.clone(),
            state.super_entity.clone(),
        ),
    );
    register_imports(meta, entity_name, entity.jpa_entity_name())?;

    tables::apply_primary_table_options(meta, entity, state, &primary)?;
    tables::bind_secondary_tables(meta, class_id, entity, &primary)?;
    discriminator::bind_discriminator(meta, class_id, entity, state, primary.table)?;
    match parent {
        None => bind_root_options(meta, class_id, entity)?,
        Some((super_class, super_entity)) => {
            bind_subclass_options(meta, class_id, super_class, entity, state)?;
            if state.is_joined_subclass() {
                let join_columns = AnnotatedJoinColumns::from_primary_key_annotations(
                    &entity.pk_join_columns,
                    entity_name,
                    "",
                    primary.table,
                );
                meta.add_second_pass(SecondPass::JoinedSubclassFk(
                    JoinedSubclassFkSecondPass::new(class_id, entity_name, super_entity, join_columns),
                ));
            }
        }
    }

    let holder = entity_holder(meta, class_id, entity, state, &primary);
    let elements = ctx.states.elements_to_process(ctx.sources, entity);
    let consumed = if parent.is_none() {
        identifier::bind_identifier(meta, ctx, &holder, entity, &elements)?
    } else {
        reject_subclass_identifier(entity, &elements)?;
        Vec::new()
    };
    if parent.is_none() || state.is_joined_subclass() {
        meta.add_second_pass(SecondPass::CreateKey(CreateKeySecondPass::new(
            class_id,
            entity_name,
        )));
    }

    bind_properties(meta, ctx, &holder, entity, &elements, &consumed)?;
    bind_natural_id_unique_keys(meta, class_id)?;
    queue_embeddable_callbacks(meta, ctx, class_id, entity, &elements, &consumed);
    discriminator::bind_discriminator_value(meta, class_id, entity)?;

    tracing::debug!(
        entity = entity_name,
        jpa_name = entity.jpa_entity_name(),
        strategy = ?state.strategy,
        root = parent.is_none(),
        "bound entity"
    );
    Ok(class_id)
}

// =============================================================================
// Class
// =============================================================================

fn new_class(
    meta: &InFlightMetadata,
    entity: &EntityDescriptor,
    state: &InheritanceState,
    parent: Option<(ClassId, &str)>,
    table: TableId,
) -> PersistentClass {
    let Some((super_class, super_entity)) = parent else {
        return PersistentClass::root(&entity.class_name, table);
    };
    let kind = match state.strategy {
        InheritanceType::SingleTable => ClassKind::SingleTable,
        InheritanceType::TablePerClass => ClassKind::Union,
        InheritanceType::Joined => {
            let mut key = DependantValue::new(table, super_entity);
            key.set_key_nullable(false);
            *key.foreign_key_mut() = joined_foreign_key(entity, meta.options.no_constraint_by_default);
            key.set_cascade_delete(entity.on_delete == Some(OnDeleteAction::Cascade));
            ClassKind::Joined { key: Some(key) }
        }
    };
    PersistentClass::subclass(kind, &entity.class_name, table, super_class)
}

/// Foreign key of a joined subclass's key.
///
/// A legacy name wins, then `@PrimaryKeyJoinColumns(foreignKey)`, then the
/// `foreignKey` of a single `@PrimaryKeyJoinColumn`.
fn joined_foreign_key(
    entity: &EntityDescriptor,
    no_constraint_by_default: bool,
) -> ForeignKeySettings {
    if let Some(name) = entity
        .foreign_key
        .as_ref()
        .and_then(|fk| non_blank(fk.name.as_deref()))
    {
        let mut settings = ForeignKeySettings::default();
        settings.set_name(Some(name));
        return settings;
    }
    let annotation = entity.pk_join_columns_foreign_key.as_ref().or_else(|| {
        match entity.pk_join_columns.as_slice() {
            [single] => single.foreign_key.as_ref(),
            _ => None,
        }
    });
    tables::annotated_foreign_key(annotation, no_constraint_by_default)
}

fn bind_class_options(
    meta: &InFlightMetadata,
    ctx: BindingContext<'_>,
    class: &mut PersistentClass,
    entity: &EntityDescriptor,
) -> Result<()> {
    class.jpa_entity_name = entity.jpa_entity_name().to_string();
    class.class_name.clone_from(&entity.class_name);
    class.is_abstract = Some(entity.is_abstract);
    class.dynamic_insert = entity.row_management.dynamic_insert;
    class.dynamic_update = entity.row_management.dynamic_update;
    class.select_before_update = entity.row_management.select_before_update;
    class.batch_size = entity.batch_size.unwrap_or(-1);
    class.optimistic_lock_style = match entity.optimistic_lock.unwrap_or_default() {
        OptimisticLockType::None => OptimisticLockStyle::None,
        OptimisticLockType::Version => OptimisticLockStyle::Version,
        OptimisticLockType::Dirty => OptimisticLockStyle::Dirty,
        OptimisticLockType::All => OptimisticLockStyle::All,
    };

    match &entity.proxy {
        None => {
            class.lazy = true;
            class.proxy_interface_name = Some(entity.class_name.clone());
        }
        Some(proxy) => {
            class.lazy = proxy.lazy;
            class.proxy_interface_name = if proxy.lazy {
                Some(
                    non_blank(proxy.proxy_class.as_deref())
                        .unwrap_or(&entity.class_name)
                        .to_string(),
                )
            } else {
                None
            };
        }
    }

    class.loader_name = non_blank(entity.loader.as_deref()).map(str::to_string);
    class.synchronized_tables = entity
        .synchronize
        .iter()
        .filter_map(|t| physical_table_name(&*meta.options.physical_naming, t))
        .map(|t| t.to_string())
        .collect();
    class.filters = bind_filters(meta, ctx, entity)?;
    class.callback_definitions = callbacks(ctx, entity);
    Ok(())
}

/// Filters of the entity followed by those of its mapped superclasses.
fn bind_filters(
    meta: &InFlightMetadata,
    ctx: BindingContext<'_>,
    entity: &EntityDescriptor,
) -> Result<Vec<FilterConfig>> {
    let mapped = ctx.states.mapped_superclasses(ctx.sources, &entity.class_name);
    let annotations = entity
        .filters
        .iter()
        .chain(mapped.iter().flat_map(|m| m.filters.iter()));
    let mut filters = Vec::new();
    for filter in annotations {
        let name = filter.name.trim();
        let definition = meta.filter_definition(name).ok_or_else(|| {
            Error::annotation(format!(
                "Entity '{}' has a '@Filter' for an undefined filter named '{name}'",
                entity.class_name
            ))
        })?;
        let condition = non_blank(filter.condition.as_deref())
            .or_else(|| non_blank(definition.default_condition.as_deref()))
            .ok_or_else(|| {
                Error::annotation(format!(
                    "Entity '{}' has a '@Filter' with no 'condition' and no default condition was given by the '@FilterDef' named '{name}'",
                    entity.class_name
                ))
            })?;
        filters.push(FilterConfig {
            name: name.to_string(),
            condition: condition.to_string(),
            auto_alias_injection: filter.deduce_alias_injection_points,
            alias_tables: filter
                .aliases
                .iter()
                .filter_map(|a| Some((a.alias.clone(), non_blank(a.table.as_deref())?.to_string())))
                .collect(),
            alias_entities: filter
                .aliases
                .iter()
                .filter_map(|a| Some((a.alias.clone(), non_blank(a.entity.as_deref())?.to_string())))
                .collect(),
        });
    }
    Ok(filters)
}

/// Callbacks of the outermost mapped superclass first, the entity's last.
fn callbacks(ctx: BindingContext<'_>, entity: &EntityDescriptor) -> Vec<CallbackDefinition> {
    let mapped = ctx.states.mapped_superclasses(ctx.sources, &entity.class_name);
    mapped
        .iter()
        .rev()
        .flat_map(|m| m.callbacks.iter().cloned())
        .chain(entity.callbacks.iter().cloned())
        .collect()
}

fn register_imports(meta: &mut InFlightMetadata, entity_name: &str, jpa_name: &str) -> Result<()> {
    meta.add_import(jpa_name, entity_name)
        .map_err(|_| Error::duplicate_entity_name(jpa_name))?;
    if entity_name != jpa_name {
        meta.add_import(entity_name, entity_name)
            .map_err(|_| Error::duplicate_entity_name(entity_name))?;
    }
    Ok(())
}

// =============================================================================
// Hierarchy options
// =============================================================================

fn bind_root_options(meta: &mut InFlightMetadata, class: ClassId, entity: &EntityDescriptor) -> Result<()> {
    let settings = cache::root_cache_settings(entity, &meta.options)?;
    let natural_id_region = cache::natural_id_cache_region(entity);

    let bound = meta.bindings.require_mut(class)?;
    bound.cached = settings.cached;
    let root = bound.root_data_mut().ok_or_else(|| {
        Error::assertion_failure(format!("'{}' is not a hierarchy root", entity.class_name))
    })?;
    root.cache_concurrency_strategy = settings.strategy;
    root.cache_region_name = Some(settings.region);
    root.lazy_properties_cacheable = settings.lazy_properties_cacheable;
    root.natural_id_cache_region_name = natural_id_region;
    root.mutable = !entity.immutable;
    root.explicit_polymorphism = entity.polymorphism == Some(PolymorphismType::Explicit);
    root.where_clause = non_blank(entity.where_clause.as_deref()).map(|w| w.trim().to_string());
    Ok(())
}

fn bind_subclass_options(
    meta: &mut InFlightMetadata,
    class: ClassId,
    super_class: ClassId,
    entity: &EntityDescriptor,
    state: &InheritanceState,
) -> Result<()> {
    let super_cached = meta.bindings.require(super_class)?.cached;
    let cached = cache::subclass_cached(entity, &meta.options, super_cached, &mut meta.diagnostics);
    meta.bindings.require_mut(class)?.cached = cached;

    let anomaly_entity = || entity.class_name.clone();
    if entity.immutable {
        meta.diagnostics.record(Anomaly::ImmutableOnSubclass { entity: anomaly_entity() });
    }
    if !state.is_joined_subclass() {
        if !entity.pk_join_columns.is_empty() {
            meta.diagnostics.record(Anomaly::PrimaryKeyJoinColumnOnNonJoinedSubclass {
                entity: anomaly_entity(),
            });
        }
        if entity.on_delete.is_some() {
            meta.diagnostics.record(Anomaly::OnDeleteOnNonJoinedSubclass { entity: anomaly_entity() });
        }
    }
    if !entity.attribute_overrides.is_empty() {
        meta.diagnostics.record(Anomaly::AttributeOverrideWithEntityInheritance {
            entity: anomaly_entity(),
        });
    }
    Ok(())
}

// =============================================================================
// Properties
// =============================================================================

fn entity_holder(
    meta: &InFlightMetadata,
    class: ClassId,
    entity: &EntityDescriptor,
    state: &InheritanceState,
    primary: &PrimaryTable,
) -> PropertyHolder {
    let mut holder = PropertyHolder::for_entity(class, &entity.class_name, primary.table);
    holder.access = entity.access.unwrap_or_default();
    holder.force_nullable = state.has_parents() && state.strategy == InheritanceType::SingleTable;
    holder.overrides.clone_from(&entity.attribute_overrides);
    if meta.options.specj_proprietary_syntax {
        holder.id_column_names = entity
            .properties
            .iter()
            .filter(|p| p.id)
            .filter_map(|p| p.column.as_ref().and_then(|c| non_blank(c.name.as_deref())))
            .map(str::to_string)
            .collect();
    }
    holder
}

fn reject_subclass_identifier(entity: &EntityDescriptor, elements: &[&PropertyDescriptor]) -> Result<()> {
    match elements.iter().find(|p| p.is_identifier()) {
        Some(property) => Err(Error::annotation(format!(
            "Entity '{}' is a subclass in an entity inheritance hierarchy and may not redefine the identifier of the root entity (property '{}' is annotated '@Id')",
            entity.class_name, property.name
        ))),
        None => Ok(()),
    }
}

fn bind_properties(
    meta: &mut InFlightMetadata,
    ctx: BindingContext<'_>,
    holder: &PropertyHolder,
    entity: &EntityDescriptor,
    elements: &[&PropertyDescriptor],
    consumed: &[String],
) -> Result<()> {
    let class = holder.class;
    for &descriptor in elements {
        if consumed.contains(&descriptor.name) {
            continue;
        }
        let name = descriptor.name.as_str();
        if !meta.bindings.require(class)?.is_root() {
            if meta.bindings.is_property_defined_in_super_hierarchy(class, name) {
                return Err(Error::annotation(format!(
                    "Property '{name}' of entity '{}' is already mapped by a superclass",
                    entity.class_name
                )));
            }
            let in_composite_id = meta
                .bindings
                .identifier(class)
                .and_then(Value::as_component)
                .is_some_and(|c| c.has_property(name));
            if in_composite_id {
                return Err(Error::annotation(format!(
                    "Property '{name}' of entity '{}' belongs to the composite identifier of its root entity and may not be redeclared",
                    entity.class_name
                )));
            }
        }

        let Some(bound) = bind_property(meta, ctx, holder, descriptor, false)? else {
            continue;
        };
        if descriptor.version {
            let version = bound.property.name().clone();
            meta.bindings
                .root_data_mut(class)
                .ok_or_else(|| Error::assertion_failure("version bound on a class without a root"))?
                .version = Some(version);
        }
        let target = meta.bindings.require_mut(class)?;
        match bound.join_table {
            None => target.add_property(bound.property),
            Some(table) => target
                .join_for_table_mut(table)
                .ok_or_else(|| {
                    Error::annotation(format!(
                        "Property '{name}' of entity '{}' maps to a secondary table declared by another entity",
                        entity.class_name
                    ))
                })?
                .add_property(bound.property),
        }
    }
    Ok(())
}

/// One unique key per table over the columns of the natural-id properties.
fn bind_natural_id_unique_keys(meta: &mut InFlightMetadata, class: ClassId) -> Result<()> {
    let bound = meta.bindings.require(class)?;
    let mut by_table: BTreeMap<TableId, Vec<ColumnId>> = BTreeMap::new();
    let natural_ids = bound
        .properties()
        .iter()
        .chain(bound.joins().iter().flat_map(|j| j.properties().iter()))
        .filter(|p| p.is_natural_identifier());
    for property in natural_ids {
        by_table
            .entry(property.value().table())
            .or_default()
            .extend(property.value().columns());
    }
    for (table_id, columns) in by_table {
        if columns.is_empty() {
            continue;
        }
        let table = meta.database.require_table_mut(table_id)?;
        let name = constraint::generate_name("UK_", &format!("{}_NaturalID", table.name().text()), &[]);
        let key = table.get_or_create_unique_key(&name);
        for column in columns {
            key.add_column(column);
        }
        tracing::debug!(table = %table.name(), key = %name, "natural id unique key");
    }
    Ok(())
}

/// Callbacks of embeddable classes go to the component properties once the
/// whole model is bound.
fn queue_embeddable_callbacks(
    meta: &mut InFlightMetadata,
    ctx: BindingContext<'_>,
    class: ClassId,
    entity: &EntityDescriptor,
    elements: &[&PropertyDescriptor],
    consumed: &[String],
) {
    let callbacks: Vec<(String, Vec<CallbackDefinition>)> = elements
        .iter()
        .filter(|p| p.is_component() && !consumed.contains(&p.name))
        .filter_map(|p| {
            let embeddable = ctx.sources.embeddable(p.type_name.as_deref()?)?;
            (!embeddable.callbacks.is_empty()).then(|| (p.name.clone(), embeddable.callbacks.clone()))
        })
        .collect();
    if callbacks.is_empty() {
        return;
    }
    meta.add_second_pass(SecondPass::deferred(
        format!("embeddable callbacks of {}", entity.class_name),
        move |meta| {
            let bound = meta.bindings.require_mut(class)?;
            for (name, definitions) in callbacks {
                if let Some(property) = bound.property_mut(&name) {
                    property.add_callback_definitions(definitions);
                }
            }
            Ok(())
        },
    ));
}
