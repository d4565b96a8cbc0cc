//! Identifier binding.
//!
//! A root entity gets one of three identifier shapes:
//!
//! * a single `@Id` or `@EmbeddedId` property, which becomes the identifier
//!   property;
//! * several `@Id` properties, or a single `@Id` association, which are
//!   gathered into a synthetic embedded component named `id`;
//! * an `@IdClass`, which becomes a non-embedded component mirrored by the
//!   read-only `_identifierMapper` component of the entity.

use ormbind_foundation::names::qualify;
use ormbind_foundation::{Error, Result};
use ormbind_model::{
    ClassId, Component, EMBEDDED_ACCESSOR, IDENTIFIER_MAPPER_PROPERTY, Property, RootData, Value,
};

use crate::collector::InFlightMetadata;
use crate::descriptor::{EntityDescriptor, PropertyDescriptor};
use crate::property_binder::{BindingContext, PropertyHolder, bind_component_value, bind_property};

/// Name of the synthetic identifier component.
pub const SYNTHETIC_IDENTIFIER: &str = "id";

/// Binds the identifier of a root entity.
///
/// Returns the names of the elements consumed by the identifier, which the
/// caller must not bind again as ordinary properties.
///
/// # Errors
///
/// Returns an annotation error for an `@IdClass` that does not match the
/// entity's `@Id` properties, or any error binding an identifier property.
pub(super) fn bind_identifier(
    meta: &mut InFlightMetadata,
    ctx: BindingContext<'_>,
    holder: &PropertyHolder,
    entity: &EntityDescriptor,
    elements: &[&PropertyDescriptor],
) -> Result<Vec<String>> {
    let id_properties: Vec<&PropertyDescriptor> =
        elements.iter().copied().filter(|p| p.is_identifier()).collect();

    if let Some((_, id_class)) = ctx.states.class_with_id_class(ctx.sources, &entity.class_name, false) {
        if is_id_class_of_associated_entity(ctx, id_class, &id_properties) {
            tracing::debug!(entity = %entity.class_name, id_class, "id class belongs to the associated entity");
        } else {
            return bind_id_class(meta, ctx, holder, entity, elements, &id_properties, id_class);
        }
    }

    match id_properties.as_slice() {
        [] => Ok(Vec::new()),
        [single] if !single.is_to_one() => {
            bind_simple_identifier(meta, ctx, holder, single)?;
            Ok(vec![single.name.clone()])
        }
        many => {
            bind_synthetic_identifier(meta, ctx, holder, entity, many)?;
            Ok(many.iter().map(|p| p.name.clone()).collect())
        }
    }
}

/// Whether an `@IdClass` is really the identifier class of the entity the
/// single `@Id` association points at, rather than this entity's own.
fn is_id_class_of_associated_entity(
    ctx: BindingContext<'_>,
    id_class: &str,
    id_properties: &[&PropertyDescriptor],
) -> bool {
    let [single] = id_properties else {
        return false;
    };
    let Some(associated) = single.target_entity() else {
        return false;
    };
    if ctx.states.get(associated).is_none() {
        return false;
    }
    match ctx.states.class_with_id_class(ctx.sources, associated, true) {
        None => single.is_to_one(),
        Some((_, associated_id_class)) => associated_id_class == id_class,
    }
}

fn identifier_holder(holder: &PropertyHolder, name: &str) -> PropertyHolder {
    let mut child = holder.component(name, Vec::new());
    child.in_identifier = true;
    child.force_nullable = false;
    child
}

fn root_of(meta: &mut InFlightMetadata, class: ClassId) -> Result<&mut RootData> {
    meta.bindings
        .root_data_mut(class)
        .ok_or_else(|| Error::assertion_failure("identifier bound on a class without a root"))
}

fn bind_simple_identifier(
    meta: &mut InFlightMetadata,
    ctx: BindingContext<'_>,
    holder: &PropertyHolder,
    descriptor: &PropertyDescriptor,
) -> Result<()> {
    let mut id_holder = holder.clone();
    id_holder.in_identifier = true;
    id_holder.force_nullable = false;
    let bound = bind_property(meta, ctx, &id_holder, descriptor, false)?.ok_or_else(|| {
        Error::assertion_failure(format!(
            "identifier '{}' was not bound",
            holder.full_path(&descriptor.name)
        ))
    })?;
    let root = root_of(meta, holder.class)?;
    root.identifier = Some(bound.property.value().clone());
    root.identifier_property = Some(bound.property);
    root.embedded_identifier = false;
    tracing::debug!(entity = %holder.entity_name, property = %descriptor.name, "bound identifier property");
    Ok(())
}

fn bind_synthetic_identifier(
    meta: &mut InFlightMetadata,
    ctx: BindingContext<'_>,
    holder: &PropertyHolder,
    entity: &EntityDescriptor,
    id_properties: &[&PropertyDescriptor],
) -> Result<()> {
    let id_holder = identifier_holder(holder, SYNTHETIC_IDENTIFIER);
    let mut component = bind_component_value(
        meta,
        ctx,
        &id_holder,
        &qualify(&holder.entity_name, SYNTHETIC_IDENTIFIER),
        &entity.class_name,
        id_properties.iter().copied(),
        false,
    )?;
    component.set_key(true);
    component.set_embedded(true);
    let root = root_of(meta, holder.class)?;
    root.identifier = Some(Value::Component(component));
    root.identifier_property = None;
    root.embedded_identifier = true;
    tracing::debug!(entity = %holder.entity_name, parts = id_properties.len(), "bound synthetic identifier");
    Ok(())
}

fn bind_id_class(
    meta: &mut InFlightMetadata,
    ctx: BindingContext<'_>,
    holder: &PropertyHolder,
    entity: &EntityDescriptor,
    elements: &[&PropertyDescriptor],
    id_properties: &[&PropertyDescriptor],
    id_class: &str,
) -> Result<Vec<String>> {
    let declared: Vec<&PropertyDescriptor> = ctx
        .sources
        .embeddable(id_class)
        .map(|c| c.properties.iter().collect())
        .unwrap_or_default();

    let unmatched: Vec<&str> = id_properties
        .iter()
        .map(|p| p.name.as_str())
        .filter(|name| !declared.iter().any(|d| d.name == *name))
        .collect();
    if !unmatched.is_empty() {
        return Err(Error::annotation(format!(
            "Entity '{}' has an '@IdClass' with properties [{}] which do not match properties of the entity class",
            entity.class_name,
            unmatched.join(", ")
        )));
    }

    // The entity's own mapping of an id class property wins over the id class's.
    let mapped: Vec<&PropertyDescriptor> = declared
        .iter()
        .map(|&d| {
            elements
                .iter()
                .copied()
                .find(|e| e.name == d.name)
                .unwrap_or(d)
        })
        .collect();

    let id_holder = identifier_holder(holder, SYNTHETIC_IDENTIFIER);
    let mut component = bind_id_class_component(meta, ctx, &id_holder, SYNTHETIC_IDENTIFIER, id_class, &mapped)?;
    component.set_embedded(false);

    let mut mapper_holder = identifier_holder(holder, IDENTIFIER_MAPPER_PROPERTY);
    mapper_holder.identifier_mapper = true;
    let mapper = bind_id_class_component(
        meta,
        ctx,
        &mapper_holder,
        IDENTIFIER_MAPPER_PROPERTY,
        id_class,
        &mapped,
    )?;
    let mut mapper_property = Property::new(
        meta.intern(IDENTIFIER_MAPPER_PROPERTY),
        Value::Component(mapper),
    );
    mapper_property.set_insertable(false);
    mapper_property.set_updateable(false);
    mapper_property.set_property_accessor_name(EMBEDDED_ACCESSOR);
    meta.bindings.require_mut(holder.class)?.add_property(mapper_property);

    let root = root_of(meta, holder.class)?;
    root.identifier = Some(Value::Component(component));
    root.identifier_property = None;
    root.embedded_identifier = false;
    tracing::debug!(entity = %holder.entity_name, id_class, parts = mapped.len(), "bound id class");

    let mut consumed: Vec<String> = mapped.iter().map(|p| p.name.clone()).collect();
    consumed.extend(id_properties.iter().map(|p| p.name.clone()));
    Ok(consumed)
}

fn bind_id_class_component(
    meta: &mut InFlightMetadata,
    ctx: BindingContext<'_>,
    child: &PropertyHolder,
    name: &str,
    id_class: &str,
    properties: &[&PropertyDescriptor],
) -> Result<Component> {
    let mut component = bind_component_value(
        meta,
        ctx,
        child,
        &qualify(&child.entity_name, name),
        id_class,
        properties.iter().copied(),
        false,
    )?;
    component.set_key(true);
    Ok(component)
}
