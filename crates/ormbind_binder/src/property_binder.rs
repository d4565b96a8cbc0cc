//! Binding of single properties.
//!
//! [`bind_property`] dispatches on what a [`PropertyDescriptor`] declares:
//! to-one associations go to [`crate::to_one`], collections and components
//! are handled here, everything else is a basic value. The result is a
//! [`BoundProperty`] the caller adds to its entity, join, or component.

use std::collections::BTreeSet;

use ormbind_foundation::names::{non_blank, qualify};
use ormbind_foundation::{Error, Result};
use ormbind_model::{
    ClassId, Collection, Column, Component, DEFAULT_LENGTH, FetchMode, Property, SimpleValue,
    TableId, Value,
};

use crate::collector::InFlightMetadata;
use crate::descriptor::{
    AccessType, AttributeOverrideAnnotation, CascadeType, ColumnAnnotation, FetchType,
    HibernateCascadeType, MetadataSources, OnDeleteAction, PropertyDescriptor,
};
use crate::inheritance::InheritanceStates;
use crate::naming::{logical_column_name, physical_column_name};
use crate::second_pass::{CollectionSecondPass, SecondPass};
use crate::to_one::{bind_many_to_one, bind_one_to_one, foreign_key_settings};

// =============================================================================
// Context
// =============================================================================

/// Read-only inputs shared by every binder of one build.
#[derive(Clone, Copy, Debug)]
pub struct BindingContext<'a> {
    /// Every annotated class.
    pub sources: &'a MetadataSources,
    /// Resolved inheritance of every entity.
    pub states: &'a InheritanceStates,
}

/// Where bound properties go: an entity, or a component inside one.
#[derive(Clone, Debug)]
pub struct PropertyHolder {
    /// Entity owning the properties.
    pub class: ClassId,
    /// Name of that entity.
    pub entity_name: String,
    /// Component path relative to the entity; `None` for the entity itself.
    pub path: Option<String>,
    /// Primary table of the holder.
    pub table: TableId,
    /// Access type of properties that do not declare one.
    pub access: AccessType,
    /// Columns are nullable whatever their annotation says.
    pub force_nullable: bool,
    /// Properties are part of the identifier.
    pub in_identifier: bool,
    /// Properties belong to the identifier mapper and are read-only.
    pub identifier_mapper: bool,
    /// Column overrides by property name.
    pub overrides: Vec<AttributeOverrideAnnotation>,
    /// Column names of the entity's explicitly mapped `@Id` properties.
    pub id_column_names: Vec<String>,
}

impl PropertyHolder {
    /// A holder for the properties of `entity_name` itself.
    #[must_use]
    pub fn for_entity(class: ClassId, entity_name: &str, table: TableId) -> Self {
        Self {
            class,
            entity_name: entity_name.to_string(),
            path: None,
            table,
            access: AccessType::default(),
            force_nullable: false,
            in_identifier: false,
            identifier_mapper: false,
            overrides: Vec::new(),
            id_column_names: Vec::new(),
        }
    }

    /// Path of `name` relative to the entity.
    #[must_use]
    pub fn property_path(&self, name: &str) -> String {
        match &self.path {
            Some(path) => qualify(path, name),
            None => name.to_string(),
        }
    }

    /// `<entity>.<path>` of `name`.
    #[must_use]
    pub fn full_path(&self, name: &str) -> String {
        qualify(&self.entity_name, &self.property_path(name))
    }

    /// A holder for the properties of the component bound at `name`.
    #[must_use]
    pub fn component(&self, name: &str, overrides: Vec<AttributeOverrideAnnotation>) -> Self {
        Self {
            path: Some(self.property_path(name)),
            overrides,
            ..self.clone()
        }
    }

    fn access_for(&self, descriptor: &PropertyDescriptor) -> AccessType {
        descriptor.access.unwrap_or(self.access)
    }

    fn column_override(&self, name: &str) -> Option<&ColumnAnnotation> {
        self.overrides.iter().find(|o| o.name == name).map(|o| &o.column)
    }
}

/// A property ready to be added to its holder.
#[derive(Clone, Debug)]
pub struct BoundProperty {
    /// The property.
    pub property: Property,
    /// Secondary table the property maps to, if not the holder's table.
    pub join_table: Option<TableId>,
}

impl BoundProperty {
    fn new(property: Property, table: TableId, holder: &PropertyHolder) -> Self {
        Self {
            property,
            join_table: (table != holder.table).then_some(table),
        }
    }
}

// =============================================================================
// Dispatch
// =============================================================================

/// Binds one property of `holder`.
///
/// Returns `None` for a one-to-one whose property is added by its second
/// pass. With `in_second_pass` the association's deferred work runs at once.
///
/// # Errors
///
/// Returns an annotation error for conflicting annotations, an unknown
/// embeddable, or an undeclared secondary table.
pub fn bind_property(
    meta: &mut InFlightMetadata,
    ctx: BindingContext<'_>,
    holder: &PropertyHolder,
    descriptor: &PropertyDescriptor,
    in_second_pass: bool,
) -> Result<Option<BoundProperty>> {
    validate(holder, descriptor)?;
    tracing::trace!(property = %holder.full_path(&descriptor.name), "binding property");
    if descriptor.many_to_one.is_some() {
        bind_many_to_one(meta, holder, descriptor, in_second_pass).map(Some)
    } else if descriptor.one_to_one.is_some() {
        bind_one_to_one(meta, holder, descriptor, in_second_pass)
    } else if descriptor.one_to_many.is_some() {
        bind_one_to_many(meta, holder, descriptor).map(Some)
    } else if descriptor.is_component() {
        bind_component(meta, ctx, holder, descriptor, in_second_pass).map(Some)
    } else {
        bind_basic(meta, holder, descriptor).map(Some)
    }
}

fn validate(holder: &PropertyHolder, descriptor: &PropertyDescriptor) -> Result<()> {
    let path = || holder.full_path(&descriptor.name);
    if descriptor.has_explicit_columns() {
        let kind = if descriptor.many_to_one.is_some() {
            Some("ManyToOne")
        } else if descriptor.one_to_one.is_some() {
            Some("OneToOne")
        } else if descriptor.one_to_many.is_some() {
            Some("OneToMany")
        } else {
            None
        };
        if let Some(kind) = kind {
            return Err(Error::annotation(format!(
                "Property '{}' is a '@{kind}' association and may not use '@Column' to specify column mappings (use '@JoinColumn' instead)",
                path()
            )));
        }
        if descriptor.formula.is_some() {
            return Err(Error::annotation(format!(
                "Property '{}' is annotated both '@Formula' and '@Column'",
                path()
            )));
        }
    }
    if descriptor.many_to_one.is_some() && descriptor.one_to_one.is_some() {
        return Err(Error::annotation(format!(
            "Property '{}' is annotated both '@ManyToOne' and '@OneToOne'",
            path()
        )));
    }
    Ok(())
}

/// Resolves the table named by a column's `table` attribute.
pub(crate) fn column_table(
    meta: &InFlightMetadata,
    holder: &PropertyHolder,
    property: &str,
    table: Option<&str>,
) -> Result<TableId> {
    match non_blank(table) {
        None => Ok(holder.table),
        Some(name) => meta.resolve_table(&holder.entity_name, name).ok_or_else(|| {
            Error::annotation(format!(
                "Secondary table '{}' for property '{}' is not declared",
                name.trim(),
                holder.full_path(property)
            ))
        }),
    }
}

// =============================================================================
// Basic values
// =============================================================================

fn bind_basic(
    meta: &mut InFlightMetadata,
    holder: &PropertyHolder,
    descriptor: &PropertyDescriptor,
) -> Result<BoundProperty> {
    let name = descriptor.name.as_str();
    let annotations: Vec<ColumnAnnotation> = if let Some(column) = holder.column_override(name) {
        vec![column.clone()]
    } else if !descriptor.columns.is_empty() {
        descriptor.columns.clone()
    } else {
        vec![descriptor.column.clone().unwrap_or_default()]
    };
    let table = column_table(
        meta,
        holder,
        name,
        annotations.first().and_then(|c| c.table.as_deref()),
    )?;

    let mut value = SimpleValue::new(table);
    if let Some(type_name) = &descriptor.type_name {
        value.set_type_name(type_name.clone());
    }
    let (mut insertable, mut updatable) = (true, true);
    if let Some(formula) = &descriptor.formula {
        value.add_formula(formula.clone());
        insertable = false;
        updatable = false;
    } else {
        let naming = meta.options.physical_naming.clone();
        for annotation in &annotations {
            let logical = logical_column_name(annotation.name.as_deref(), name);
            let physical = physical_column_name(&*naming, &logical).ok_or_else(|| {
                Error::annotation(format!(
                    "Column of property '{}' has a blank name",
                    holder.full_path(name)
                ))
            })?;
            let nullable = if holder.in_identifier {
                false
            } else {
                holder.force_nullable || annotation.nullable
            };
            let mut column = Column::new(physical)
                .with_nullable(nullable)
                .with_unique(annotation.unique)
                .with_length(annotation.length.unwrap_or(DEFAULT_LENGTH));
            if let Some(precision) = annotation.precision {
                column = column.with_precision(precision, annotation.scale.unwrap_or(0));
            }
            if let Some(definition) = &annotation.column_definition {
                column = column.with_sql_type(definition.clone());
            }
            if let Some(check) = &annotation.check {
                column = column.with_check(check.clone());
            }
            if let Some(default) = &annotation.default_value {
                column = column.with_default(default.clone());
            }
            if let Some(comment) = &annotation.comment {
                column = column.with_comment(comment.clone());
            }
            let target = meta.database.require_table_mut(table)?;
            let id = target.add_column(column);
            if !nullable {
                if let Some(existing) = target.column_mut(id) {
                    existing.set_nullable(false);
                }
            }
            value.add_column(id, annotation.insertable, annotation.updatable)?;
        }
        if let Some(first) = annotations.first() {
            insertable = first.insertable;
            updatable = first.updatable;
        }
    }
    let nullable = value.is_nullable(&meta.database);

    let mut property = Property::new(meta.intern(name), Value::Simple(value));
    if holder.identifier_mapper {
        insertable = false;
        updatable = false;
    }
    property.set_insertable(insertable);
    property.set_updateable(updatable);
    if let Some(natural_id) = descriptor.natural_id {
        property.set_natural_identifier(true);
        if !natural_id.mutable {
            property.set_updateable(false);
        }
    }
    let basic = descriptor.basic.unwrap_or_default();
    property.set_lazy(basic.fetch == FetchType::Lazy);
    property.set_lazy_group(descriptor.lazy_group.clone());
    property.set_lob(descriptor.lob);
    property.set_optional(basic.optional && nullable && !holder.in_identifier);
    property.set_optimistic_locked(!descriptor.optimistic_lock_excluded);
    property.set_property_accessor_name(holder.access_for(descriptor).accessor_name());
    if let Some(type_name) = &descriptor.type_name {
        property.set_returned_class_name(type_name.clone());
    }
    Ok(BoundProperty::new(property, table, holder))
}

// =============================================================================
// Components
// =============================================================================

fn bind_component(
    meta: &mut InFlightMetadata,
    ctx: BindingContext<'_>,
    holder: &PropertyHolder,
    descriptor: &PropertyDescriptor,
    in_second_pass: bool,
) -> Result<BoundProperty> {
    let path = holder.full_path(&descriptor.name);
    let class_name = descriptor.type_name.as_deref().ok_or_else(|| {
        Error::annotation(format!("Embedded property '{path}' does not name its embeddable class"))
    })?;
    let embeddable = ctx.sources.embeddable(class_name).ok_or_else(|| {
        Error::annotation(format!(
            "Property '{path}' refers to '{class_name}' which is not a declared embeddable"
        ))
    })?;

    let mut child = holder.component(&descriptor.name, descriptor.attribute_overrides.clone());
    child.in_identifier |= descriptor.embedded_id;
    child.access = holder.access_for(descriptor);
    let mut component = bind_component_value(
        meta,
        ctx,
        &child,
        &path,
        class_name,
        embeddable.properties.iter(),
        in_second_pass,
    )?;
    component.set_key(descriptor.embedded_id);

    let mut property = Property::new(meta.intern(&descriptor.name), Value::Component(component));
    if holder.identifier_mapper {
        property.set_insertable(false);
        property.set_updateable(false);
    }
    property.set_property_accessor_name(child.access.accessor_name());
    property.set_returned_class_name(class_name);
    property.set_optimistic_locked(!descriptor.optimistic_lock_excluded);
    Ok(BoundProperty::new(property, holder.table, holder))
}

/// Binds `properties` into a component for `child`.
///
/// One-to-ones that bind in a second pass are added by that pass.
pub(crate) fn bind_component_value<'a>(
    meta: &mut InFlightMetadata,
    ctx: BindingContext<'_>,
    child: &PropertyHolder,
    role: &str,
    class_name: &str,
    properties: impl IntoIterator<Item = &'a PropertyDescriptor>,
    in_second_pass: bool,
) -> Result<Component> {
    let mut component = Component::new(child.table, role);
    component.set_component_class_name(class_name);
    for descriptor in properties {
        if let Some(bound) = bind_property(meta, ctx, child, descriptor, in_second_pass)? {
            component.add_property(bound.property);
        }
    }
    Ok(component)
}

// =============================================================================
// Collections
// =============================================================================

fn bind_one_to_many(
    meta: &mut InFlightMetadata,
    holder: &PropertyHolder,
    descriptor: &PropertyDescriptor,
) -> Result<BoundProperty> {
    let role = holder.full_path(&descriptor.name);
    let annotation = descriptor
        .one_to_many
        .as_ref()
        .ok_or_else(|| Error::assertion_failure(format!("'{role}' is not a one-to-many")))?;
    let element = descriptor.target_entity().ok_or_else(|| {
        Error::annotation(format!("Collection '{role}' does not name its element entity"))
    })?;
    let mapped_by = non_blank(annotation.mapped_by.as_deref()).map(str::to_string);

    let mut collection = Collection::new(role.clone(), &holder.entity_name, element, holder.table);
    collection.set_mapped_by(mapped_by.clone());
    let fetch_mode = descriptor.fetch.unwrap_or(match annotation.fetch {
        FetchType::Eager => FetchMode::Join,
        FetchType::Lazy => FetchMode::Select,
    });
    collection.set_fetch_mode(fetch_mode);
    collection.set_lazy(annotation.fetch == FetchType::Lazy && fetch_mode != FetchMode::Join);

    meta.add_second_pass(SecondPass::Collection(Box::new(CollectionSecondPass {
        class: holder.class,
        entity_name: holder.entity_name.clone(),
        path: holder.property_path(&descriptor.name),
        element_entity: element.to_string(),
        mapped_by,
        join_columns: descriptor.join_column_annotations().into_iter().cloned().collect(),
        foreign_key: foreign_key_settings(descriptor, meta.options.no_constraint_by_default),
        cascade_delete: descriptor.on_delete == Some(OnDeleteAction::Cascade),
    })));

    let mut property = Property::new(meta.intern(&descriptor.name), Value::Collection(collection));
    property.set_cascade(Some(cascade_strategy(
        &annotation.cascade,
        &descriptor.cascade,
        annotation.orphan_removal,
        false,
    )));
    property.set_property_accessor_name(holder.access_for(descriptor).accessor_name());
    property.set_optimistic_locked(!descriptor.optimistic_lock_excluded);
    Ok(BoundProperty::new(property, holder.table, holder))
}

// =============================================================================
// Cascades
// =============================================================================

/// Renders the cascade string of an association.
///
/// JPA and native cascade types are merged, orphan removal adds
/// `delete-orphan` and `delete`, and `force_persist` adds `persist`.
/// Returns `"none"` when nothing cascades.
#[must_use]
pub fn cascade_strategy(
    jpa: &[CascadeType],
    native: &[HibernateCascadeType],
    orphan_removal: bool,
    force_persist: bool,
) -> String {
    let mut types: BTreeSet<HibernateCascadeType> =
        jpa.iter().copied().map(HibernateCascadeType::from).collect();
    types.extend(native.iter().copied());
    if orphan_removal {
        types.insert(HibernateCascadeType::DeleteOrphan);
        types.insert(HibernateCascadeType::Remove);
    }
    if force_persist {
        types.insert(HibernateCascadeType::Persist);
    }

    let mut rendered: Vec<&str> = Vec::with_capacity(types.len());
    for cascade in types {
        let name = match cascade {
            HibernateCascadeType::All => "all",
            HibernateCascadeType::Persist => "persist",
            HibernateCascadeType::Merge => "merge",
            HibernateCascadeType::Remove | HibernateCascadeType::Delete => "delete",
            HibernateCascadeType::Refresh => "refresh",
            HibernateCascadeType::SaveUpdate => "save-update",
            HibernateCascadeType::Replicate => "replicate",
            HibernateCascadeType::DeleteOrphan => "delete-orphan",
            HibernateCascadeType::Lock => "lock",
            HibernateCascadeType::Evict | HibernateCascadeType::Detach => "evict",
        };
        if !rendered.contains(&name) {
            rendered.push(name);
        }
    }
    if rendered.is_empty() {
        "none".to_string()
    } else {
        rendered.join(",")
    }
}
