//! `@ManyToOne` and `@OneToOne` binding.
//!
//! A many-to-one always owns foreign key columns; their resolution against
//! the target's key is a [`ToOneFkSecondPass`]. A one-to-one is either a
//! true one-to-one (it shares the owner's primary key, or is the inverse side
//! of a `mappedBy`), bound by a [`OneToOneSecondPass`], or it owns foreign
//! key columns and is bound like a many-to-one marked as a logical
//! one-to-one. With `in_second_pass` the deferred work runs immediately.

use ormbind_foundation::names::non_blank;
use ormbind_foundation::{Error, Result};
use ormbind_model::{
    FetchMode, ForeignKeySettings, ManyToOne, NotFoundAction, Property, ToOne, Value,
};

use crate::collector::InFlightMetadata;
use crate::descriptor::{
    FetchType, ForeignKeyAnnotation, LazyToOneOption, OnDeleteAction, PropertyDescriptor,
};
use crate::diagnostics::Anomaly;
use crate::join_column::{AnnotatedJoinColumns, annotations_nullable};
use crate::property_binder::{BoundProperty, PropertyHolder, cascade_strategy, column_table};
use crate::second_pass::{OneToOneSecondPass, SecondPass, ToOneFkSecondPass};

// =============================================================================
// Fetching
// =============================================================================

/// Laziness and fetch mode of a to-one association.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FetchSettings {
    /// Whether the target is loaded on access.
    pub lazy: bool,
    /// Whether no proxy stands in for the target.
    pub unwrap_proxy: bool,
    /// Whether `unwrap_proxy` was derived rather than requested.
    pub unwrap_proxy_implicit: bool,
    /// How the target is fetched.
    pub fetch_mode: FetchMode,
}

impl FetchSettings {
    /// Derives the settings from the association's annotations.
    ///
    /// `@NotFound` forces eager loading. `@LazyToOne` overrides the JPA fetch
    /// type, and `@Fetch` picks the fetch mode, a join fetch also disabling
    /// laziness.
    ///
    /// # Errors
    ///
    /// Returns an annotation error for `@LazyToOne(FALSE)` on a lazy
    /// association and for `@Fetch(SUBSELECT)`, which needs a collection.
    pub fn resolve(descriptor: &PropertyDescriptor, fetch: FetchType, association: &str) -> Result<Self> {
        let mut settings = Self {
            lazy: false,
            unwrap_proxy: false,
            unwrap_proxy_implicit: false,
            fetch_mode: FetchMode::Select,
        };
        if descriptor.not_found.is_some() {
            settings.unwrap_proxy = true;
        } else if let Some(option) = descriptor.lazy_to_one {
            if option == LazyToOneOption::False && fetch == FetchType::Lazy {
                return Err(Error::annotation(format!(
                    "Association '{association}' is marked 'fetch=LAZY' and '@LazyToOne(FALSE)'"
                )));
            }
            settings.lazy = option != LazyToOneOption::False;
            settings.unwrap_proxy = option == LazyToOneOption::NoProxy;
        } else {
            settings.lazy = fetch == FetchType::Lazy;
            settings.unwrap_proxy = fetch != FetchType::Lazy;
            settings.unwrap_proxy_implicit = true;
        }

        match descriptor.fetch {
            Some(FetchMode::Join) => {
                settings.fetch_mode = FetchMode::Join;
                settings.lazy = false;
                settings.unwrap_proxy = false;
            }
            Some(FetchMode::Select) => settings.fetch_mode = FetchMode::Select,
            Some(FetchMode::Subselect) => {
                return Err(Error::annotation(format!(
                    "Association '{association}' is annotated '@Fetch(SUBSELECT)' but is not many-valued"
                )));
            }
            None => {
                settings.fetch_mode = match fetch {
                    FetchType::Eager => FetchMode::Join,
                    FetchType::Lazy => FetchMode::Select,
                };
            }
        }
        Ok(settings)
    }

    /// Copies the settings onto a to-one value.
    pub fn apply(self, value: &mut ToOne) {
        value.set_lazy(self.lazy);
        value.set_unwrap_proxy(self.unwrap_proxy);
        value.set_unwrap_proxy_implicit(self.unwrap_proxy_implicit);
        value.set_fetch_mode(self.fetch_mode);
    }
}

/// Whether an association must reference a row.
///
/// Identifier associations always do, as do `@MapsId` associations that do
/// not ignore missing rows.
#[must_use]
pub fn is_mandatory(optional: bool, descriptor: &PropertyDescriptor) -> bool {
    !optional
        || descriptor.id
        || (descriptor.maps_id.is_some() && descriptor.not_found != Some(NotFoundAction::Ignore))
}

// =============================================================================
// Foreign key naming
// =============================================================================

/// Name, definition, or suppression of an association's foreign key.
///
/// `@NotFound` and a no-constraint mode on the join columns suppress the
/// key. Otherwise the legacy name wins, then the property's `@ForeignKey`,
/// then the one of `@JoinColumns`, then that of the single `@JoinColumn`.
#[must_use]
pub fn foreign_key_settings(descriptor: &PropertyDescriptor, no_constraint_by_default: bool) -> ForeignKeySettings {
    let mut settings = ForeignKeySettings::default();
    if descriptor.not_found.is_some() {
        settings.disable();
        return settings;
    }

    let join_column_fk = descriptor
        .join_column
        .as_ref()
        .map(|c| c.foreign_key.clone().unwrap_or_default());
    let join_columns_fk = (!descriptor.join_columns.is_empty())
        .then(|| descriptor.join_columns_foreign_key.clone().unwrap_or_default());
    let no_constraint = |fk: &Option<ForeignKeyAnnotation>| {
        fk.as_ref().is_some_and(|f| f.is_no_constraint(no_constraint_by_default))
    };
    if no_constraint(&join_column_fk) || no_constraint(&join_columns_fk) {
        settings.disable();
        return settings;
    }

    if let Some(name) = non_blank(descriptor.legacy_foreign_key_name.as_deref()) {
        settings.set_name(Some(name.trim()));
        return settings;
    }
    if no_constraint(&descriptor.foreign_key) {
        settings.disable();
        return settings;
    }
    let chosen = descriptor
        .foreign_key
        .as_ref()
        .or(join_columns_fk.as_ref())
        .or(join_column_fk.as_ref());
    if let Some(fk) = chosen {
        settings.set_name(non_blank(fk.name.as_deref()));
        settings.set_definition(non_blank(fk.definition.as_deref()));
    }
    settings
}

// =============================================================================
// Binding
// =============================================================================

fn join_columns(
    meta: &InFlightMetadata,
    holder: &PropertyHolder,
    descriptor: &PropertyDescriptor,
) -> Result<AnnotatedJoinColumns> {
    let annotations = descriptor.join_column_annotations();
    let table = column_table(
        meta,
        holder,
        &descriptor.name,
        annotations.first().and_then(|a| a.table.as_deref()),
    )?;
    Ok(AnnotatedJoinColumns::from_annotations(
        &annotations,
        &holder.entity_name,
        &holder.property_path(&descriptor.name),
        table,
    ))
}

fn target_entity<'a>(holder: &PropertyHolder, descriptor: &'a PropertyDescriptor) -> Result<&'a str> {
    descriptor.target_entity().ok_or_else(|| {
        Error::annotation(format!(
            "Association '{}' does not name its target entity",
            holder.full_path(&descriptor.name)
        ))
    })
}

/// Column names of the owner's identifier that `@MapsId(maps_id)` shares.
fn maps_id_column_names(meta: &InFlightMetadata, holder: &PropertyHolder, maps_id: &str) -> Vec<String> {
    let Some(identifier) = meta.bindings.identifier(holder.class) else {
        return Vec::new();
    };
    let value = if maps_id.trim().is_empty() {
        Some(identifier)
    } else {
        identifier
            .as_component()
            .and_then(|c| c.property(maps_id.trim()))
            .map(Property::value)
    };
    value
        .map(|v| {
            v.columns()
                .into_iter()
                .filter_map(|id| meta.database.column(id))
                .map(|c| c.name().text().to_string())
                .collect()
        })
        .unwrap_or_default()
}

/// Whether a join column shares its name with an explicitly mapped `@Id`
/// column, making the association a read-only view of the identifier.
fn is_specj_many_to_one(meta: &InFlightMetadata, holder: &PropertyHolder, descriptor: &PropertyDescriptor) -> bool {
    if !meta.options.specj_proprietary_syntax || descriptor.maps_id.is_some() {
        return false;
    }
    let Some(name) = descriptor
        .join_column
        .as_ref()
        .and_then(|c| non_blank(c.name.as_deref()))
    else {
        return false;
    };
    holder.id_column_names.iter().any(|id| id == name.trim())
}

/// Records `@NotFound` on a lazy association, which is loaded eagerly.
fn check_not_found_with_fetch(
    meta: &mut InFlightMetadata,
    holder: &PropertyHolder,
    descriptor: &PropertyDescriptor,
    fetch: FetchType,
) {
    if descriptor.not_found.is_some() && fetch == FetchType::Lazy {
        meta.diagnostics.record(Anomaly::NotFoundWithLazyFetch {
            entity: holder.entity_name.clone(),
            property: holder.property_path(&descriptor.name),
        });
    }
}

/// Binds a `@ManyToOne`.
///
/// # Errors
///
/// Returns an annotation error for invalid fetch settings or an undeclared
/// join column table; with `in_second_pass`, the errors of the foreign key
/// pass.
pub fn bind_many_to_one(
    meta: &mut InFlightMetadata,
    holder: &PropertyHolder,
    descriptor: &PropertyDescriptor,
    in_second_pass: bool,
) -> Result<BoundProperty> {
    let annotation = descriptor.many_to_one.as_ref().ok_or_else(|| {
        Error::assertion_failure(format!(
            "'{}' is not a many-to-one",
            holder.full_path(&descriptor.name)
        ))
    })?;
    check_not_found_with_fetch(meta, holder, descriptor, annotation.fetch);
    let force_persist = descriptor.id || descriptor.maps_id.is_some();
    let association = ForeignKeyAssociation {
        optional: !is_mandatory(annotation.optional, descriptor),
        fetch: annotation.fetch,
        cascade: cascade_strategy(&annotation.cascade, &descriptor.cascade, false, force_persist),
        logical_one_to_one: false,
    };
    bind_foreign_key_association(meta, holder, descriptor, &association, in_second_pass)
}

/// Binds a `@OneToOne`.
///
/// Returns `None` when the property is added by a [`OneToOneSecondPass`].
///
/// # Errors
///
/// As [`bind_many_to_one`].
pub fn bind_one_to_one(
    meta: &mut InFlightMetadata,
    holder: &PropertyHolder,
    descriptor: &PropertyDescriptor,
    in_second_pass: bool,
) -> Result<Option<BoundProperty>> {
    let path = holder.full_path(&descriptor.name);
    let annotation = descriptor
        .one_to_one
        .as_ref()
        .ok_or_else(|| Error::assertion_failure(format!("'{path}' is not a one-to-one")))?;
    check_not_found_with_fetch(meta, holder, descriptor, annotation.fetch);
    let optional = !is_mandatory(annotation.optional, descriptor);
    let force_persist = descriptor.id || descriptor.maps_id.is_some();
    let cascade = cascade_strategy(
        &annotation.cascade,
        &descriptor.cascade,
        annotation.orphan_removal,
        force_persist,
    );
    let mapped_by = non_blank(annotation.mapped_by.as_deref()).map(|m| m.trim().to_string());
    let join_columns = join_columns(meta, holder, descriptor)?.with_mapped_by(mapped_by.as_deref());
    let true_one_to_one = !descriptor.pk_join_columns.is_empty();

    if mapped_by.is_some() || is_map_to_primary_key(meta, holder, &join_columns, true_one_to_one) {
        let fetch = FetchSettings::resolve(descriptor, annotation.fetch, &path)?;
        let pass = OneToOneSecondPass {
            class: holder.class,
            entity_name: holder.entity_name.clone(),
            holder_path: holder.path.clone(),
            property_name: descriptor.name.clone(),
            target_entity: target_entity(holder, descriptor)?.to_string(),
            mapped_by: mapped_by.clone(),
            optional,
            cascade_on_delete: descriptor.on_delete == Some(OnDeleteAction::Cascade),
            cascade: Some(cascade),
            fetch,
            foreign_key: foreign_key_settings(descriptor, meta.options.no_constraint_by_default),
            table: join_columns.table,
            join_columns,
            access: descriptor.access.unwrap_or(holder.access),
            lazy_group: descriptor.lazy_group.clone(),
            optimistic_locked: !descriptor.optimistic_lock_excluded,
        };
        if in_second_pass {
            pass.do_second_pass(meta)?;
        } else {
            meta.add_second_pass_on_top(SecondPass::OneToOne(Box::new(pass)), mapped_by.is_none());
        }
        return Ok(None);
    }

    let association = ForeignKeyAssociation {
        optional,
        fetch: annotation.fetch,
        cascade,
        logical_one_to_one: true,
    };
    bind_foreign_key_association(meta, holder, descriptor, &association, in_second_pass).map(Some)
}

/// Whether a one-to-one joins on the owner's primary key: it says so with
/// `@PrimaryKeyJoinColumn`, or its join columns are exactly the identifier
/// columns.
fn is_map_to_primary_key(
    meta: &InFlightMetadata,
    holder: &PropertyHolder,
    join_columns: &AnnotatedJoinColumns,
    true_one_to_one: bool,
) -> bool {
    if true_one_to_one {
        return true;
    }
    if holder.in_identifier {
        return false;
    }
    let Some(identifier) = meta.bindings.identifier(holder.class) else {
        return false;
    };
    let id_columns = identifier.columns();
    if id_columns.len() != join_columns.columns.len() {
        return false;
    }
    let Some(names) = join_columns.explicit_names() else {
        return false;
    };
    let id_names: Vec<&str> = id_columns
        .iter()
        .filter_map(|id| meta.database.column(*id))
        .map(|c| c.name().text())
        .collect();
    names.iter().all(|n| id_names.contains(&n.trim()))
}

struct ForeignKeyAssociation {
    optional: bool,
    fetch: FetchType,
    cascade: String,
    logical_one_to_one: bool,
}

fn bind_foreign_key_association(
    meta: &mut InFlightMetadata,
    holder: &PropertyHolder,
    descriptor: &PropertyDescriptor,
    association: &ForeignKeyAssociation,
    in_second_pass: bool,
) -> Result<BoundProperty> {
    let path = holder.property_path(&descriptor.name);
    let full_path = holder.full_path(&descriptor.name);
    let target = target_entity(holder, descriptor)?;
    let mut join_columns = join_columns(meta, holder, descriptor)?;

    let mut value = ManyToOne::new(join_columns.table);
    if association.logical_one_to_one {
        value.mark_as_logical_one_to_one();
    }
    value.set_referenced_entity_name(target);
    value.set_type_name(target);
    FetchSettings::resolve(descriptor, association.fetch, &full_path)?.apply(&mut value);
    value.set_not_found_action(descriptor.not_found);
    value.set_cascade_delete(descriptor.on_delete == Some(OnDeleteAction::Cascade));
    *value.foreign_key_mut() = foreign_key_settings(descriptor, meta.options.no_constraint_by_default);

    if !association.optional {
        join_columns.set_mandatory();
    }
    if let Some(maps_id) = &descriptor.maps_id {
        join_columns.set_read_only();
        let names = maps_id_column_names(meta, holder, maps_id);
        if !names.is_empty() {
            join_columns.implicit_names = Some(names);
        }
    }
    let specj = is_specj_many_to_one(meta, holder, descriptor);
    if specj {
        join_columns.set_read_only();
    }
    let (insertable, updatable) = if holder.identifier_mapper || specj {
        (false, false)
    } else {
        (join_columns.first_insertable(), join_columns.first_updatable())
    };

    let table = join_columns.table;
    let pass = ToOneFkSecondPass::new(
        holder.class,
        &holder.entity_name,
        &path,
        target,
        join_columns,
        association.logical_one_to_one,
    );
    let mut value = Value::ManyToOne(value);
    if in_second_pass {
        pass.resolve(meta, &mut value)?;
    } else {
        meta.add_second_pass(SecondPass::ToOneFk(pass));
    }

    let mut property = Property::new(meta.intern(&descriptor.name), value);
    property.set_insertable(insertable);
    property.set_updateable(updatable);
    property.set_cascade(Some(association.cascade.clone()));
    property.set_property_accessor_name(descriptor.access.unwrap_or(holder.access).accessor_name());
    property.set_lazy_group(descriptor.lazy_group.clone());
    property.set_optional(association.optional && annotations_nullable(&descriptor.join_column_annotations()));
    property.set_optimistic_locked(!descriptor.optimistic_lock_excluded);
    property.set_returned_class_name(target);
    tracing::trace!(association = %full_path, target, deferred = !in_second_pass, "bound to-one");
    Ok(BoundProperty {
        property,
        join_table: (table != holder.table).then_some(table),
    })
}
