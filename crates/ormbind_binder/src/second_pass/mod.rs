//! Deferred resolution.
//!
//! First passes bind what each class declares on its own and queue a
//! [`SecondPass`] for everything that depends on other classes. Once every
//! entity is registered, the collector is frozen and [`process_second_passes`]
//! drains the queue in stages:
//!
//! 1. foreign keys that are part of a primary key, ordered so the referenced
//!    table's key is complete before it is copied;
//! 2. primary keys;
//! 3. the remaining foreign keys, retried in rounds while they make progress;
//! 4. secondary table joins;
//! 5. everything else, in queue order.
//!
//! Property references recorded along the way are resolved last.

mod collection;
mod fk;
mod keys;
mod one_to_one;

pub use collection::CollectionSecondPass;
pub use fk::{JoinedSubclassFkSecondPass, ToOneFkSecondPass};
pub use keys::{CreateKeySecondPass, NullableDiscriminatorSecondPass, SecondaryTableSecondPass};
pub use one_to_one::OneToOneSecondPass;

use std::fmt;

use ormbind_foundation::{Error, ErrorContext, Result};
use ormbind_model::{EntityBindings, TableId};

use crate::collector::InFlightMetadata;

/// A task run after every entity has been bound.
pub enum SecondPass {
    /// Foreign key of a to-one association.
    ToOneFk(ToOneFkSecondPass),
    /// Key of a joined subclass referencing its parent.
    JoinedSubclassFk(JoinedSubclassFkSecondPass),
    /// Primary key of an entity table.
    CreateKey(CreateKeySecondPass),
    /// Key, primary key and foreign key of a secondary table.
    SecondaryTable(SecondaryTableSecondPass),
    /// A primary-key or inverse one-to-one.
    OneToOne(Box<OneToOneSecondPass>),
    /// Key of a one-to-many collection.
    Collection(Box<CollectionSecondPass>),
    /// Makes a discriminator nullable when `null` is a discriminator value.
    NullableDiscriminator(NullableDiscriminatorSecondPass),
    /// Arbitrary deferred work.
    Deferred {
        /// Shown in logs and error context.
        description: String,
        /// The work.
        task: Box<dyn FnOnce(&mut InFlightMetadata) -> Result<()>>,
    },
}

impl fmt::Debug for SecondPass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ToOneFk(p) => f.debug_tuple("ToOneFk").field(p).finish(),
            Self::JoinedSubclassFk(p) => f.debug_tuple("JoinedSubclassFk").field(p).finish(),
            Self::CreateKey(p) => f.debug_tuple("CreateKey").field(p).finish(),
            Self::SecondaryTable(p) => f.debug_tuple("SecondaryTable").field(p).finish(),
            Self::OneToOne(p) => f.debug_tuple("OneToOne").field(p).finish(),
            Self::Collection(p) => f.debug_tuple("Collection").field(p).finish(),
            Self::NullableDiscriminator(p) => {
                f.debug_tuple("NullableDiscriminator").field(p).finish()
            }
            Self::Deferred { description, .. } => f
                .debug_struct("Deferred")
                .field("description", description)
                .finish_non_exhaustive(),
        }
    }
}

/// Drain stage of a second pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    /// Foreign keys whose columns belong to a primary key.
    InPrimaryKeyForeignKey,
    /// Primary keys.
    CreateKey,
    /// Other foreign keys.
    ForeignKey,
    /// Secondary table joins.
    SecondaryTable,
    /// Everything else.
    General,
}

impl SecondPass {
    /// A deferred closure.
    pub fn deferred(
        description: impl Into<String>,
        task: impl FnOnce(&mut InFlightMetadata) -> Result<()> + 'static,
    ) -> Self {
        Self::Deferred {
            description: description.into(),
            task: Box::new(task),
        }
    }

    /// Short description for logs and error context.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::ToOneFk(p) => format!("foreign key of {}", p.association_path()),
            Self::JoinedSubclassFk(p) => format!("joined subclass key of {}", p.entity_name()),
            Self::CreateKey(p) => format!("primary key of {}", p.entity_name()),
            Self::SecondaryTable(p) => format!("secondary table of {}", p.entity_name()),
            Self::OneToOne(p) => format!("one-to-one {}", p.association_path()),
            Self::Collection(p) => format!("collection {}", p.role()),
            Self::NullableDiscriminator(p) => {
                format!("discriminator nullability of {}", p.entity_name())
            }
            Self::Deferred { description, .. } => description.clone(),
        }
    }

    /// Stage the pass runs in, given the entities bound so far.
    #[must_use]
    pub fn stage(&self, bindings: &EntityBindings) -> Stage {
        match self {
            Self::ToOneFk(p) if p.is_in_primary_key(bindings) => Stage::InPrimaryKeyForeignKey,
            Self::ToOneFk(_) => Stage::ForeignKey,
            Self::JoinedSubclassFk(_) => Stage::InPrimaryKeyForeignKey,
            Self::CreateKey(_) => Stage::CreateKey,
            Self::SecondaryTable(_) => Stage::SecondaryTable,
            Self::OneToOne(_)
            | Self::Collection(_)
            | Self::NullableDiscriminator(_)
            | Self::Deferred { .. } => Stage::General,
        }
    }

    fn referenced_entity_name(&self) -> Option<&str> {
        match self {
            Self::ToOneFk(p) => Some(p.referenced_entity_name()),
            Self::JoinedSubclassFk(p) => Some(p.referenced_entity_name()),
            _ => None,
        }
    }

    fn association_path(&self) -> String {
        match self {
            Self::ToOneFk(p) => p.association_path(),
            Self::JoinedSubclassFk(p) => p.entity_name().to_string(),
            other => other.describe(),
        }
    }

    fn value_table(&self) -> Option<TableId> {
        match self {
            Self::ToOneFk(p) => Some(p.value_table()),
            Self::JoinedSubclassFk(p) => Some(p.value_table()),
            _ => None,
        }
    }

    fn context(&self) -> ErrorContext {
        ErrorContext::new().with_pass(self.describe())
    }

    /// Runs a foreign key pass; it may be retried after a recoverable error.
    fn run_foreign_key(&self, meta: &mut InFlightMetadata) -> Result<()> {
        match self {
            Self::ToOneFk(p) => p.do_second_pass(meta),
            Self::JoinedSubclassFk(p) => p.do_second_pass(meta),
            other => Err(Error::assertion_failure(format!(
                "not a foreign key pass: {}",
                other.describe()
            ))),
        }
    }

    /// Runs the pass once.
    ///
    /// # Errors
    ///
    /// Returns whatever error the pass raises.
    pub fn run(self, meta: &mut InFlightMetadata) -> Result<()> {
        match self {
            Self::ToOneFk(p) => p.do_second_pass(meta),
            Self::JoinedSubclassFk(p) => p.do_second_pass(meta),
            Self::CreateKey(p) => p.do_second_pass(meta),
            Self::SecondaryTable(p) => p.do_second_pass(meta),
            Self::OneToOne(p) => p.do_second_pass(meta),
            Self::Collection(p) => p.do_second_pass(meta),
            Self::NullableDiscriminator(p) => p.do_second_pass(meta),
            Self::Deferred { task, .. } => task(meta),
        }
    }
}

// =============================================================================
// Draining
// =============================================================================

/// Freezes the collector and runs every queued second pass.
///
/// # Errors
///
/// Returns the first error raised. A recoverable error that never resolved
/// is reported as its cause.
pub fn process_second_passes(meta: &mut InFlightMetadata) -> Result<()> {
    meta.freeze();
    drain(meta).map_err(Error::into_cause)?;
    process_property_references(meta)
}

fn drain(meta: &mut InFlightMetadata) -> Result<()> {
    while meta.pending_second_passes() > 0 {
        let mut in_primary_key = Vec::new();
        let mut create_key = Vec::new();
        let mut foreign_key = Vec::new();
        let mut secondary_table = Vec::new();
        let mut general = Vec::new();
        for pass in meta.take_second_passes() {
            match pass.stage(&meta.bindings) {
                Stage::InPrimaryKeyForeignKey => in_primary_key.push(pass),
                Stage::CreateKey => create_key.push(pass),
                Stage::ForeignKey => foreign_key.push(pass),
                Stage::SecondaryTable => secondary_table.push(pass),
                Stage::General => general.push(pass),
            }
        }

        tracing::trace!(count = in_primary_key.len(), "stage: primary key foreign keys");
        for pass in order_by_table_dependency(meta, in_primary_key)? {
            let context = pass.context();
            pass.run(meta).map_err(|e| e.with_context(context))?;
        }

        tracing::trace!(count = create_key.len(), "stage: primary keys");
        run_all(meta, create_key)?;

        tracing::trace!(count = foreign_key.len(), "stage: foreign keys");
        run_foreign_key_rounds(meta, foreign_key)?;

        tracing::trace!(count = secondary_table.len(), "stage: secondary tables");
        run_all(meta, secondary_table)?;

        tracing::trace!(count = general.len(), "stage: general");
        run_all(meta, general)?;
    }
    Ok(())
}

fn run_all(meta: &mut InFlightMetadata, passes: Vec<SecondPass>) -> Result<()> {
    for pass in passes {
        let context = pass.context();
        pass.run(meta).map_err(|e| e.with_context(context))?;
    }
    Ok(())
}

fn table_name(meta: &InFlightMetadata, table: TableId) -> Result<String> {
    Ok(meta.database.require_table(table)?.qualified_name().to_string())
}

/// Orders foreign key passes so that a pass copying a key runs after every
/// pass completing that key.
///
/// Passes are grouped by the table they reference. Starting from each
/// referenced table, the passes of tables depending on it are visited
/// recursively and prepended, so the deepest dependents end up last.
fn order_by_table_dependency(
    meta: &InFlightMetadata,
    passes: Vec<SecondPass>,
) -> Result<Vec<SecondPass>> {
    let mut dependencies: Vec<(String, Vec<usize>)> = Vec::new();
    let mut dependent_tables = Vec::with_capacity(passes.len());
    for (index, pass) in passes.iter().enumerate() {
        let referenced = pass.referenced_entity_name().unwrap_or_default();
        let target = meta
            .entity_binding(referenced)
            .ok_or_else(|| Error::unknown_entity(pass.association_path(), referenced))?;
        let referenced_table = table_name(meta, meta.bindings.require(target)?.table())?;
        let dependent = match pass.value_table() {
            Some(table) => table_name(meta, table)?,
            None => String::new(),
        };
        dependent_tables.push(dependent);
        match dependencies.iter_mut().find(|(t, _)| *t == referenced_table) {
            Some((_, list)) => list.push(index),
            None => dependencies.push((referenced_table, vec![index])),
        }
    }

    let mut ordered = Vec::with_capacity(passes.len());
    for (start, _) in &dependencies {
        visit_dependents(&dependencies, &dependent_tables, start, start, 0, &mut ordered)?;
    }

    let mut slots: Vec<Option<SecondPass>> = passes.into_iter().map(Some).collect();
    Ok(ordered
        .into_iter()
        .filter_map(|index| slots.get_mut(index).and_then(Option::take))
        .collect())
}

fn visit_dependents(
    dependencies: &[(String, Vec<usize>)],
    dependent_tables: &[String],
    start: &str,
    current: &str,
    depth: usize,
    ordered: &mut Vec<usize>,
) -> Result<()> {
    let Some((_, list)) = dependencies.iter().find(|(t, _)| t == current) else {
        return Ok(());
    };
    for &index in list {
        let dependent = &dependent_tables[index];
        if dependent == start || depth > dependent_tables.len() {
            return Err(Error::annotation(format!(
                "Foreign key circularity dependency involving the following tables: '{start}', '{dependent}'"
            )));
        }
        visit_dependents(dependencies, dependent_tables, start, dependent, depth + 1, ordered)?;
        if !ordered.contains(&index) {
            ordered.insert(0, index);
        }
    }
    Ok(())
}

/// Runs foreign key passes in rounds until none fails or a round makes no
/// progress; then the first recoverable error is raised.
fn run_foreign_key_rounds(meta: &mut InFlightMetadata, passes: Vec<SecondPass>) -> Result<()> {
    let mut pending = passes;
    let mut first_error: Option<Error> = None;
    loop {
        let attempted = pending.len();
        let mut failed = Vec::new();
        for pass in pending {
            match pass.run_foreign_key(meta) {
                Ok(()) => {}
                Err(error) if error.is_recoverable() => {
                    tracing::trace!(pass = %pass.describe(), %error, "deferring foreign key");
                    if first_error.is_none() {
                        first_error = Some(error.with_context(pass.context()));
                    }
                    failed.push(pass);
                }
                Err(error) => return Err(error.with_context(pass.context())),
            }
        }
        if failed.is_empty() {
            return Ok(());
        }
        if failed.len() == attempted {
            return Err(first_error
                .unwrap_or_else(|| Error::assertion_failure("foreign key round failed without error")));
        }
        pending = failed;
    }
}

// =============================================================================
// Property references
// =============================================================================

/// Resolves recorded property references, adding unique keys where required.
///
/// # Errors
///
/// Returns a mapping error for a reference to an unmapped entity or property.
pub fn process_property_references(meta: &mut InFlightMetadata) -> Result<()> {
    for reference in meta.property_references().to_vec() {
        let class = meta.entity_binding(&reference.entity_name).ok_or_else(|| {
            Error::mapping(format!(
                "property-ref to unmapped class: {}",
                reference.entity_name
            ))
        })?;
        let not_found = || {
            Error::mapping(format!(
                "property-ref not found: {} in class: {}",
                reference.property_name, reference.entity_name
            ))
        };
        if !reference.unique {
            meta.bindings
                .property(class, &reference.property_name)
                .ok_or_else(not_found)?;
            continue;
        }
        let value = meta
            .bindings
            .value_mut(class, &reference.property_name)
            .ok_or_else(not_found)?;
        let columns = value.columns();
        let table = value.table();
        if let Some(simple) = value.simple_mut() {
            simple.set_alternate_unique_key(true);
        }
        if let Some(root) = meta.bindings.root_data_mut(class) {
            root.sync_identifier();
        }
        if !columns.is_empty() {
            meta.database.require_table_mut(table)?.create_unique_key(&columns);
        }
        tracing::debug!(
            entity = %reference.entity_name,
            property = %reference.property_name,
            "unique property reference"
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    fn recorder(log: &Rc<RefCell<Vec<String>>>, label: &str) -> SecondPass {
        let log = Rc::clone(log);
        let label = label.to_string();
        SecondPass::deferred(label.clone(), move |_| {
            log.borrow_mut().push(label);
            Ok(())
        })
    }

    #[test]
    fn deferred_passes_run_in_queue_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut meta = InFlightMetadata::default();
        meta.add_second_pass(recorder(&log, "first"));
        meta.add_second_pass(recorder(&log, "second"));
        meta.add_second_pass_on_top(recorder(&log, "urgent"), true);

        process_second_passes(&mut meta).unwrap();
        assert_eq!(*log.borrow(), vec!["urgent", "first", "second"]);
        assert_eq!(meta.pending_second_passes(), 0);
        assert!(meta.is_frozen());
    }

    #[test]
    fn passes_queued_while_draining_run_afterwards() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut meta = InFlightMetadata::default();
        let inner = Rc::clone(&log);
        meta.add_second_pass(SecondPass::deferred("outer", move |meta| {
            inner.borrow_mut().push("outer".to_string());
            meta.add_second_pass(recorder(&inner, "inner"));
            Ok(())
        }));
        meta.add_second_pass(recorder(&log, "sibling"));

        process_second_passes(&mut meta).unwrap();
        assert_eq!(*log.borrow(), vec!["outer", "sibling", "inner"]);
    }

    #[test]
    fn failing_pass_is_named_in_the_error() {
        let mut meta = InFlightMetadata::default();
        meta.add_second_pass(SecondPass::deferred("check widgets", |_| {
            Err(Error::mapping("widget missing"))
        }));
        let err = process_second_passes(&mut meta).unwrap_err();
        assert_eq!(err.to_string(), "widget missing");
        let pass = err.context.as_ref().and_then(|c| c.pass.as_deref());
        assert_eq!(pass, Some("check widgets"));
    }

    #[test]
    fn deferred_work_runs_in_the_general_stage() {
        let meta = InFlightMetadata::default();
        let pass = SecondPass::deferred("noop", |_| Ok(()));
        assert_eq!(pass.stage(&meta.bindings), Stage::General);
        assert!(Stage::InPrimaryKeyForeignKey < Stage::CreateKey);
        assert!(Stage::ForeignKey < Stage::SecondaryTable);
    }

    #[test]
    fn property_reference_to_unmapped_entity_fails() {
        let mut meta = InFlightMetadata::default();
        meta.add_property_reference("com.acme.Ghost", "code", true);
        let err = process_second_passes(&mut meta).unwrap_err();
        assert!(err.to_string().contains("property-ref to unmapped class: com.acme.Ghost"));
    }
}
