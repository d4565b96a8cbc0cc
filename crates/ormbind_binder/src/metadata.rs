//! Building the metadata model.
//!
//! [`MetadataBuilder`] runs a build from end to end:
//!
//! 1. filter definitions are registered;
//! 2. inheritance is resolved for every entity;
//! 3. entities are bound, parents before children;
//! 4. second passes are drained;
//! 5. denormalized tables are materialized and constraint names finalized.
//!
//! The result is an immutable [`Metadata`].

use std::collections::BTreeMap;

use ormbind_foundation::Result;
use ormbind_model::{ClassId, Database, EntityBindings, PersistentClass, Property, Table};

use crate::collector::InFlightMetadata;
use crate::descriptor::{FilterDefinition, MetadataSources};
use crate::diagnostics::Anomaly;
use crate::entity::bind_entity;
use crate::inheritance::InheritanceStates;
use crate::options::BuildingOptions;
use crate::property_binder::BindingContext;
use crate::second_pass::process_second_passes;

// =============================================================================
// Metadata
// =============================================================================

/// The bound model: tables, entity classes, imports and filters.
#[derive(Clone, Debug)]
pub struct Metadata {
    database: Database,
    bindings: EntityBindings,
    imports: BTreeMap<String, String>,
    filter_definitions: BTreeMap<String, FilterDefinition>,
    anomalies: Vec<Anomaly>,
}

impl Metadata {
    /// The relational model.
    #[must_use]
    pub fn database(&self) -> &Database {
        &self.database
    }

    /// Every bound entity class.
    #[must_use]
    pub fn bindings(&self) -> &EntityBindings {
        &self.bindings
    }

    /// Query names and the entities they stand for.
    #[must_use]
    pub fn imports(&self) -> &BTreeMap<String, String> {
        &self.imports
    }

    /// Filter definitions by name.
    #[must_use]
    pub fn filter_definitions(&self) -> &BTreeMap<String, FilterDefinition> {
        &self.filter_definitions
    }

    /// Mappings that were accepted with a warning.
    #[must_use]
    pub fn anomalies(&self) -> &[Anomaly] {
        &self.anomalies
    }

    /// Handle of the entity bound under `entity_name`.
    #[must_use]
    pub fn class_id(&self, entity_name: &str) -> Option<ClassId> {
        self.bindings.id_of(entity_name)
    }

    /// Entity class bound under `entity_name`.
    #[must_use]
    pub fn entity(&self, entity_name: &str) -> Option<&PersistentClass> {
        self.bindings.by_name(entity_name)
    }

    /// Entity class a query name refers to.
    #[must_use]
    pub fn imported_entity(&self, import: &str) -> Option<&PersistentClass> {
        self.entity(self.imports.get(import)?)
    }

    /// Primary table of the entity bound under `entity_name`.
    #[must_use]
    pub fn entity_table(&self, entity_name: &str) -> Option<&Table> {
        self.database.table(self.entity(entity_name)?.table())
    }

    /// Property at `path` of an entity, following components and the
    /// synthetic identifier.
    #[must_use]
    pub fn property(&self, entity_name: &str, path: &str) -> Option<&Property> {
        self.bindings.property(self.class_id(entity_name)?, path)
    }

    /// Table whose physical name is `name`, ignoring case.
    #[must_use]
    pub fn table_named(&self, name: &str) -> Option<&Table> {
        self.database
            .tables()
            .find(|t| t.name().text().eq_ignore_ascii_case(name))
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Builds [`Metadata`] from annotated sources.
#[derive(Clone, Debug, Default)]
pub struct MetadataBuilder {
    options: BuildingOptions,
}

impl MetadataBuilder {
    /// A builder using `options`.
    #[must_use]
    pub fn new(options: BuildingOptions) -> Self {
        Self { options }
    }

    /// The options of this builder.
    #[must_use]
    pub fn options(&self) -> &BuildingOptions {
        &self.options
    }

    /// Binds every entity of `sources`.
    ///
    /// # Errors
    ///
    /// Returns the first mapping error. No partial model is returned.
    pub fn build(&self, sources: &MetadataSources) -> Result<Metadata> {
        let span = tracing::info_span!("build_metadata", entities = sources.entities.len());
        let _guard = span.enter();

        let mut meta = InFlightMetadata::new(self.options.clone());
        for definition in &sources.filter_definitions {
            meta.add_filter_definition(definition.clone());
        }

        let states = InheritanceStates::build(sources, &mut meta.diagnostics)?;
        let ctx = BindingContext {
            sources,
            states: &states,
        };
        for class_name in states.ordered() {
            if let Some(entity) = sources.entity(class_name) {
                bind_entity(&mut meta, ctx, entity)?;
            }
        }
        tracing::debug!(
            entities = meta.bindings.len(),
            pending = meta.pending_second_passes(),
            "first pass complete"
        );

        process_second_passes(&mut meta)?;
        finalize(&mut meta);

        let (database, bindings, imports, filter_definitions, diagnostics) = meta.into_parts();
        let anomalies = diagnostics.into_anomalies();
        tracing::info!(
            entities = bindings.len(),
            tables = database.len(),
            anomalies = anomalies.len(),
            "metadata built"
        );
        Ok(Metadata {
            database,
            bindings,
            imports,
            filter_definitions,
            anomalies,
        })
    }
}

fn finalize(meta: &mut InFlightMetadata) {
    meta.database.materialize_denormalized_tables();
    for table in meta.database.tables_mut() {
        table.name_foreign_keys();
        table.cleanse_unique_keys();
    }
}

/// Builds [`Metadata`] with `options`.
///
/// # Errors
///
/// Returns the first mapping error.
pub fn build_metadata(sources: &MetadataSources, options: BuildingOptions) -> Result<Metadata> {
    MetadataBuilder::new(options).build(sources)
}
