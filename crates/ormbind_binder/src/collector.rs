//! The in-flight build context.
//!
//! [`InFlightMetadata`] owns everything a single build mutates: the relational
//! [`Database`], the entity arena, imports, filter definitions, the table
//! cross-reference used to route properties to secondary tables, and the
//! second-pass queue. It is created by the metadata builder and threaded
//! through every binder explicitly.

use std::collections::{BTreeMap, HashMap, VecDeque};

use ormbind_foundation::{Error, Interner, Name, Result};
use ormbind_model::{ClassId, Database, EntityBindingMap, EntityBindings, PersistentClass, TableId};

use crate::descriptor::FilterDefinition;
use crate::diagnostics::Diagnostics;
use crate::options::BuildingOptions;
use crate::second_pass::SecondPass;

// =============================================================================
// Table cross-reference
// =============================================================================

/// Tables an entity's properties may be routed to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntityTableXref {
    /// The entity's primary table.
    pub primary_table: TableId,
    /// Logical name of the primary table.
    pub primary_logical_name: String,
    /// Entity whose tables are searched next.
    pub super_entity: Option<String>,
    /// Secondary tables by logical name, in declaration order.
    pub secondary_tables: Vec<(String, TableId)>,
}

impl EntityTableXref {
    /// A cross-reference with no secondary tables.
    #[must_use]
    pub fn new(
        primary_table: TableId,
        primary_logical_name: impl Into<String>,
        super_entity: Option<String>,
    ) -> Self {
        Self {
            primary_table,
            primary_logical_name: primary_logical_name.into(),
            super_entity,
            secondary_tables: Vec::new(),
        }
    }
}

/// A property whose columns are referenced by an association instead of the
/// target's primary key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PropertyReference {
    /// Entity declaring the referenced property.
    pub entity_name: String,
    /// Referenced property path.
    pub property_name: String,
    /// Whether the referenced columns must be unique.
    pub unique: bool,
}

// =============================================================================
// In-flight metadata
// =============================================================================

/// Mutable state of one metadata build.
#[derive(Debug, Default)]
pub struct InFlightMetadata {
    /// Options steering the build.
    pub options: BuildingOptions,
    /// Tables and columns bound so far.
    pub database: Database,
    /// Entity classes bound so far.
    pub bindings: EntityBindings,
    /// Interned property names.
    pub interner: Interner,
    /// Tolerated anomalies.
    pub diagnostics: Diagnostics,
    imports: BTreeMap<String, String>,
    filter_definitions: BTreeMap<String, FilterDefinition>,
    table_xrefs: HashMap<String, EntityTableXref>,
    second_passes: VecDeque<SecondPass>,
    property_references: Vec<PropertyReference>,
    frozen: Option<EntityBindingMap>,
}

impl InFlightMetadata {
    /// Creates an empty build context.
    #[must_use]
    pub fn new(options: BuildingOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// Interns a property name.
    pub fn intern(&mut self, name: &str) -> Name {
        self.interner.intern(name)
    }

    // ---- entities ----

    /// Registers a bound entity class.
    ///
    /// # Errors
    ///
    /// Returns an assertion failure once the second-pass barrier has been
    /// crossed, and a mapping error for a duplicated entity name.
    pub fn add_entity_binding(&mut self, class: PersistentClass) -> Result<ClassId> {
        if self.frozen.is_some() {
            return Err(Error::assertion_failure(format!(
                "Entity binding '{}' registered after the second-pass barrier",
                class.entity_name()
            )));
        }
        let name = class.entity_name().to_string();
        let id = self.bindings.add(class)?;
        tracing::debug!(entity = %name, "registered entity binding");
        Ok(id)
    }

    /// Entity class bound under `entity_name`.
    #[must_use]
    pub fn entity_binding(&self, entity_name: &str) -> Option<ClassId> {
        match &self.frozen {
            Some(map) => map.get(entity_name).copied(),
            None => self.bindings.id_of(entity_name),
        }
    }

    /// Freezes the entity registry; every first pass has completed.
    pub fn freeze(&mut self) {
        if self.frozen.is_none() {
            tracing::trace!(entities = self.bindings.len(), "entity registry frozen");
            self.frozen = Some(self.bindings.snapshot());
        }
    }

    /// Whether the entity registry is frozen.
    #[must_use]
    pub fn is_frozen(&self) -> bool {
        self.frozen.is_some()
    }

    /// The name to binding view: the frozen snapshot, or the live registry
    /// before the barrier.
    #[must_use]
    pub fn entity_binding_map(&self) -> EntityBindingMap {
        match &self.frozen {
            Some(map) => map.clone(),
            None => self.bindings.snapshot(),
        }
    }

    // ---- imports ----

    /// Registers `import` as a name for `entity_name`.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::DuplicateImport`](ormbind_foundation::ErrorKind::DuplicateImport)
    /// when `import` already names a different entity.
    pub fn add_import(&mut self, import: &str, entity_name: &str) -> Result<()> {
        match self.imports.get(import) {
            Some(existing) if existing != entity_name => {
                Err(Error::duplicate_import(import, existing.as_str()))
            }
            Some(_) => Ok(()),
            None => {
                tracing::debug!(import, entity = entity_name, "import");
                self.imports.insert(import.to_string(), entity_name.to_string());
                Ok(())
            }
        }
    }

    /// Import names and the entities they refer to.
    #[must_use]
    pub fn imports(&self) -> &BTreeMap<String, String> {
        &self.imports
    }

    // ---- filter definitions ----

    /// Registers a filter definition; a later definition replaces an earlier one.
    pub fn add_filter_definition(&mut self, definition: FilterDefinition) {
        self.filter_definitions
            .insert(definition.name.clone(), definition);
    }

    /// Filter definition by name.
    #[must_use]
    pub fn filter_definition(&self, name: &str) -> Option<&FilterDefinition> {
        self.filter_definitions.get(name)
    }

    /// Every filter definition, by name.
    #[must_use]
    pub fn filter_definitions(&self) -> &BTreeMap<String, FilterDefinition> {
        &self.filter_definitions
    }

    // ---- table cross-reference ----

    /// Records the tables of `entity_name`.
    pub fn add_entity_table_xref(&mut self, entity_name: &str, xref: EntityTableXref) {
        self.table_xrefs.insert(entity_name.to_string(), xref);
    }

    /// Tables recorded for `entity_name`.
    #[must_use]
    pub fn entity_table_xref(&self, entity_name: &str) -> Option<&EntityTableXref> {
        self.table_xrefs.get(entity_name)
    }

    /// Records a secondary table of `entity_name`.
    ///
    /// # Errors
    ///
    /// Returns an assertion failure if the entity has no cross-reference yet.
    pub fn add_secondary_table(
        &mut self,
        entity_name: &str,
        logical_name: &str,
        table: TableId,
    ) -> Result<()> {
        let xref = self.table_xrefs.get_mut(entity_name).ok_or_else(|| {
            Error::assertion_failure(format!("No table cross-reference for entity {entity_name}"))
        })?;
        xref.secondary_tables.push((logical_name.to_string(), table));
        Ok(())
    }

    /// Finds the table named `logical_name` among `entity_name`'s tables and
    /// those of its entity superclasses.
    ///
    /// Names match the logical name as written or the physical table name,
    /// ignoring case.
    #[must_use]
    pub fn resolve_table(&self, entity_name: &str, logical_name: &str) -> Option<TableId> {
        let wanted = logical_name.trim();
        let matches = |logical: &str, table: TableId| {
            logical.eq_ignore_ascii_case(wanted)
                || self
                    .database
                    .table(table)
                    .is_some_and(|t| t.name().text().eq_ignore_ascii_case(wanted))
        };
        let mut current = Some(entity_name);
        let mut guard = 0;
        while let Some(name) = current {
            let xref = self.table_xrefs.get(name)?;
            if matches(&xref.primary_logical_name, xref.primary_table) {
                return Some(xref.primary_table);
            }
            if let Some((_, table)) = xref
                .secondary_tables
                .iter()
                .find(|(logical, table)| matches(logical, *table))
            {
                return Some(*table);
            }
            current = xref.super_entity.as_deref();
            guard += 1;
            if guard > self.table_xrefs.len() {
                break;
            }
        }
        None
    }

    // ---- second passes ----

    /// Queues a second pass behind those already queued.
    pub fn add_second_pass(&mut self, pass: SecondPass) {
        self.add_second_pass_on_top(pass, false);
    }

    /// Queues a second pass, ahead of the others in its stage when `on_top`.
    pub fn add_second_pass_on_top(&mut self, pass: SecondPass, on_top: bool) {
        tracing::trace!(pass = %pass.describe(), on_top, "queued second pass");
        if on_top {
            self.second_passes.push_front(pass);
        } else {
            self.second_passes.push_back(pass);
        }
    }

    /// Number of queued second passes.
    #[must_use]
    pub fn pending_second_passes(&self) -> usize {
        self.second_passes.len()
    }

    /// Takes every queued second pass, leaving the queue empty.
    pub(crate) fn take_second_passes(&mut self) -> Vec<SecondPass> {
        self.second_passes.drain(..).collect()
    }

    // ---- property references ----

    /// Records that an association references `property_name` of `entity_name`.
    ///
    /// A reference already recorded as unique stays unique.
    pub fn add_property_reference(&mut self, entity_name: &str, property_name: &str, unique: bool) {
        if let Some(existing) = self
            .property_references
            .iter_mut()
            .find(|r| r.entity_name == entity_name && r.property_name == property_name)
        {
            existing.unique |= unique;
            return;
        }
        self.property_references.push(PropertyReference {
            entity_name: entity_name.to_string(),
            property_name: property_name.to_string(),
            unique,
        });
    }

    /// Recorded property references, in registration order.
    #[must_use]
    pub fn property_references(&self) -> &[PropertyReference] {
        &self.property_references
    }

    /// Consumes the context, returning its long-lived parts.
    #[must_use]
    pub(crate) fn into_parts(
        self,
    ) -> (
        Database,
        EntityBindings,
        BTreeMap<String, String>,
        BTreeMap<String, FilterDefinition>,
        Diagnostics,
    ) {
        (
            self.database,
            self.bindings,
            self.imports,
            self.filter_definitions,
            self.diagnostics,
        )
    }
}

#[cfg(test)]
mod tests {
    use ormbind_foundation::{ErrorKind, Identifier};

    use super::*;

    fn table(meta: &mut InFlightMetadata, name: &str) -> TableId {
        meta.database
            .add_table(None, None, Identifier::new(name, false), None, false)
    }

    #[test]
    fn imports_reject_a_second_entity() {
        let mut meta = InFlightMetadata::default();
        meta.add_import("Dog", "com.acme.Dog").unwrap();
        meta.add_import("Dog", "com.acme.Dog").unwrap();
        let err = meta.add_import("Dog", "org.other.Dog").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::DuplicateImport { .. }));
    }

    #[test]
    fn registration_after_freeze_is_an_assertion_failure() {
        let mut meta = InFlightMetadata::default();
        let t = table(&mut meta, "A");
        meta.add_entity_binding(PersistentClass::root("A", t)).unwrap();
        meta.freeze();
        let err = meta
            .add_entity_binding(PersistentClass::root("B", t))
            .unwrap_err();
        assert!(!err.is_user_correctable());
        assert!(meta.entity_binding("A").is_some());
        assert!(meta.entity_binding("B").is_none());
        assert_eq!(meta.entity_binding_map().len(), 1);
    }

    #[test]
    fn tables_resolve_through_the_super_chain() {
        let mut meta = InFlightMetadata::default();
        let animal = table(&mut meta, "animals");
        let details = table(&mut meta, "animal_details");
        let dog = table(&mut meta, "dogs");
        meta.add_entity_table_xref("Animal", EntityTableXref::new(animal, "animals", None));
        meta.add_secondary_table("Animal", "animal_details", details)
            .unwrap();
        meta.add_entity_table_xref(
            "Dog",
            EntityTableXref::new(dog, "dogs", Some("Animal".into())),
        );
        assert_eq!(meta.resolve_table("Dog", "DOGS"), Some(dog));
        assert_eq!(meta.resolve_table("Dog", "animal_details"), Some(details));
        assert_eq!(meta.resolve_table("Dog", "cats"), None);
    }

    #[test]
    fn property_references_merge_uniqueness() {
        let mut meta = InFlightMetadata::default();
        meta.add_property_reference("Customer", "code", false);
        meta.add_property_reference("Customer", "code", true);
        assert_eq!(meta.property_references().len(), 1);
        assert!(meta.property_references()[0].unique);
    }
}
