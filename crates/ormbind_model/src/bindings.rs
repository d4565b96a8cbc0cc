//! The arena of bound entity classes.
//!
//! Classes refer to each other by [`ClassId`]. Values inside a class are
//! addressed by property path, so a deferred task can find "the value of
//! `customer` on `Order`" without holding a reference into the arena.

use ormbind_foundation::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::column::ColumnId;
use crate::persistent_class::{PersistentClass, RootData};
use crate::property::Property;
use crate::table::TableId;
use crate::value::Value;

/// Stable handle to a bound entity class.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClassId(u32);

impl ClassId {
    /// Creates a handle from a raw arena index.
    #[must_use]
    pub const fn from_index(index: u32) -> Self {
        Self(index)
    }

    /// The raw arena index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Immutable, cheaply cloned view of entity name to class handle.
pub type EntityBindingMap = im::HashMap<String, ClassId>;

/// Where a property path starts.
enum PathRoot {
    IdentifierProperty(ClassId),
    EmbeddedIdentifier(ClassId),
    Declared(ClassId),
}

/// Owns every [`PersistentClass`] and indexes them by entity name.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EntityBindings {
    classes: Vec<PersistentClass>,
    by_name: EntityBindingMap,
}

impl EntityBindings {
    /// Creates an empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a class under its entity name.
    ///
    /// # Errors
    ///
    /// Returns a mapping error if the entity name is already bound.
    pub fn add(&mut self, class: PersistentClass) -> Result<ClassId> {
        let name = class.entity_name().to_string();
        if self.by_name.contains_key(&name) {
            return Err(Error::mapping(format!("Duplicate entity mapping {name}")));
        }
        let id = ClassId(u32::try_from(self.classes.len()).unwrap_or(u32::MAX));
        self.classes.push(class);
        self.by_name.insert(name, id);
        Ok(id)
    }

    /// Records `subclass` in its superclass's subclass list.
    pub fn link_subclass(&mut self, superclass: ClassId, subclass: ClassId) {
        if let Some(parent) = self.classes.get_mut(superclass.index()) {
            parent.add_subclass(subclass);
        }
    }

    /// Looks up a class by handle.
    #[must_use]
    pub fn get(&self, id: ClassId) -> Option<&PersistentClass> {
        self.classes.get(id.index())
    }

    /// Looks up a class by handle for modification.
    pub fn get_mut(&mut self, id: ClassId) -> Option<&mut PersistentClass> {
        self.classes.get_mut(id.index())
    }

    /// Same as [`EntityBindings::get`], but a missing class is an error.
    ///
    /// # Errors
    ///
    /// Returns an assertion failure for a dangling handle.
    pub fn require(&self, id: ClassId) -> Result<&PersistentClass> {
        self.get(id)
            .ok_or_else(|| Error::assertion_failure(format!("no entity with handle {id:?}")))
    }

    /// Same as [`EntityBindings::get_mut`], but a missing class is an error.
    ///
    /// # Errors
    ///
    /// Returns an assertion failure for a dangling handle.
    pub fn require_mut(&mut self, id: ClassId) -> Result<&mut PersistentClass> {
        self.classes
            .get_mut(id.index())
            .ok_or_else(|| Error::assertion_failure(format!("no entity with handle {id:?}")))
    }

    /// Handle of the class bound under `entity_name`.
    #[must_use]
    pub fn id_of(&self, entity_name: &str) -> Option<ClassId> {
        self.by_name.get(entity_name).copied()
    }

    /// Class bound under `entity_name`.
    #[must_use]
    pub fn by_name(&self, entity_name: &str) -> Option<&PersistentClass> {
        self.id_of(entity_name).and_then(|id| self.get(id))
    }

    /// All classes in binding order.
    pub fn iter(&self) -> impl Iterator<Item = (ClassId, &PersistentClass)> + '_ {
        self.classes
            .iter()
            .enumerate()
            .map(|(i, c)| (ClassId(u32::try_from(i).unwrap_or(u32::MAX)), c))
    }

    /// Number of bound classes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Whether nothing is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// A frozen view of the name index.
    #[must_use]
    pub fn snapshot(&self) -> EntityBindingMap {
        self.by_name.clone()
    }

    // ---- hierarchy ----

    /// The root of `id`'s hierarchy.
    #[must_use]
    pub fn root_of(&self, id: ClassId) -> ClassId {
        let mut current = id;
        while let Some(parent) = self.get(current).and_then(PersistentClass::superclass) {
            current = parent;
        }
        current
    }

    /// Root state of `id`'s hierarchy.
    #[must_use]
    pub fn root_data(&self, id: ClassId) -> Option<&RootData> {
        self.get(self.root_of(id))?.root_data()
    }

    /// Root state of `id`'s hierarchy for modification.
    pub fn root_data_mut(&mut self, id: ClassId) -> Option<&mut RootData> {
        let root = self.root_of(id);
        self.get_mut(root)?.root_data_mut()
    }

    /// Identifier value of `id`'s hierarchy.
    #[must_use]
    pub fn identifier(&self, id: ClassId) -> Option<&Value> {
        self.root_data(id)?.identifier.as_ref()
    }

    /// Identifier property of `id`'s hierarchy.
    #[must_use]
    pub fn identifier_property(&self, id: ClassId) -> Option<&Property> {
        self.root_data(id)?.identifier_property.as_ref()
    }

    /// Columns identifying a row of `id`'s own table.
    ///
    /// For a joined subclass these are its key columns; otherwise the
    /// hierarchy's identifier columns.
    #[must_use]
    pub fn key_columns(&self, id: ClassId) -> Vec<ColumnId> {
        if let Some(key) = self.get(id).and_then(PersistentClass::joined_key) {
            return key.columns();
        }
        self.identifier(id).map(Value::columns).unwrap_or_default()
    }

    /// The ancestors of `id`, nearest first.
    #[must_use]
    pub fn ancestors(&self, id: ClassId) -> Vec<ClassId> {
        let mut out = Vec::new();
        let mut current = self.get(id).and_then(PersistentClass::superclass);
        while let Some(parent) = current {
            out.push(parent);
            current = self.get(parent).and_then(PersistentClass::superclass);
        }
        out
    }

    /// `id` and every transitive subclass, breadth first.
    #[must_use]
    pub fn subclass_closure(&self, id: ClassId) -> Vec<ClassId> {
        let mut out = vec![id];
        let mut i = 0;
        while i < out.len() {
            if let Some(class) = self.get(out[i]) {
                out.extend_from_slice(class.subclasses());
            }
            i += 1;
        }
        out
    }

    /// Tables of `id` and its ancestors, root first, plus their joins.
    #[must_use]
    pub fn table_closure(&self, id: ClassId) -> Vec<TableId> {
        let mut chain = self.ancestors(id);
        chain.reverse();
        chain.push(id);
        let mut tables = Vec::new();
        for class in chain.iter().filter_map(|c| self.get(*c)) {
            for table in std::iter::once(class.table()).chain(class.joins().iter().map(|j| j.table())) {
                if !tables.contains(&table) {
                    tables.push(table);
                }
            }
        }
        tables
    }

    /// Whether a property named `name` is declared by a strict ancestor of `id`.
    #[must_use]
    pub fn is_property_defined_in_super_hierarchy(&self, id: ClassId, name: &str) -> bool {
        self.ancestors(id)
            .into_iter()
            .filter_map(|a| self.get(a))
            .any(|class| class.property(name).is_some())
    }

    // ---- path lookup ----

    fn path_root(&self, id: ClassId, head: &str) -> Option<PathRoot> {
        let root_id = self.root_of(id);
        let root = self.get(root_id)?.root_data()?;
        if root
            .identifier_property
            .as_ref()
            .is_some_and(|p| p.name() == head)
        {
            return Some(PathRoot::IdentifierProperty(root_id));
        }
        if head == "id"
            && root.identifier_property.is_none()
            && root.identifier_component().is_some()
        {
            return Some(PathRoot::EmbeddedIdentifier(root_id));
        }
        let mut current = Some(id);
        while let Some(cid) = current {
            let class = self.get(cid)?;
            if class.property(head).is_some() {
                return Some(PathRoot::Declared(cid));
            }
            current = class.superclass();
        }
        None
    }

    /// Prefixes `id.` to a path whose head only names a member of a
    /// synthetic embedded identifier.
    fn resolve_path(&self, id: ClassId, path: &str) -> Option<String> {
        let head = path.split('.').next()?;
        if self.path_root(id, head).is_some() {
            return Some(path.to_string());
        }
        let root = self.root_data(id)?;
        let component = root.identifier_component()?;
        if root.identifier_property.is_none() && component.has_property(head) {
            return Some(format!("id.{path}"));
        }
        None
    }

    /// Finds the value at a dotted property path relative to `id`.
    ///
    /// The first segment may name the identifier property, `id` for a
    /// synthetic embedded identifier (whose members may also be named
    /// directly), or any property declared on the class, its joins, or its
    /// ancestors. Later segments descend into components.
    #[must_use]
    pub fn value(&self, id: ClassId, path: &str) -> Option<&Value> {
        let path = self.resolve_path(id, path)?;
        let segments: Vec<&str> = path.split('.').collect();
        let (head, tail) = segments.split_first()?;
        let start = match self.path_root(id, head)? {
            PathRoot::IdentifierProperty(root) => {
                self.get(root)?.root_data()?.identifier_property.as_ref()?.value()
            }
            PathRoot::EmbeddedIdentifier(root) => self.get(root)?.root_data()?.identifier.as_ref()?,
            PathRoot::Declared(cid) => self.get(cid)?.property(head)?.value(),
        };
        descend(start, tail)
    }

    /// Same as [`EntityBindings::value`], for modification.
    pub fn value_mut(&mut self, id: ClassId, path: &str) -> Option<&mut Value> {
        let path = self.resolve_path(id, path)?;
        let segments: Vec<&str> = path.split('.').collect();
        let (head, tail) = segments.split_first()?;
        let start = match self.path_root(id, head)? {
            PathRoot::IdentifierProperty(root) => self
                .get_mut(root)?
                .root_data_mut()?
                .identifier_property
                .as_mut()?
                .value_mut(),
            PathRoot::EmbeddedIdentifier(root) => {
                self.get_mut(root)?.root_data_mut()?.identifier.as_mut()?
            }
            PathRoot::Declared(cid) => self.get_mut(cid)?.property_mut(head)?.value_mut(),
        };
        descend_mut(start, tail)
    }

    /// Finds the property at a dotted path relative to `id`.
    #[must_use]
    pub fn property(&self, id: ClassId, path: &str) -> Option<&Property> {
        let path = self.resolve_path(id, path)?;
        let segments: Vec<&str> = path.split('.').collect();
        let (head, tail) = segments.split_first()?;
        let (first, rest): (&Property, &[&str]) = match self.path_root(id, head)? {
            PathRoot::IdentifierProperty(root) => {
                (self.get(root)?.root_data()?.identifier_property.as_ref()?, tail)
            }
            PathRoot::EmbeddedIdentifier(root) => {
                let component = self.get(root)?.root_data()?.identifier_component()?;
                let (next, rest) = tail.split_first()?;
                (component.property(next)?, rest)
            }
            PathRoot::Declared(cid) => (self.get(cid)?.property(head)?, tail),
        };
        let mut property = first;
        for segment in rest {
            property = property.value().as_component()?.property(segment)?;
        }
        Some(property)
    }
}

fn descend<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    match path.split_first() {
        None => Some(value),
        Some((head, tail)) => {
            let property = value.as_component()?.property(head)?;
            descend(property.value(), tail)
        }
    }
}

fn descend_mut<'a>(value: &'a mut Value, path: &[&str]) -> Option<&'a mut Value> {
    match path.split_first() {
        None => Some(value),
        Some((head, tail)) => {
            let property = value.as_component_mut()?.property_mut(head)?;
            descend_mut(property.value_mut(), tail)
        }
    }
}
