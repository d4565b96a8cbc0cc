//! Hierarchy analysis of the entity sources.
//!
//! Before anything is bound, every entity is placed in its hierarchy: its
//! nearest entity superclass, the mapped superclasses in between, and the
//! strategy the hierarchy uses. The resulting order binds superclasses
//! before subclasses and otherwise keeps registration order.

use std::collections::{HashMap, HashSet};

use ormbind_foundation::{Error, Result};

use crate::descriptor::{
    EntityDescriptor, InheritanceType, MappedSuperclassDescriptor, MetadataSources,
    PropertyDescriptor,
};
use crate::diagnostics::{Anomaly, Diagnostics};

/// Where one entity sits in its hierarchy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InheritanceState {
    /// Entity class name.
    pub class_name: String,
    /// Nearest superclass that is an entity.
    pub super_entity: Option<String>,
    /// Mapped superclasses between this class and `super_entity`, nearest first.
    pub mapped_superclasses: Vec<String>,
    /// Strategy of the hierarchy.
    pub strategy: InheritanceType,
    /// Whether any entity extends this one.
    pub has_children: bool,
}

impl InheritanceState {
    /// Whether this entity has an entity superclass.
    #[must_use]
    pub fn has_parents(&self) -> bool {
        self.super_entity.is_some()
    }

    /// Whether this entity gets a table of its own.
    #[must_use]
    pub fn has_table(&self) -> bool {
        !self.has_parents() || self.strategy != InheritanceType::SingleTable
    }

    /// Whether this entity's table copies its parent's columns.
    #[must_use]
    pub fn has_denormalized_table(&self) -> bool {
        self.has_parents() && self.strategy == InheritanceType::TablePerClass
    }

    /// Whether this is a subclass in a joined hierarchy.
    #[must_use]
    pub fn is_joined_subclass(&self) -> bool {
        self.has_parents() && self.strategy == InheritanceType::Joined
    }
}

/// Hierarchy states of every entity plus the binding order.
#[derive(Clone, Debug, Default)]
pub struct InheritanceStates {
    states: HashMap<String, InheritanceState>,
    order: Vec<String>,
}

impl InheritanceStates {
    /// Analyses `sources`, recording strategy conflicts in `diagnostics`.
    ///
    /// # Errors
    ///
    /// Returns a mapping error for a duplicated class or a superclass cycle.
    pub fn build(sources: &MetadataSources, diagnostics: &mut Diagnostics) -> Result<Self> {
        let mut seen = HashSet::new();
        for entity in &sources.entities {
            if !seen.insert(entity.class_name.as_str()) {
                return Err(Error::duplicate_entity_name(&entity.class_name));
            }
        }

        let mut states = HashMap::new();
        for entity in &sources.entities {
            let (super_entity, mapped_superclasses) = locate_super_entity(sources, entity)?;
            states.insert(
                entity.class_name.clone(),
                InheritanceState {
                    class_name: entity.class_name.clone(),
                    super_entity,
                    mapped_superclasses,
                    strategy: InheritanceType::SingleTable,
                    has_children: false,
                },
            );
        }

        let parents: Vec<String> = states
            .values()
            .filter_map(|s| s.super_entity.clone())
            .collect();
        for parent in parents {
            if let Some(state) = states.get_mut(&parent) {
                state.has_children = true;
            }
        }

        let mut resolved = Self {
            states,
            order: Vec::new(),
        };
        for entity in &sources.entities {
            let root = resolved.root_of(&entity.class_name);
            let applied = sources
                .entity(&root)
                .and_then(|r| r.inheritance)
                .unwrap_or_default();
            if let Some(declared) = entity.inheritance {
                if root != entity.class_name && declared != applied {
                    diagnostics.record(Anomaly::InheritanceStrategyOnSubclass {
                        entity: entity.class_name.clone(),
                        declared,
                        applied,
                    });
                }
            }
            if let Some(state) = resolved.states.get_mut(&entity.class_name) {
                state.strategy = applied;
            }
        }

        for entity in &sources.entities {
            resolved.push_in_order(&entity.class_name);
        }
        Ok(resolved)
    }

    fn push_in_order(&mut self, class_name: &str) {
        if self.order.iter().any(|c| c == class_name) {
            return;
        }
        if let Some(parent) = self.get(class_name).and_then(|s| s.super_entity.clone()) {
            self.push_in_order(&parent);
        }
        self.order.push(class_name.to_string());
    }

    /// State of `class_name`, if it is an entity.
    #[must_use]
    pub fn get(&self, class_name: &str) -> Option<&InheritanceState> {
        self.states.get(class_name)
    }

    /// Entity class names, superclasses first.
    #[must_use]
    pub fn ordered(&self) -> &[String] {
        &self.order
    }

    /// Root entity of `class_name`'s hierarchy.
    #[must_use]
    pub fn root_of(&self, class_name: &str) -> String {
        let mut current = class_name.to_string();
        let mut guard = 0;
        while let Some(parent) = self.get(&current).and_then(|s| s.super_entity.clone()) {
            current = parent;
            guard += 1;
            if guard > self.states.len() {
                break;
            }
        }
        current
    }

    /// The class carrying `@IdClass` for `class_name`'s hierarchy.
    ///
    /// Subclasses only see an id class when `even_if_subclass` is set. Mapped
    /// superclasses on the way up are searched too.
    #[must_use]
    pub fn class_with_id_class<'a>(
        &self,
        sources: &'a MetadataSources,
        class_name: &str,
        even_if_subclass: bool,
    ) -> Option<(String, &'a str)> {
        let state = self.get(class_name)?;
        if !even_if_subclass && state.has_parents() {
            return None;
        }
        let entity = sources.entity(class_name)?;
        if let Some(id_class) = entity.id_class.as_deref() {
            return Some((class_name.to_string(), id_class));
        }
        for mapped in &state.mapped_superclasses {
            if let Some(id_class) = sources
                .mapped_superclass(mapped)
                .and_then(|m| m.id_class.as_deref())
            {
                return Some((mapped.clone(), id_class));
            }
        }
        let parent = state.super_entity.as_deref()?;
        self.class_with_id_class(sources, parent, true)
    }

    /// Attributes an entity binds itself: those of its mapped superclasses,
    /// outermost first, followed by its own.
    #[must_use]
    pub fn elements_to_process<'a>(
        &self,
        sources: &'a MetadataSources,
        entity: &'a EntityDescriptor,
    ) -> Vec<&'a PropertyDescriptor> {
        let mut out = Vec::new();
        if let Some(state) = self.get(&entity.class_name) {
            for mapped in state.mapped_superclasses.iter().rev() {
                if let Some(descriptor) = sources.mapped_superclass(mapped) {
                    out.extend(descriptor.properties.iter());
                }
            }
        }
        out.extend(entity.properties.iter());
        out
    }

    /// Mapped superclasses of `class_name`, nearest first.
    #[must_use]
    pub fn mapped_superclasses<'a>(
        &self,
        sources: &'a MetadataSources,
        class_name: &str,
    ) -> Vec<&'a MappedSuperclassDescriptor> {
        self.get(class_name)
            .map(|s| {
                s.mapped_superclasses
                    .iter()
                    .filter_map(|m| sources.mapped_superclass(m))
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn locate_super_entity(
    sources: &MetadataSources,
    entity: &EntityDescriptor,
) -> Result<(Option<String>, Vec<String>)> {
    let mut mapped = Vec::new();
    let mut visited = HashSet::new();
    visited.insert(entity.class_name.clone());
    let mut current = entity.superclass.clone();
    while let Some(class_name) = current {
        if !visited.insert(class_name.clone()) {
            return Err(Error::mapping(format!(
                "Class '{}' has a cyclic superclass chain through '{class_name}'",
                entity.class_name
            )));
        }
        if sources.entity(&class_name).is_some() {
            return Ok((Some(class_name), mapped));
        }
        match sources.mapped_superclass(&class_name) {
            Some(descriptor) => {
                current = descriptor.superclass.clone();
                mapped.push(class_name);
            }
            None => break,
        }
    }
    Ok((None, mapped))
}
