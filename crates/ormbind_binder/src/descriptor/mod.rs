//! Strongly-typed mapping input.
//!
//! A [`MetadataSources`] is the closed set of classes one build binds. Every
//! annotation is an `Option` (or an empty `Vec`) on its descriptor, so a
//! missing annotation is never an error by itself.

pub mod annotations;
mod entity;
mod property;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub use annotations::*;
pub use entity::{EmbeddableDescriptor, EntityDescriptor, MappedSuperclassDescriptor};
pub use property::PropertyDescriptor;

/// `@FilterDef`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct FilterDefinition {
    /// Filter name.
    pub name: String,
    /// Condition used by `@Filter`s that give none.
    pub default_condition: Option<String>,
    /// Parameter names and type names.
    pub parameters: Vec<(String, String)>,
}

impl FilterDefinition {
    /// A definition with an optional default condition.
    #[must_use]
    pub fn new(name: impl Into<String>, default_condition: Option<&str>) -> Self {
        Self {
            name: name.into(),
            default_condition: default_condition.map(str::to_string),
            parameters: Vec::new(),
        }
    }
}

/// Everything one metadata build binds.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct MetadataSources {
    /// Entity classes, in registration order.
    pub entities: Vec<EntityDescriptor>,
    /// Mapped superclasses.
    pub mapped_superclasses: Vec<MappedSuperclassDescriptor>,
    /// Embeddables and id classes.
    pub embeddables: Vec<EmbeddableDescriptor>,
    /// Filter definitions.
    pub filter_definitions: Vec<FilterDefinition>,
}

impl MetadataSources {
    /// An empty set of sources.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entity.
    #[must_use]
    pub fn with_entity(mut self, entity: EntityDescriptor) -> Self {
        self.entities.push(entity);
        self
    }

    /// Adds a mapped superclass.
    #[must_use]
    pub fn with_mapped_superclass(mut self, mapped: MappedSuperclassDescriptor) -> Self {
        self.mapped_superclasses.push(mapped);
        self
    }

    /// Adds an embeddable or id class.
    #[must_use]
    pub fn with_embeddable(mut self, embeddable: EmbeddableDescriptor) -> Self {
        self.embeddables.push(embeddable);
        self
    }

    /// Adds a filter definition.
    #[must_use]
    pub fn with_filter_definition(mut self, definition: FilterDefinition) -> Self {
        self.filter_definitions.push(definition);
        self
    }

    /// Entity descriptor for `class_name`.
    #[must_use]
    pub fn entity(&self, class_name: &str) -> Option<&EntityDescriptor> {
        self.entities.iter().find(|e| e.class_name == class_name)
    }

    /// Mapped superclass descriptor for `class_name`.
    #[must_use]
    pub fn mapped_superclass(&self, class_name: &str) -> Option<&MappedSuperclassDescriptor> {
        self.mapped_superclasses
            .iter()
            .find(|m| m.class_name == class_name)
    }

    /// Embeddable descriptor for `class_name`.
    #[must_use]
    pub fn embeddable(&self, class_name: &str) -> Option<&EmbeddableDescriptor> {
        self.embeddables.iter().find(|e| e.class_name == class_name)
    }
}
