//! Lifecycle callback definitions.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Lifecycle event a callback listens to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CallbackType {
    /// Before an entity is persisted.
    PrePersist,
    /// After an entity is persisted.
    PostPersist,
    /// Before an entity is removed.
    PreRemove,
    /// After an entity is removed.
    PostRemove,
    /// Before an entity is updated.
    PreUpdate,
    /// After an entity is updated.
    PostUpdate,
    /// After an entity is loaded.
    PostLoad,
}

impl fmt::Display for CallbackType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::PrePersist => "PrePersist",
            Self::PostPersist => "PostPersist",
            Self::PreRemove => "PreRemove",
            Self::PostRemove => "PostRemove",
            Self::PreUpdate => "PreUpdate",
            Self::PostUpdate => "PostUpdate",
            Self::PostLoad => "PostLoad",
        };
        f.write_str(name)
    }
}

/// A callback method declared on an entity, listener, or embeddable.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CallbackDefinition {
    /// Event the method listens to.
    pub callback_type: CallbackType,
    /// Class declaring the method.
    pub declaring_class: String,
    /// Method name.
    pub method_name: String,
}

impl CallbackDefinition {
    /// Creates a callback definition.
    #[must_use]
    pub fn new(
        callback_type: CallbackType,
        declaring_class: impl Into<String>,
        method_name: impl Into<String>,
    ) -> Self {
        Self {
            callback_type,
            declaring_class: declaring_class.into(),
            method_name: method_name.into(),
        }
    }
}
