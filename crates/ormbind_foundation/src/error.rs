//! Error types for the binding pipeline.
//!
//! Uses `thiserror` for ergonomic error definition with rich context.
//! Mapping and annotation errors are user-correctable; assertion failures
//! signal an internal invariant violation.

use std::fmt;

use thiserror::Error;

/// The main error type for ormbind operations.
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional context about where the error occurred.
    pub context: Option<ErrorContext>,
}

/// Result alias used across the workspace.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: None,
        }
    }

    /// Adds context to this error.
    #[must_use]
    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Creates an error for an invalid combination of mapping annotations.
    #[must_use]
    pub fn annotation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Annotation(message.into()))
    }

    /// Creates a general mapping error.
    #[must_use]
    pub fn mapping(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Mapping(message.into()))
    }

    /// Creates an error for an association whose target entity is not mapped.
    #[must_use]
    pub fn unknown_entity(association: impl Into<String>, entity: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnknownEntity {
            association: association.into(),
            entity: entity.into(),
        })
    }

    /// Creates an error for two entities sharing one import name.
    #[must_use]
    pub fn duplicate_entity_name(name: impl Into<String>) -> Self {
        Self::new(ErrorKind::DuplicateEntityName(name.into()))
    }

    /// Creates an error for an import name already bound to another entity.
    #[must_use]
    pub fn duplicate_import(import: impl Into<String>, existing: impl Into<String>) -> Self {
        Self::new(ErrorKind::DuplicateImport {
            import: import.into(),
            existing: existing.into(),
        })
    }

    /// Creates an error for an unparseable configuration setting.
    #[must_use]
    pub fn configuration(setting: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration {
            setting: setting.into(),
            value: value.into(),
        })
    }

    /// Creates an internal invariant violation.
    #[must_use]
    pub fn assertion_failure(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::AssertionFailure(message.into()))
    }

    /// Wraps an error that may succeed when retried in a later round.
    #[must_use]
    pub fn recoverable(cause: Error) -> Self {
        Self::new(ErrorKind::Recoverable(Box::new(cause)))
    }

    /// Returns `true` if the user can fix this error by changing the mapping.
    #[must_use]
    pub fn is_user_correctable(&self) -> bool {
        match &self.kind {
            ErrorKind::AssertionFailure(_) => false,
            ErrorKind::Recoverable(cause) => cause.is_user_correctable(),
            _ => true,
        }
    }

    /// Returns `true` if this error was raised as retryable.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self.kind, ErrorKind::Recoverable(_))
    }

    /// Unwraps a recoverable error into its cause; other errors are returned unchanged.
    #[must_use]
    pub fn into_cause(self) -> Self {
        match self.kind {
            ErrorKind::Recoverable(cause) => *cause,
            _ => self,
        }
    }
}

/// Categorized error kinds for pattern matching.
#[derive(Debug, Error)]
pub enum ErrorKind {
    /// Invalid or conflicting mapping annotations.
    #[error("{0}")]
    Annotation(String),

    /// The mapping cannot be built as described.
    #[error("{0}")]
    Mapping(String),

    /// An association names an entity that was never bound.
    #[error("Association '{association}' targets an unknown entity named '{entity}'")]
    UnknownEntity {
        /// Qualified path of the association.
        association: String,
        /// The missing entity name.
        entity: String,
    },

    /// Two entities claim the same import name.
    #[error("Use of the same entity name twice: {0}")]
    DuplicateEntityName(String),

    /// An import name is already registered for a different entity.
    #[error("import name '{import}' is already bound to entity '{existing}'")]
    DuplicateImport {
        /// The colliding import name.
        import: String,
        /// Entity the name already refers to.
        existing: String,
    },

    /// A configuration setting held a value that could not be interpreted.
    #[error("invalid value '{value}' for setting '{setting}'")]
    Configuration {
        /// The setting key.
        setting: String,
        /// The rejected value.
        value: String,
    },

    /// Internal invariant violation (should not happen).
    #[error("assertion failure: {0}")]
    AssertionFailure(String),

    /// A failure that a later retry round may resolve.
    #[error("{0}")]
    Recoverable(Box<Error>),
}

/// Context about where an error occurred.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// Entity being bound.
    pub entity: Option<String>,
    /// Property path within the entity.
    pub property: Option<String>,
    /// Second-pass task that was running.
    pub pass: Option<String>,
}

impl ErrorContext {
    /// Creates a new empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the entity name.
    #[must_use]
    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }

    /// Sets the property path.
    #[must_use]
    pub fn with_property(mut self, property: impl Into<String>) -> Self {
        self.property = Some(property.into());
        self
    }

    /// Sets the second-pass description.
    #[must_use]
    pub fn with_pass(mut self, pass: impl Into<String>) -> Self {
        self.pass = Some(pass.into());
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut sep = "";
        if let Some(entity) = &self.entity {
            write!(f, "entity {entity}")?;
            sep = ", ";
        }
        if let Some(property) = &self.property {
            write!(f, "{sep}property {property}")?;
            sep = ", ";
        }
        if let Some(pass) = &self.pass {
            write!(f, "{sep}during {pass}")?;
        }
        Ok(())
    }
}
