//! Tolerated mapping anomalies.
//!
//! Some questionable mappings are accepted with a warning rather than
//! rejected. Each one is logged through `tracing` and kept in the build's
//! [`Diagnostics`] so callers can inspect what was tolerated.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::descriptor::InheritanceType;

/// A mapping that was accepted but is probably not what the author meant.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Anomaly {
    /// A table annotation on an entity that shares its parent's table.
    TableAnnotationWithoutTable {
        /// Entity class name.
        entity: String,
    },
    /// Primary key join columns on a class that is not a joined subclass.
    PrimaryKeyJoinColumnOnNonJoinedSubclass {
        /// Entity class name.
        entity: String,
    },
    /// A cache annotation on a subclass; only roots are cached explicitly.
    CacheAnnotationOnSubclass {
        /// Entity class name.
        entity: String,
    },
    /// A discriminator column declared below the hierarchy root.
    DiscriminatorAnnotationOnSubclass {
        /// Entity class name.
        entity: String,
    },
    /// `@OnDelete` on a class that is not a joined subclass.
    OnDeleteOnNonJoinedSubclass {
        /// Entity name.
        entity: String,
    },
    /// `@Immutable` on a subclass; mutability is a root property.
    ImmutableOnSubclass {
        /// Entity class name.
        entity: String,
    },
    /// Attribute overrides on an entity that inherits from another entity.
    AttributeOverrideWithEntityInheritance {
        /// Entity class name.
        entity: String,
    },
    /// `@NotFound` on a lazily fetched association; it is fetched eagerly.
    NotFoundWithLazyFetch {
        /// Entity name.
        entity: String,
        /// Association property.
        property: String,
    },
    /// A subclass declares an inheritance strategy other than its root's.
    InheritanceStrategyOnSubclass {
        /// Entity class name.
        entity: String,
        /// Strategy the subclass declared.
        declared: InheritanceType,
        /// Strategy of the hierarchy, which is applied.
        applied: InheritanceType,
    },
    /// An explicit discriminator column on a joined hierarchy root is applied.
    ExplicitDiscriminatorForJoined {
        /// Entity class name.
        entity: String,
    },
}

impl Anomaly {
    /// Entity the anomaly was found on.
    #[must_use]
    pub fn entity(&self) -> &str {
        match self {
            Self::TableAnnotationWithoutTable { entity }
            | Self::PrimaryKeyJoinColumnOnNonJoinedSubclass { entity }
            | Self::CacheAnnotationOnSubclass { entity }
            | Self::DiscriminatorAnnotationOnSubclass { entity }
            | Self::OnDeleteOnNonJoinedSubclass { entity }
            | Self::ImmutableOnSubclass { entity }
            | Self::AttributeOverrideWithEntityInheritance { entity }
            | Self::NotFoundWithLazyFetch { entity, .. }
            | Self::InheritanceStrategyOnSubclass { entity, .. }
            | Self::ExplicitDiscriminatorForJoined { entity } => entity,
        }
    }
}

impl fmt::Display for Anomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TableAnnotationWithoutTable { entity } => write!(
                f,
                "@Table used on a @Subclass without its own table, ignored: {entity}"
            ),
            Self::PrimaryKeyJoinColumnOnNonJoinedSubclass { entity } => write!(
                f,
                "@PrimaryKeyJoinColumn used on a non-joined subclass, ignored: {entity}"
            ),
            Self::CacheAnnotationOnSubclass { entity } => write!(
                f,
                "@Cache or @Cacheable on a non-root entity, ignored: {entity}"
            ),
            Self::DiscriminatorAnnotationOnSubclass { entity } => write!(
                f,
                "Discriminator column has to be defined in the root entity, ignored in subclass: {entity}"
            ),
            Self::OnDeleteOnNonJoinedSubclass { entity } => write!(
                f,
                "@OnDelete used on a non-joined subclass, ignored: {entity}"
            ),
            Self::ImmutableOnSubclass { entity } => write!(
                f,
                "@Immutable used on a non-root entity, ignored: {entity}"
            ),
            Self::AttributeOverrideWithEntityInheritance { entity } => write!(
                f,
                "@AttributeOverride not supported on an entity subclass, ignored: {entity}"
            ),
            Self::NotFoundWithLazyFetch { entity, property } => write!(
                f,
                "Association '{entity}.{property}' is '@NotFound' and 'fetch=LAZY'; it will be fetched eagerly"
            ),
            Self::InheritanceStrategyOnSubclass {
                entity,
                declared,
                applied,
            } => write!(
                f,
                "Mixing inheritance strategies is not supported: {entity} declares {declared:?}, using {applied:?}"
            ),
            Self::ExplicitDiscriminatorForJoined { entity } => write!(
                f,
                "Applying explicit discriminator column for joined inheritance on {entity}"
            ),
        }
    }
}

/// Anomalies collected during one build.
#[derive(Clone, Debug, Default)]
pub struct Diagnostics {
    anomalies: Vec<Anomaly>,
}

impl Diagnostics {
    /// Creates an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Logs and keeps an anomaly.
    pub fn record(&mut self, anomaly: Anomaly) {
        tracing::warn!(entity = anomaly.entity(), "{anomaly}");
        self.anomalies.push(anomaly);
    }

    /// Everything recorded so far, in order.
    #[must_use]
    pub fn anomalies(&self) -> &[Anomaly] {
        &self.anomalies
    }

    /// Returns `true` if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.anomalies.is_empty()
    }

    /// Consumes the collection.
    #[must_use]
    pub fn into_anomalies(self) -> Vec<Anomaly> {
        self.anomalies
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_in_order() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.record(Anomaly::ImmutableOnSubclass {
            entity: "com.acme.Dog".into(),
        });
        diagnostics.record(Anomaly::NotFoundWithLazyFetch {
            entity: "com.acme.Order".into(),
            property: "customer".into(),
        });
        assert_eq!(diagnostics.anomalies().len(), 2);
        assert_eq!(diagnostics.anomalies()[1].entity(), "com.acme.Order");
        assert!(diagnostics.anomalies()[1].to_string().contains("Order.customer"));
    }
}
