//! Two-phase metadata binder for ormbind.
//!
//! This crate provides:
//! - [`MetadataSources`] and the descriptor types - Annotated classes as input
//! - [`MetadataBuilder`] - Runs a build and returns the bound [`Metadata`]
//! - [`bind_entity`] - Binds one entity: tables, hierarchy, identifier, properties
//! - [`bind_property`] - Binds one basic, component, or association property
//! - [`SecondPass`] - Deferred work resolved once every entity is registered
//! - [`BuildingOptions`] - Caching, constraint, discriminator, and naming defaults
//!
//! Binding runs in two phases. The first binds every entity in inheritance
//! order and queues whatever depends on other entities: foreign keys, keys
//! of joined and secondary tables, inverse associations, collection keys.
//! The second drains that queue in stages, retrying work whose target is not
//! complete yet, until nothing is left.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod collector;
pub mod descriptor;
pub mod diagnostics;
pub mod entity;
pub mod inheritance;
pub mod join_column;
pub mod metadata;
pub mod naming;
pub mod options;
pub mod property_binder;
pub mod second_pass;
pub mod table_binder;
pub mod to_one;

pub use collector::{EntityTableXref, InFlightMetadata};
pub use descriptor::{
    EmbeddableDescriptor, EntityDescriptor, FilterDefinition, MappedSuperclassDescriptor,
    MetadataSources, PropertyDescriptor,
};
pub use diagnostics::{Anomaly, Diagnostics};
pub use entity::bind_entity;
pub use inheritance::{InheritanceState, InheritanceStates};
pub use metadata::{Metadata, MetadataBuilder, build_metadata};
pub use naming::{IdentityPhysicalNaming, PhysicalNamingStrategy, SnakeCasePhysicalNaming};
pub use options::{BuildingOptions, CacheAccessType, SharedCacheMode};
pub use property_binder::{BindingContext, BoundProperty, PropertyHolder, bind_property};
pub use second_pass::{SecondPass, process_second_passes};
