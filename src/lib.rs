//! ormbind - Binds annotated entity descriptors to a relational mapping model
//!
//! This crate re-exports all layers of ormbind for convenient access.
//! For detailed documentation, see the individual layer crates.
//!
//! # Architecture
//!
//! ```text
//! Layer 2: ormbind_binder     - Entity, property and association binding, second passes
//! Layer 1: ormbind_model      - Tables, columns, constraints, values, persistent classes
//! Layer 0: ormbind_foundation - Core types (Identifier, Name, Error)
//! ```

pub use ormbind_binder as binder;
pub use ormbind_foundation as foundation;
pub use ormbind_model as model;

pub use ormbind_binder::{BuildingOptions, Metadata, MetadataBuilder, MetadataSources, build_metadata};
pub use ormbind_foundation::{Error, Result};
