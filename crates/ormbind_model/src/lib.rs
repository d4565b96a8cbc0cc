//! Relational and mapping model for ormbind.
//!
//! This crate provides:
//! - [`Database`] and [`Table`] - Tables, columns, and constraints in arenas
//! - [`Value`] - The closed sum of mapped values (simple, to-one, component, ...)
//! - [`Property`] - A mapped attribute owning its value
//! - [`PersistentClass`] - A mapped entity with its inheritance role
//! - [`EntityBindings`] - The arena of entity classes with path-based value lookup

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod bindings;
pub mod callback;
pub mod column;
pub mod constraint;
pub mod database;
pub mod persistent_class;
pub mod property;
pub mod table;
pub mod value;

pub use bindings::{ClassId, EntityBindingMap, EntityBindings};
pub use callback::{CallbackDefinition, CallbackType};
pub use column::{Column, ColumnId, DEFAULT_LENGTH, Selectable};
pub use constraint::{ForeignKey, ForeignKeyKey, Index, PrimaryKey, UniqueKey, same_column_set};
pub use database::Database;
pub use persistent_class::{
    ClassKind, CustomSql, FilterConfig, Join, OptimisticLockStyle, PersistentClass,
    ResultCheckStyle, RootData,
};
pub use property::{CascadeStyle, EMBEDDED_ACCESSOR, IDENTIFIER_MAPPER_PROPERTY, Property};
pub use table::{Table, TableId};
pub use value::{
    Collection, Component, DependantValue, FetchMode, ForeignKeyDirection, ForeignKeySettings,
    ManyToOne, NotFoundAction, OneToOne, SimpleValue, ToOne, Value,
};
