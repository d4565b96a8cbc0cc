//! Core errors, identifiers, and name utilities for ormbind.
//!
//! This crate provides:
//! - [`Error`] - Mapping, annotation, and assertion errors with context
//! - [`Identifier`] - Quotable database identifiers with canonical forms
//! - [`Name`] and [`Interner`] - Interned property and entity names
//! - [`names`] - Qualification helpers and the Java-compatible string hash

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod identifier;
pub mod intern;
pub mod names;

pub use error::{Error, ErrorContext, ErrorKind, Result};
pub use identifier::{Identifier, IdentifierRenderer, PlainRenderer, QualifiedTableName};
pub use intern::{Interner, Name};
