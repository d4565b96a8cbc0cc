//! Integration tests for Layer 0: Foundation
//!
//! Tests for core types: Error, Identifier, Name, and the name helpers.

mod errors;
mod identifiers;
mod names;
