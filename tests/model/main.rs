//! Integration tests for Layer 1: Model
//!
//! Tests for tables and constraints, values, and the entity class arena.

mod bindings;
mod tables;
mod values;
