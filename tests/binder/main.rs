//! Integration tests for Layer 2: Binder
//!
//! Tests for building options, naming, association binding, and second-pass
//! resolution through complete metadata builds.

mod associations;
mod naming;
mod options;
mod second_passes;
