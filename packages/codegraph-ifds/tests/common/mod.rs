//! Common test utilities for codegraph-ifds
//!
//! This module provides shared fixtures, assertions, and builders
//! for the solver and path reconstruction integration tests.

#![allow(dead_code)]

mod assertions;
mod builders;
mod fixtures;

// Re-export all utilities
pub use assertions::*;
pub use builders::*;
pub use fixtures::*;
