//! Shared module - Common types and utilities
//!
//! This module contains types that are shared across all features.

#[macro_use]
pub mod macros;
pub mod cons_list;
pub mod graph_key;
pub mod thread_pool;

// Re-exports for convenience
pub use cons_list::ConsList;
pub use graph_key::GraphKey;
pub use thread_pool::{build_pool, worker_threads};
