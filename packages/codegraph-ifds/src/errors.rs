//! Error types for codegraph-ifds
//!
//! Resource exhaustion is never an error here: it is reported through
//! [`TerminationReason`](crate::features::ifds::TerminationReason) and leaves
//! accumulated facts and paths usable.

use thiserror::Error;

use crate::config::ConfigError;

/// Main error type for solver and path builder operations
#[derive(Debug, Error)]
pub enum SolverError {
    /// Configuration rejected before any work was scheduled
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A scheduled task panicked; the run is aborted
    #[error("Worker task panicked: {0}")]
    WorkerPanicked(String),

    /// Worker pool could not be created
    #[error("Executor error: {0}")]
    Executor(String),
}

impl SolverError {
    /// Create an executor error
    pub fn executor(msg: impl Into<String>) -> Self {
        SolverError::Executor(msg.into())
    }

    /// Create a worker panic error
    pub fn worker_panicked(msg: impl Into<String>) -> Self {
        SolverError::WorkerPanicked(msg.into())
    }

    /// Whether the error aborted a run that had already started
    pub fn is_fatal_run_error(&self) -> bool {
        matches!(self, SolverError::WorkerPanicked(_))
    }
}

/// Result type alias for solver operations
pub type Result<T> = std::result::Result<T, SolverError>;
