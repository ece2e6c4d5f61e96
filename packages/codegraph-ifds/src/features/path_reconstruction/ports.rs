//! Path builder contract

use std::sync::Arc;

use crate::errors::Result;
use crate::features::ifds::domain::AbstractionAtSink;
use crate::features::ifds::ports::MemoryBoundedSolver;
use crate::features::path_reconstruction::domain::{InfoflowResults, ResultRecord};
use crate::shared::GraphKey;

/// Walks the fact graph backwards from sink facts to their sources
///
/// `compute_taint_paths` blocks until the walk is done, killed or timed out.
/// Results accumulate across calls; `reset` only clears the kill flag and
/// per-run caches.
pub trait AbstractionPathBuilder<N: GraphKey>: MemoryBoundedSolver {
    fn compute_taint_paths(&self, sinks: &[AbstractionAtSink<N>]) -> Result<()>;

    /// Revisit cached paths whose facts gained neighbors since they were
    /// walked
    fn run_incremental_path_computation(&self) -> Result<()>;

    fn results(&self) -> Arc<InfoflowResults<N>>;

    fn add_result_available_handler(&self, handler: Arc<dyn PathResultListener<N>>);
}

/// Notified for every new source-to-sink record
pub trait PathResultListener<N>: Send + Sync {
    fn on_result_available(&self, record: &ResultRecord<N>);
}
