//! Builder used when path reconstruction is disabled

use std::sync::Arc;

use crate::errors::Result;
use crate::features::ifds::domain::AbstractionAtSink;
use crate::features::ifds::infrastructure::termination::{TerminationReason, TerminationState};
use crate::features::ifds::ports::{MemoryBoundedSolver, SolverStatusListener};
use crate::features::path_reconstruction::domain::InfoflowResults;
use crate::features::path_reconstruction::ports::{AbstractionPathBuilder, PathResultListener};
use crate::shared::GraphKey;

/// Accepts sink facts and reports nothing
pub struct EmptyPathBuilder<N: GraphKey> {
    results: Arc<InfoflowResults<N>>,
    termination: TerminationState,
}

impl<N: GraphKey> EmptyPathBuilder<N> {
    pub fn new() -> Self {
        Self {
            results: Arc::new(InfoflowResults::new(true)),
            termination: TerminationState::new(),
        }
    }
}

impl<N: GraphKey> AbstractionPathBuilder<N> for EmptyPathBuilder<N> {
    fn compute_taint_paths(&self, _sinks: &[AbstractionAtSink<N>]) -> Result<()> {
        Ok(())
    }

    fn run_incremental_path_computation(&self) -> Result<()> {
        Ok(())
    }

    fn results(&self) -> Arc<InfoflowResults<N>> {
        Arc::clone(&self.results)
    }

    fn add_result_available_handler(&self, _handler: Arc<dyn PathResultListener<N>>) {}
}

impl<N: GraphKey> MemoryBoundedSolver for EmptyPathBuilder<N> {
    fn force_terminate(&self, reason: TerminationReason) {
        self.termination.kill(reason);
    }

    fn is_terminated(&self) -> bool {
        true
    }

    fn is_killed(&self) -> bool {
        self.termination.is_killed()
    }

    fn reset(&self) {
        self.termination.reset();
    }

    fn termination_reason(&self) -> Option<TerminationReason> {
        self.termination.reason()
    }

    fn add_status_listener(&self, listener: Arc<dyn SolverStatusListener>) {
        self.termination.add_listener(listener);
    }
}
