//! Batching decorator
//!
//! Hands sink facts to the wrapped builder a few at a time, resetting it
//! between batches so per-run caches stay small. Termination reasons of all
//! batches are merged.

use parking_lot::Mutex;
use std::sync::Arc;
use tracing::info;

use crate::errors::Result;
use crate::features::ifds::domain::AbstractionAtSink;
use crate::features::ifds::infrastructure::termination::{TerminationReason, TerminationState};
use crate::features::ifds::ports::{MemoryBoundedSolver, SolverStatusListener};
use crate::features::path_reconstruction::domain::InfoflowResults;
use crate::features::path_reconstruction::ports::{AbstractionPathBuilder, PathResultListener};
use crate::shared::GraphKey;

pub struct BatchPathBuilder<N: GraphKey> {
    inner: Box<dyn AbstractionPathBuilder<N>>,
    batch_size: usize,
    // kills from outside must survive the inner reset between batches
    termination: TerminationState,
    batch_reasons: Mutex<Option<TerminationReason>>,
}

impl<N: GraphKey> BatchPathBuilder<N> {
    pub fn new(inner: Box<dyn AbstractionPathBuilder<N>>, batch_size: usize) -> Self {
        Self {
            inner,
            batch_size: batch_size.max(1),
            termination: TerminationState::new(),
            batch_reasons: Mutex::new(None),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn inner(&self) -> &dyn AbstractionPathBuilder<N> {
        self.inner.as_ref()
    }
}

impl<N: GraphKey> AbstractionPathBuilder<N> for BatchPathBuilder<N> {
    fn compute_taint_paths(&self, sinks: &[AbstractionAtSink<N>]) -> Result<()> {
        for (idx, batch) in sinks.chunks(self.batch_size).enumerate() {
            if self.termination.is_killed() {
                break;
            }
            info!(
                batch = idx + 1,
                elements = batch.len(),
                "Running path reconstruction batch"
            );
            self.inner.reset();
            let outcome = self.inner.compute_taint_paths(batch);

            let mut reasons = self.batch_reasons.lock();
            *reasons = TerminationReason::merge(reasons.take(), self.inner.termination_reason());
            drop(reasons);

            outcome?;
        }
        Ok(())
    }

    fn run_incremental_path_computation(&self) -> Result<()> {
        self.inner.run_incremental_path_computation()
    }

    fn results(&self) -> Arc<InfoflowResults<N>> {
        self.inner.results()
    }

    fn add_result_available_handler(&self, handler: Arc<dyn PathResultListener<N>>) {
        self.inner.add_result_available_handler(handler);
    }
}

impl<N: GraphKey> MemoryBoundedSolver for BatchPathBuilder<N> {
    fn force_terminate(&self, reason: TerminationReason) {
        self.termination.kill(reason.clone());
        self.inner.force_terminate(reason);
    }

    fn is_terminated(&self) -> bool {
        self.termination.is_killed() || self.inner.is_terminated()
    }

    fn is_killed(&self) -> bool {
        self.termination.is_killed() || self.inner.is_killed()
    }

    fn reset(&self) {
        self.termination.reset();
        self.inner.reset();
    }

    fn termination_reason(&self) -> Option<TerminationReason> {
        TerminationReason::merge(self.batch_reasons.lock().clone(), self.termination.reason())
    }

    fn add_status_listener(&self, listener: Arc<dyn SolverStatusListener>) {
        self.inner.add_status_listener(listener);
    }
}
