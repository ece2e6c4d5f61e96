//! Cancellation and status notification contracts

use std::sync::Arc;

use crate::features::ifds::domain::AbstractionAtSink;
use crate::features::ifds::infrastructure::termination::TerminationReason;

/// A solver-like component that can be stopped from another thread
///
/// Implemented by the IFDS solver and every path builder. A memory monitor or
/// [`TimeoutWatcher`](crate::features::ifds::TimeoutWatcher) calls
/// [`force_terminate`](Self::force_terminate); the component returns promptly
/// and keeps what it computed so far.
pub trait MemoryBoundedSolver: Send + Sync {
    /// Raise the kill flag, interrupt and shut down the executor
    fn force_terminate(&self, reason: TerminationReason);

    /// Killed, or finished its last run
    fn is_terminated(&self) -> bool;

    fn is_killed(&self) -> bool;

    /// Clear the kill flag; accumulated results are kept
    fn reset(&self);

    fn termination_reason(&self) -> Option<TerminationReason>;

    fn add_status_listener(&self, listener: Arc<dyn SolverStatusListener>);
}

/// Start/stop notifications from a [`MemoryBoundedSolver`]
pub trait SolverStatusListener: Send + Sync {
    fn on_solver_started(&self, solver: &dyn MemoryBoundedSolver);

    fn on_solver_terminated(&self, solver: &dyn MemoryBoundedSolver);
}

/// Streaming consumer of facts reaching sinks
pub trait PropagationResultListener<N>: Send + Sync {
    /// Return `false` to ask the solver to stop
    fn on_result_available(&self, result: &AbstractionAtSink<N>) -> bool;
}
