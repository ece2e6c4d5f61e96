//! IFDS infrastructure: tables, scheduling, executor and the solver itself

pub mod executor;
pub mod propagation_results;
pub mod scheduling;
pub mod simple_icfg;
pub mod solver;
pub mod tables;
pub mod termination;
pub mod timeout_watcher;

pub use executor::{InterruptableExecutor, QueueOrder};
pub use propagation_results::TaintPropagationResults;
pub use scheduling::{LocalWorklist, PropagationKind, ScheduleTarget, SchedulingStrategy};
pub use simple_icfg::{IcfgEdge, IcfgEdgeKind, Name, SimpleIcfg};
pub use solver::{IfdsSolver, SolveOutcome, SolverStats, SolverStatsSnapshot};
pub use tables::{EndSummaryTable, IncomingSnapshot, IncomingTable, JumpFunctionTable};
pub use termination::{TerminationReason, TerminationState};
pub use timeout_watcher::TimeoutWatcher;
