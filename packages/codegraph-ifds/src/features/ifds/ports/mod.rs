//! IFDS ports
//!
//! Contracts between the solver and its collaborators: the graph provider,
//! the flow functions and whoever watches or cancels a run.

pub mod flow_functions;
pub mod icfg;
pub mod status;

pub use flow_functions::{FlowEdge, FlowFunctions};
pub use icfg::InterproceduralCfg;
pub use status::{MemoryBoundedSolver, PropagationResultListener, SolverStatusListener};
