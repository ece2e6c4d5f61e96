// IFDS solver
//
// Hexagonal Architecture:
// - domain: Facts, access paths, seeds, sink hits
// - ports: Graph provider, flow functions, status/cancellation contracts
// - infrastructure: Tables, executor, scheduling, solver, results sink
// - context: Explicit per-run handle (ICFG + fact arena)

pub mod context;
pub mod domain;
pub mod infrastructure;
pub mod ports;

pub use context::AnalysisContext;

pub use domain::{
    AbstractionAtSink, AccessPath, Fact, FactArena, FactId, FactKey, FactValue, InitialSeeds,
    PathEdge, SourceContext, SourceSinkDefinition,
};

pub use infrastructure::{
    IcfgEdge, IcfgEdgeKind, IfdsSolver, InterruptableExecutor, QueueOrder, SchedulingStrategy,
    SimpleIcfg, SolveOutcome, SolverStatsSnapshot, TaintPropagationResults, TerminationReason,
    TimeoutWatcher,
};

pub use ports::{
    FlowEdge, FlowFunctions, InterproceduralCfg, MemoryBoundedSolver, PropagationResultListener,
    SolverStatusListener,
};
