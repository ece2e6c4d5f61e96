/*
 * Codegraph IFDS - Interprocedural Dataflow Engine
 *
 * Feature-First Hexagonal Architecture:
 * - shared/      : Persistent lists, worker pool sizing
 * - features/    : Vertical slices (ifds solver → path reconstruction)
 * - config/      : Solver and path builder settings (presets + YAML)
 *
 * Algorithm:
 * - Summary-based IFDS tabulation (Naeem/Lhoták/Rodriguez end summaries)
 * - Neighbor merging for path preservation
 * - Memory-bounded pruning with explicit termination reasons
 *
 * Performance:
 * - Rayon worker pools for propagation and path reconstruction
 * - DashMap concurrent tables, append-only fact arena
 */

// Crate-level lint configuration
#![allow(clippy::too_many_arguments)] // Propagation carries the full edge context
#![allow(clippy::type_complexity)] // Concurrent table types
#![allow(clippy::new_without_default)] // Default impl not always needed
#![allow(clippy::module_inception)] // Module naming intentional

// ═══════════════════════════════════════════════════════════════════════════
// Module Exports - Feature-First Architecture
// ═══════════════════════════════════════════════════════════════════════════

/// Shared utilities
pub mod shared;

/// Feature modules (solver, path reconstruction)
pub mod features;

/// Configuration system
pub mod config;

/// Error types
pub mod errors;

// ═══════════════════════════════════════════════════════════════════════════
// Re-exports for Public API
// ═══════════════════════════════════════════════════════════════════════════

pub use config::{
    InfoflowConfig, PathBuildingAlgorithm, PathConfig, PathReconstructionMode,
    PredecessorShorteningMode, Preset, SolverConfig,
};
pub use errors::{Result, SolverError};
pub use features::ifds::{
    AbstractionAtSink, AccessPath, AnalysisContext, Fact, FactArena, FactId, FlowEdge,
    FlowFunctions, IfdsSolver, InitialSeeds, InterproceduralCfg, MemoryBoundedSolver,
    SimpleIcfg, SolveOutcome, SourceContext, SourceSinkDefinition, TaintPropagationResults,
    TerminationReason,
};
pub use features::path_reconstruction::{
    AbstractionPathBuilder, InfoflowResults, PathBuilderFactory, PathResultListener, ResultRecord,
};
