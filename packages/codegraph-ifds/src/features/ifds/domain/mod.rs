//! IFDS domain model
//!
//! Facts, access paths and the values the solver and path builders exchange.

pub mod access_path;
pub mod fact;
pub mod path_edge;
pub mod seeds;
pub mod sink;
pub mod source_context;

pub use access_path::AccessPath;
pub use fact::{Fact, FactArena, FactId, FactKey, FactValue};
pub use path_edge::PathEdge;
pub use seeds::InitialSeeds;
pub use sink::AbstractionAtSink;
pub use source_context::{SourceContext, SourceSinkDefinition};
