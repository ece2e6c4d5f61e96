// Path reconstruction
//
// Walks the fact graph left by the IFDS solver backwards, from facts at
// sinks to the root facts that carry a source context.
//
// - domain: partial paths (SourceContextAndPath), result records
// - ports: AbstractionPathBuilder contract, result handlers
// - infrastructure: builder variants, batching decorator, factory

pub mod domain;
pub mod infrastructure;
pub mod ports;

pub use domain::{InfoflowResults, ResultRecord, SourceContextAndPath};

pub use infrastructure::{
    BatchPathBuilder, ContextInsensitivePathBuilder, ContextInsensitiveSourceFinder,
    ContextSensitivePathBuilder, EmptyPathBuilder, PathBuilderFactory,
};

pub use ports::{AbstractionPathBuilder, PathResultListener};
