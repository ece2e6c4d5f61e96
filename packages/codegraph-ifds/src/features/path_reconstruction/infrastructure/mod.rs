//! Path builders and their factory

mod base;
pub mod batch;
pub mod context_insensitive;
pub mod context_sensitive;
pub mod empty;
pub mod factory;
pub mod source_finder;

pub use batch::BatchPathBuilder;
pub use context_insensitive::ContextInsensitivePathBuilder;
pub use context_sensitive::ContextSensitivePathBuilder;
pub use empty::EmptyPathBuilder;
pub use factory::PathBuilderFactory;
pub use source_finder::ContextInsensitiveSourceFinder;
