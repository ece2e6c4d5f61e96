//! Path reconstruction domain: partial paths and result records

pub mod result;
pub mod source_context_and_path;

pub use result::{InfoflowResults, ResultRecord};
pub use source_context_and_path::SourceContextAndPath;
