//! Feature modules
//!
//! - `ifds`: the interprocedural dataflow solver
//! - `path_reconstruction`: source-to-sink path builders on top of its facts

pub mod ifds;
pub mod path_reconstruction;
