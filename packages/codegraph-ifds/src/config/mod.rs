//! Configuration System
//!
//! Two tiers, mirroring the pipeline configuration of the codegraph engine:
//! - Level 1: Preset - one-liner
//! - Level 2: Builder overrides or YAML for complete control
//!
//! # Examples
//!
//! ```rust,ignore
//! use codegraph_ifds::config::{InfoflowConfig, Preset};
//!
//! let config = InfoflowConfig::preset(Preset::Balanced)
//!     .solver(|s| s.max_callees_per_call_site(20))
//!     .paths(|p| p.batch_size(10));
//!
//! let config = InfoflowConfig::from_yaml("team-security.yaml")?;
//! ```

pub mod error;
pub mod infoflow_config;
pub mod io;
pub mod path_config;
pub mod preset;
pub mod solver_config;
pub mod validation;

// Re-exports
pub use error::{ConfigError, ConfigResult};
pub use infoflow_config::InfoflowConfig;
pub use io::{ConfigExportV1, ConfigOverrides};
pub use path_config::{PathBuildingAlgorithm, PathConfig, PathReconstructionMode};
pub use preset::Preset;
pub use solver_config::{PredecessorShorteningMode, SolverConfig};
pub use validation::Validatable;
