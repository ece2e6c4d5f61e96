//! Configuration I/O (YAML)
//!
//! Defines YAML schema types. Loading and saving live on
//! [`InfoflowConfig`](super::InfoflowConfig).

use serde::{Deserialize, Serialize};

use super::path_config::PathConfig;
use super::solver_config::SolverConfig;

/// Schema versions this crate can read
pub const SUPPORTED_VERSIONS: [u32; 1] = [1];

/// YAML Schema v1
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigExportV1 {
    /// Schema version (always 1 for v1)
    pub version: u32,

    /// Base preset
    pub preset: String,

    /// Section overrides
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overrides: Option<ConfigOverrides>,
}

/// Configuration overrides
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub solver: Option<SolverConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub paths: Option<PathConfig>,
}
