//! Preset configurations
//!
//! Presets provide complete default configurations for common use cases.

use serde::{Deserialize, Serialize};

use super::error::ConfigError;

/// Configuration preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    /// CI/CD: tight limits, existence-only results
    ///
    /// - Solver: 5 join-point neighbors, 30 callees, path length 50
    /// - Paths: context-insensitive source finder, no statement paths
    Fast,

    /// Development: the solver's reference defaults
    ///
    /// - Solver: 10 join-point neighbors, 75 callees, path length 100
    /// - Paths: context-sensitive, no statement paths
    Balanced,

    /// Security Audit: generous limits and precise paths
    ///
    /// - Solver: 25 join-point neighbors, 150 callees, path length 250
    /// - Paths: context-sensitive, precise statement paths
    Thorough,

    /// Custom: User-defined (YAML only)
    ///
    /// Starts from the balanced defaults.
    Custom,
}

impl Preset {
    /// Convert to string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fast => "fast",
            Self::Balanced => "balanced",
            Self::Thorough => "thorough",
            Self::Custom => "custom",
        }
    }
}

impl std::str::FromStr for Preset {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fast" => Ok(Self::Fast),
            "balanced" => Ok(Self::Balanced),
            "thorough" => Ok(Self::Thorough),
            "custom" => Ok(Self::Custom),
            _ => Err(ConfigError::UnknownPreset(s.to_string())),
        }
    }
}

impl Default for Preset {
    fn default() -> Self {
        Self::Balanced
    }
}

impl std::fmt::Display for Preset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
