//! Path reconstruction configuration

use serde::{Deserialize, Serialize};

use super::error::{ConfigError, ConfigResult};
use super::preset::Preset;
use super::validation::Validatable;

/// Path builder variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathBuildingAlgorithm {
    /// No reconstruction, sink facts only
    None,
    /// Existence check with per-task visitation flags
    ContextInsensitiveSourceFinder,
    /// Statement paths without call/return matching
    ContextInsensitive,
    /// Statement paths with call-stack realizability checks
    ContextSensitive,
}

impl PathBuildingAlgorithm {
    const NAMES: [&'static str; 4] = [
        "none",
        "context_insensitive_source_finder",
        "context_insensitive",
        "context_sensitive",
    ];
}

impl Default for PathBuildingAlgorithm {
    fn default() -> Self {
        Self::ContextSensitive
    }
}

impl std::str::FromStr for PathBuildingAlgorithm {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "none" => Ok(Self::None),
            "context_insensitive_source_finder" | "source_finder" => {
                Ok(Self::ContextInsensitiveSourceFinder)
            }
            "context_insensitive" => Ok(Self::ContextInsensitive),
            "context_sensitive" => Ok(Self::ContextSensitive),
            _ => Err(ConfigError::unknown_variant(
                "path building algorithm",
                s,
                &Self::NAMES,
            )),
        }
    }
}

/// Whether statement paths are materialized in results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathReconstructionMode {
    /// Only source/sink pairs
    NoPaths,
    /// Statement paths, solver may shorten predecessors
    Fast,
    /// Statement paths, solver never shortens predecessors
    Precise,
}

impl PathReconstructionMode {
    /// Whether paths are recorded at all
    pub fn reconstruct_paths(&self) -> bool {
        !matches!(self, Self::NoPaths)
    }
}

impl Default for PathReconstructionMode {
    fn default() -> Self {
        Self::NoPaths
    }
}

/// Path builder configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathConfig {
    /// Which path builder to create
    pub path_building_algorithm: PathBuildingAlgorithm,

    /// Statement path materialization
    pub path_reconstruction_mode: PathReconstructionMode,

    /// Recorded partial paths per fact (0 = unbounded)
    pub max_paths_per_abstraction: usize,

    /// Longest statement path kept (0 = unbounded)
    pub max_path_length: usize,

    /// Deepest call stack tracked per path (0 = unbounded)
    pub max_call_stack_size: usize,

    /// Seconds the driving thread waits for reconstruction (0 = no limit)
    pub path_reconstruction_timeout_secs: u64,

    /// Sink facts per batch of the batching decorator (1..=10000)
    pub batch_size: usize,

    /// Drain the executor after every sink fact
    pub sequential_path_processing: bool,

    /// Results that differ only in their path are merged
    pub path_agnostic_results: bool,

    /// Worker threads (0 = 75% of available cores)
    pub num_threads: usize,
}

impl PathConfig {
    /// Create from preset
    pub fn from_preset(preset: Preset) -> Self {
        let base = Self {
            path_building_algorithm: PathBuildingAlgorithm::ContextSensitive,
            path_reconstruction_mode: PathReconstructionMode::NoPaths,
            max_paths_per_abstraction: 15,
            max_path_length: 75,
            max_call_stack_size: 30,
            path_reconstruction_timeout_secs: 0,
            batch_size: 5,
            sequential_path_processing: false,
            path_agnostic_results: true,
            num_threads: 0,
        };

        match preset {
            Preset::Fast => Self {
                path_building_algorithm: PathBuildingAlgorithm::ContextInsensitiveSourceFinder,
                path_reconstruction_timeout_secs: 60,
                ..base
            },
            Preset::Balanced | Preset::Custom => base,
            Preset::Thorough => Self {
                path_reconstruction_mode: PathReconstructionMode::Precise,
                max_paths_per_abstraction: 50,
                max_path_length: 200,
                max_call_stack_size: 60,
                ..base
            },
        }
    }

    /// Reconstruction timeout, if any
    pub fn reconstruction_timeout(&self) -> Option<std::time::Duration> {
        (self.path_reconstruction_timeout_secs > 0)
            .then(|| std::time::Duration::from_secs(self.path_reconstruction_timeout_secs))
    }

    /// Builder: Set path_building_algorithm
    pub fn path_building_algorithm(mut self, v: PathBuildingAlgorithm) -> Self {
        self.path_building_algorithm = v;
        self
    }

    /// Builder: Set path_reconstruction_mode
    pub fn path_reconstruction_mode(mut self, v: PathReconstructionMode) -> Self {
        self.path_reconstruction_mode = v;
        self
    }

    /// Builder: Set max_paths_per_abstraction
    pub fn max_paths_per_abstraction(mut self, v: usize) -> Self {
        self.max_paths_per_abstraction = v;
        self
    }

    /// Builder: Set max_path_length
    pub fn max_path_length(mut self, v: usize) -> Self {
        self.max_path_length = v;
        self
    }

    /// Builder: Set max_call_stack_size
    pub fn max_call_stack_size(mut self, v: usize) -> Self {
        self.max_call_stack_size = v;
        self
    }

    /// Builder: Set path_reconstruction_timeout_secs
    pub fn path_reconstruction_timeout_secs(mut self, v: u64) -> Self {
        self.path_reconstruction_timeout_secs = v;
        self
    }

    /// Builder: Set batch_size
    pub fn batch_size(mut self, v: usize) -> Self {
        self.batch_size = v;
        self
    }

    /// Builder: Set sequential_path_processing
    pub fn sequential_path_processing(mut self, v: bool) -> Self {
        self.sequential_path_processing = v;
        self
    }

    /// Builder: Set path_agnostic_results
    pub fn path_agnostic_results(mut self, v: bool) -> Self {
        self.path_agnostic_results = v;
        self
    }

    /// Builder: Set num_threads
    pub fn num_threads(mut self, v: usize) -> Self {
        self.num_threads = v;
        self
    }
}

impl Validatable for PathConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.batch_size == 0 || self.batch_size > 10000 {
            return Err(ConfigError::range_with_hint(
                "batch_size",
                self.batch_size,
                1,
                10000,
                "A batch must hold at least one sink",
            ));
        }

        if self.path_reconstruction_timeout_secs > 86400 {
            return Err(ConfigError::range_with_hint(
                "path_reconstruction_timeout_secs",
                self.path_reconstruction_timeout_secs,
                0,
                86400,
                "Path reconstruction timeout should be at most one day",
            ));
        }

        if self.num_threads > 1024 {
            return Err(ConfigError::range_with_hint(
                "num_threads",
                self.num_threads,
                0,
                1024,
                "Use 0 to size the pool from the available cores",
            ));
        }

        if self.path_building_algorithm == PathBuildingAlgorithm::ContextInsensitiveSourceFinder
            && self.path_reconstruction_mode.reconstruct_paths()
        {
            return Err(ConfigError::Validation(
                "context_insensitive_source_finder cannot reconstruct statement paths; \
                 use path_reconstruction_mode: no_paths"
                    .to_string(),
            ));
        }

        Ok(())
    }

    fn config_name(&self) -> &'static str {
        "PathConfig"
    }
}

impl Default for PathConfig {
    fn default() -> Self {
        Self::from_preset(Preset::Balanced)
    }
}
