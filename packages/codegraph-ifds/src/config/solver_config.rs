//! IFDS solver configuration
//!
//! Limits follow the convention of the tabulation solver: `-1` means
//! unbounded, every other negative value is rejected by [`Validatable`].

use serde::{Deserialize, Serialize};

use super::error::{check_limit, ConfigError, ConfigResult};
use super::preset::Preset;
use super::validation::Validatable;
use crate::features::ifds::infrastructure::scheduling::SchedulingStrategy;

/// How the predecessor of a fact returned from a callee is rewritten
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredecessorShorteningMode {
    /// Keep the callee-internal history on every returned fact
    NeverShorten,
    /// Reuse the caller-side fact when the callee returned it unchanged
    ShortenIfEqual,
    /// Always link returned facts directly to the caller-side fact
    AlwaysShorten,
}

impl Default for PredecessorShorteningMode {
    fn default() -> Self {
        Self::NeverShorten
    }
}

impl std::str::FromStr for PredecessorShorteningMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "never_shorten" | "never" => Ok(Self::NeverShorten),
            "shorten_if_equal" | "if_equal" => Ok(Self::ShortenIfEqual),
            "always_shorten" | "always" => Ok(Self::AlwaysShorten),
            _ => Err(ConfigError::unknown_variant(
                "predecessor shortening mode",
                s,
                &["never_shorten", "shorten_if_equal", "always_shorten"],
            )),
        }
    }
}

/// IFDS solver configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Maximum neighbors recorded per fact at a join point (-1 = unbounded)
    pub max_join_point_abstractions: i32,

    /// Call sites with more callees than this are not expanded (-1 = unbounded)
    pub max_callees_per_call_site: i32,

    /// Facts longer than this are dropped from propagation (-1 = unbounded)
    pub max_abstraction_path_length: i32,

    /// Worker threads (0 = 75% of available cores)
    pub num_threads: usize,

    /// Pool vs. local worklist placement of propagated edges
    pub scheduling_strategy: SchedulingStrategy,

    /// Predecessor rewriting across return edges
    pub shortening_mode: PredecessorShorteningMode,

    /// Propagate zero-derived facts out of methods with no incoming calls
    pub follow_returns_past_seeds: bool,
}

impl SolverConfig {
    /// Create from preset
    pub fn from_preset(preset: Preset) -> Self {
        let base = Self {
            max_join_point_abstractions: 10,
            max_callees_per_call_site: 75,
            max_abstraction_path_length: 100,
            num_threads: 0,
            scheduling_strategy: SchedulingStrategy::EachEdgeIndividually,
            shortening_mode: PredecessorShorteningMode::NeverShorten,
            follow_returns_past_seeds: true,
        };

        match preset {
            Preset::Fast => Self {
                max_join_point_abstractions: 5,
                max_callees_per_call_site: 30,
                max_abstraction_path_length: 50,
                scheduling_strategy: SchedulingStrategy::EachMethodIndividually,
                ..base
            },
            Preset::Balanced | Preset::Custom => base,
            Preset::Thorough => Self {
                max_join_point_abstractions: 25,
                max_callees_per_call_site: 150,
                max_abstraction_path_length: 250,
                ..base
            },
        }
    }

    /// Neighbor cap as an optional bound
    pub fn join_point_limit(&self) -> Option<usize> {
        limit(self.max_join_point_abstractions)
    }

    /// Callee cap as an optional bound
    pub fn callee_limit(&self) -> Option<usize> {
        limit(self.max_callees_per_call_site)
    }

    /// Path length cap as an optional bound
    pub fn path_length_limit(&self) -> Option<usize> {
        limit(self.max_abstraction_path_length)
    }

    /// Builder: Set max_join_point_abstractions
    pub fn max_join_point_abstractions(mut self, v: i32) -> Self {
        self.max_join_point_abstractions = v;
        self
    }

    /// Builder: Set max_callees_per_call_site
    pub fn max_callees_per_call_site(mut self, v: i32) -> Self {
        self.max_callees_per_call_site = v;
        self
    }

    /// Builder: Set max_abstraction_path_length
    pub fn max_abstraction_path_length(mut self, v: i32) -> Self {
        self.max_abstraction_path_length = v;
        self
    }

    /// Builder: Set num_threads
    pub fn num_threads(mut self, v: usize) -> Self {
        self.num_threads = v;
        self
    }

    /// Builder: Set scheduling_strategy
    pub fn scheduling_strategy(mut self, v: SchedulingStrategy) -> Self {
        self.scheduling_strategy = v;
        self
    }

    /// Builder: Set shortening_mode
    pub fn shortening_mode(mut self, v: PredecessorShorteningMode) -> Self {
        self.shortening_mode = v;
        self
    }

    /// Builder: Set follow_returns_past_seeds
    pub fn follow_returns_past_seeds(mut self, v: bool) -> Self {
        self.follow_returns_past_seeds = v;
        self
    }
}

fn limit(value: i32) -> Option<usize> {
    usize::try_from(value).ok()
}

impl Validatable for SolverConfig {
    fn validate(&self) -> ConfigResult<()> {
        check_limit(
            "max_join_point_abstractions",
            self.max_join_point_abstractions,
            "Use -1 to record every neighbor",
        )?;
        check_limit(
            "max_callees_per_call_site",
            self.max_callees_per_call_site,
            "Use -1 to expand every callee",
        )?;
        check_limit(
            "max_abstraction_path_length",
            self.max_abstraction_path_length,
            "Use -1 to disable path length pruning",
        )?;

        if self.num_threads > 1024 {
            return Err(ConfigError::range_with_hint(
                "num_threads",
                self.num_threads,
                0,
                1024,
                "Use 0 to size the pool from the available cores",
            ));
        }

        Ok(())
    }

    fn config_name(&self) -> &'static str {
        "SolverConfig"
    }
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self::from_preset(Preset::Balanced)
    }
}
