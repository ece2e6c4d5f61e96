//! Combined solver + path builder configuration

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::error::{ConfigError, ConfigResult};
use super::io::{ConfigExportV1, ConfigOverrides, SUPPORTED_VERSIONS};
use super::path_config::{PathConfig, PathReconstructionMode};
use super::preset::Preset;
use super::solver_config::{PredecessorShorteningMode, SolverConfig};
use super::validation::Validatable;

/// Complete analysis configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfoflowConfig {
    /// Preset the configuration was derived from
    pub preset: Preset,

    /// Tabulation solver settings
    pub solver: SolverConfig,

    /// Path builder settings
    pub paths: PathConfig,
}

impl InfoflowConfig {
    /// Start from a preset
    pub fn preset(preset: Preset) -> Self {
        Self {
            preset,
            solver: SolverConfig::from_preset(preset),
            paths: PathConfig::from_preset(preset),
        }
    }

    /// Override solver settings
    pub fn solver(mut self, f: impl FnOnce(SolverConfig) -> SolverConfig) -> Self {
        self.solver = f(self.solver);
        self
    }

    /// Override path builder settings
    pub fn paths(mut self, f: impl FnOnce(PathConfig) -> PathConfig) -> Self {
        self.paths = f(self.paths);
        self
    }

    /// Solver settings adjusted for the selected path mode
    ///
    /// Precise paths require the full callee history, so shortening is
    /// switched off regardless of the configured mode.
    pub fn effective_solver_config(&self) -> SolverConfig {
        let mut solver = self.solver.clone();
        if self.paths.path_reconstruction_mode == PathReconstructionMode::Precise {
            solver.shortening_mode = PredecessorShorteningMode::NeverShorten;
        }
        solver
    }

    /// Load from a YAML file
    pub fn from_yaml(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Parse from YAML text
    pub fn from_yaml_str(content: &str) -> ConfigResult<Self> {
        let raw: serde_yaml::Value = serde_yaml::from_str(content)?;
        if raw.get("version").is_none() {
            return Err(ConfigError::MissingVersion);
        }

        let export: ConfigExportV1 = serde_yaml::from_value(raw)?;
        if !SUPPORTED_VERSIONS.contains(&export.version) {
            return Err(ConfigError::UnsupportedVersion {
                found: export.version,
                supported: SUPPORTED_VERSIONS.to_vec(),
            });
        }

        let preset: Preset = export.preset.parse()?;
        let mut config = Self::preset(preset);
        if let Some(overrides) = export.overrides {
            if let Some(solver) = overrides.solver {
                config.solver = solver;
            }
            if let Some(paths) = overrides.paths {
                config.paths = paths;
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Serialize to YAML, writing only the sections that differ from the preset
    pub fn to_yaml(&self) -> ConfigResult<String> {
        let defaults = Self::preset(self.preset);
        let solver = (self.solver != defaults.solver).then(|| self.solver.clone());
        let paths = (self.paths != defaults.paths).then(|| self.paths.clone());
        let overrides = (solver.is_some() || paths.is_some())
            .then_some(ConfigOverrides { solver, paths });

        let export = ConfigExportV1 {
            version: 1,
            preset: self.preset.as_str().to_string(),
            overrides,
        };
        Ok(serde_yaml::to_string(&export)?)
    }

    /// Write to a YAML file
    pub fn save_yaml(&self, path: impl AsRef<Path>) -> ConfigResult<()> {
        std::fs::write(path, self.to_yaml()?)?;
        Ok(())
    }
}

impl Validatable for InfoflowConfig {
    fn validate(&self) -> ConfigResult<()> {
        self.solver.validate()?;
        self.paths.validate()?;
        Ok(())
    }

    fn config_name(&self) -> &'static str {
        "InfoflowConfig"
    }
}

impl Default for InfoflowConfig {
    fn default() -> Self {
        Self::preset(Preset::Balanced)
    }
}
