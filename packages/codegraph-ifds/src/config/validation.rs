//! Configuration validation
//!
//! Solver and path builder constructors call [`Validatable::validate`] before
//! any worker is spawned.

use super::error::ConfigResult;

/// Trait for validatable configuration objects
///
/// # Example
/// ```rust,ignore
/// use codegraph_ifds::config::{SolverConfig, Validatable};
///
/// let config = SolverConfig::default().max_callees_per_call_site(-5);
/// assert!(config.validate().is_err());
/// ```
pub trait Validatable {
    /// Validate the configuration
    ///
    /// Returns `Ok(())` if valid, `Err(ConfigError)` with details if invalid.
    fn validate(&self) -> ConfigResult<()>;

    /// Get the configuration name for error messages
    fn config_name(&self) -> &'static str {
        "Config"
    }
}
