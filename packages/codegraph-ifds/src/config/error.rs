//! Configuration error types

use thiserror::Error;

/// Configuration error type
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Range validation error
    #[error("Invalid range for field '{field}': {value} not in {min}..={max}. {hint}")]
    Range {
        field: String,
        value: String,
        min: String,
        max: String,
        hint: String,
    },

    /// Missing version field in YAML
    #[error("Missing 'version' field in configuration file. Add 'version: 1' to the top of your YAML file.")]
    MissingVersion,

    /// Unsupported version
    #[error("Unsupported configuration version {found}. Supported versions: {}", supported.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(", "))]
    UnsupportedVersion { found: u32, supported: Vec<u32> },

    /// Unknown preset name
    #[error("Unknown preset '{0}'. Valid presets: fast, balanced, thorough, custom")]
    UnknownPreset(String),

    /// Unknown enum value (strategy, mode, algorithm)
    #[error("Unknown {kind} '{value}'. Valid values: {}", valid.join(", "))]
    UnknownVariant {
        kind: &'static str,
        value: String,
        valid: Vec<&'static str>,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Cross-field validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Configuration result type
pub type ConfigResult<T> = Result<T, ConfigError>;

impl ConfigError {
    /// Create a range error with a hint
    pub fn range_with_hint(
        field: impl Into<String>,
        value: impl ToString,
        min: impl ToString,
        max: impl ToString,
        hint: impl Into<String>,
    ) -> Self {
        Self::Range {
            field: field.into(),
            value: value.to_string(),
            min: min.to_string(),
            max: max.to_string(),
            hint: hint.into(),
        }
    }

    /// Create an unknown-variant error
    pub fn unknown_variant(
        kind: &'static str,
        value: impl Into<String>,
        valid: &[&'static str],
    ) -> Self {
        Self::UnknownVariant {
            kind,
            value: value.into(),
            valid: valid.to_vec(),
        }
    }
}

/// Validate a signed limit where `-1` means unbounded
pub(crate) fn check_limit(field: &str, value: i32, hint: &str) -> ConfigResult<()> {
    if value < -1 {
        return Err(ConfigError::range_with_hint(field, value, -1, i32::MAX, hint));
    }
    Ok(())
}
