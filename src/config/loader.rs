//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::DevConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load a TOML configuration file without validating it.
///
/// Callers apply overrides and then run [`validate_config`].
pub fn load_config(path: &Path) -> Result<DevConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: DevConfig = toml::from_str(&content)?;
    Ok(config)
}

/// Load the file at `path` if it exists, otherwise start from defaults.
pub fn load_config_or_default(path: &Path) -> Result<DevConfig, ConfigError> {
    if path.exists() {
        load_config(path)
    } else {
        tracing::debug!(path = %path.display(), "No config file, using defaults");
        Ok(DevConfig::default())
    }
}

/// Validate, wrapping problems into a [`ConfigError`].
pub fn validated(config: DevConfig) -> Result<DevConfig, ConfigError> {
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}
