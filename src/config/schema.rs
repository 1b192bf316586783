//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the dev
//! front. All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Key looked up in env files when none is configured.
pub const DEFAULT_ENV_VAR: &str = "VITE_WEB_SERVER";

/// Environment variable naming the active run mode.
pub const MODE_ENV_VAR: &str = "NODE_ENV";

/// Run mode used when neither the options nor the environment name one.
pub const DEFAULT_MODE: &str = "development";

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct DevConfig {
    /// Listener and upstream settings.
    pub server: ServerConfig,

    /// Allowlist plugin options.
    pub allowlist: AllowlistOptions,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener and upstream configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Development server to forward allowed requests to (e.g., "127.0.0.1:5173").
    pub upstream: String,

    /// Request timeout (total time for request/response) in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            upstream: "127.0.0.1:5173".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Options accepted by the allowlist plugin.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AllowlistOptions {
    /// Addresses allowed regardless of env files.
    pub allowlist: Vec<String>,

    /// Env files to read, in order. `None` means `.env` and `.env.<mode>`.
    pub env_files: Option<EnvFiles>,

    /// Key whose value lists allowed addresses inside env files.
    pub env_var: String,

    /// Always allow `127.0.0.1` and `::1`.
    pub allow_localhost: bool,

    /// Run mode for the default env file; falls back to `NODE_ENV`.
    pub mode: Option<String>,
}

impl Default for AllowlistOptions {
    fn default() -> Self {
        Self {
            allowlist: Vec::new(),
            env_files: None,
            env_var: DEFAULT_ENV_VAR.to_string(),
            allow_localhost: true,
            mode: None,
        }
    }
}

impl AllowlistOptions {
    /// Env files to read, with defaults applied.
    pub fn env_files(&self) -> Vec<String> {
        match &self.env_files {
            Some(files) => files.to_vec(),
            None => EnvFiles::defaults_for_mode(&self.resolved_mode()).to_vec(),
        }
    }

    /// Active run mode: explicit option, then `NODE_ENV`, then `development`.
    pub fn resolved_mode(&self) -> String {
        self.mode
            .clone()
            .filter(|m| !m.is_empty())
            .or_else(|| std::env::var(MODE_ENV_VAR).ok().filter(|m| !m.is_empty()))
            .unwrap_or_else(|| DEFAULT_MODE.to_string())
    }
}

/// One env file path or a list of them.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum EnvFiles {
    One(String),
    Many(Vec<String>),
}

impl EnvFiles {
    /// `.env` followed by `.env.<mode>`.
    pub fn defaults_for_mode(mode: &str) -> Self {
        EnvFiles::Many(vec![".env".to_string(), format!(".env.{mode}")])
    }

    pub fn to_vec(&self) -> Vec<String> {
        match self {
            EnvFiles::One(path) => vec![path.clone()],
            EnvFiles::Many(paths) => paths.clone(),
        }
    }
}

impl From<Vec<String>> for EnvFiles {
    fn from(paths: Vec<String>) -> Self {
        EnvFiles::Many(paths)
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
