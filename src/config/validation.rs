//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses parse and value ranges (timeouts > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: DevConfig → Result<(), Vec<ValidationError>>
//! - Allowlist entries are not validated; malformed ones simply never match
//! - An empty `allowlist.env_var` is accepted and matches no env file key

use std::net::SocketAddr;

use axum::http::uri::Authority;

use crate::config::schema::DevConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("server.bind_address '{0}' is not a socket address")]
    BindAddress(String),
    #[error("server.upstream '{0}' is not a host:port authority")]
    Upstream(String),
    #[error("server.request_timeout_secs must be greater than zero")]
    ZeroTimeout,
    #[error("observability.metrics_address '{0}' is not a socket address")]
    MetricsAddress(String),
}

/// Check a parsed configuration, collecting every problem found.
pub fn validate_config(config: &DevConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.server.bind_address.clone()));
    }

    let upstream_ok = config
        .server
        .upstream
        .parse::<Authority>()
        .map(|a| a.port_u16().is_some())
        .unwrap_or(false);
    if !upstream_ok {
        errors.push(ValidationError::Upstream(config.server.upstream.clone()));
    }

    if config.server.request_timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
