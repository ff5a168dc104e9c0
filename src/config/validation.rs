//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, multiplier >= 1)
//! - Check URLs and bind addresses parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::{ServerConfig, Transport};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a configuration, collecting every error found.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let net = &config.network;

    if let Err(e) = url::Url::parse(&net.rpc_url) {
        errors.push(ValidationError::new(
            "network.rpc_url",
            format!("invalid URL '{}': {}", net.rpc_url, e),
        ));
    }

    for (i, failover) in net.failover_urls.iter().enumerate() {
        if url::Url::parse(failover).is_err() {
            errors.push(ValidationError::new(
                &format!("network.failover_urls[{}]", i),
                format!("invalid URL '{}'", failover),
            ));
        }
    }

    if net.chain_id == 0 {
        errors.push(ValidationError::new("network.chain_id", "must be non-zero"));
    }
    if net.rpc_timeout_secs == 0 {
        errors.push(ValidationError::new("network.rpc_timeout_secs", "must be > 0"));
    }
    if net.poll_interval_ms == 0 {
        errors.push(ValidationError::new("network.poll_interval_ms", "must be > 0"));
    }
    if !(net.gas_price_multiplier.is_finite() && net.gas_price_multiplier >= 1.0) {
        errors.push(ValidationError::new(
            "network.gas_price_multiplier",
            "must be a finite number >= 1.0",
        ));
    }
    if net.max_gas_price_gwei == 0 {
        errors.push(ValidationError::new("network.max_gas_price_gwei", "must be > 0"));
    }
    if net.default_gas_limit == Some(0) {
        errors.push(ValidationError::new("network.default_gas_limit", "must be > 0"));
    }

    if config.server.transport == Transport::Http
        && config.server.bind_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "server.bind_address",
            format!("invalid socket address '{}'", config.server.bind_address),
        ));
    }
    if config.server.request_timeout_secs == 0 {
        errors.push(ValidationError::new("server.request_timeout_secs", "must be > 0"));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!(
                "invalid socket address '{}'",
                config.observability.metrics_address
            ),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
