//! Structured logging.
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - JSON format for production, pretty format for development
//! - Log level configurable via config; `RUST_LOG` wins when set
//! - Always writes to stderr: stdout carries the MCP stdio transport

use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, ObservabilityConfig};

/// Install the global tracing subscriber.
pub fn init_logging(config: &ObservabilityConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directives(&config.log_level)))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false);

    match config.log_format {
        LogFormat::Json => builder.json().try_init()?,
        LogFormat::Pretty => builder.with_target(false).try_init()?,
    }

    Ok(())
}

fn default_directives(level: &str) -> String {
    format!("rootstock_mcp={level},tower_http={level},warn")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives_parse() {
        let directives = default_directives("debug");
        assert!(directives.starts_with("rootstock_mcp=debug"));
        assert!(EnvFilter::try_new(directives).is_ok());
    }
}
