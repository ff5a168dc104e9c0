//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use crate::config::schema::{NetworkConfig, ServerConfig};
use crate::config::validation::{validate_config, ValidationError};

pub const ENV_NETWORK: &str = "ROOTSTOCK_NETWORK";
pub const ENV_RPC_URL: &str = "ROOTSTOCK_RPC_URL";
pub const ENV_CHAIN_ID: &str = "ROOTSTOCK_CHAIN_ID";
pub const ENV_NETWORK_NAME: &str = "ROOTSTOCK_NETWORK_NAME";
pub const ENV_EXPLORER_URL: &str = "ROOTSTOCK_EXPLORER_URL";
pub const ENV_CURRENCY_SYMBOL: &str = "ROOTSTOCK_CURRENCY_SYMBOL";
pub const ENV_DEFAULT_GAS_LIMIT: &str = "ROOTSTOCK_DEFAULT_GAS_LIMIT";
pub const ENV_DEFAULT_GAS_PRICE: &str = "ROOTSTOCK_DEFAULT_GAS_PRICE";
pub const ENV_TRANSPORT: &str = "ROOTSTOCK_MCP_TRANSPORT";
pub const ENV_BIND: &str = "ROOTSTOCK_MCP_BIND";

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Env { var: &'static str, message: String },
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Env { var, message } => write!(f, "Invalid {}: {}", var, message),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Parse a TOML configuration file without validating it.
pub fn read_config_file(path: &Path) -> Result<ServerConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    toml::from_str(&content).map_err(ConfigError::Parse)
}

/// Load configuration: optional TOML file, then process environment, then validation.
pub fn load_config(path: Option<&Path>) -> Result<ServerConfig, ConfigError> {
    load_config_with(path, |key| std::env::var(key).ok())
}

/// Same as [`load_config`] with an explicit environment lookup.
pub fn load_config_with<F>(path: Option<&Path>, env: F) -> Result<ServerConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(path) => read_config_file(path)?,
        None => ServerConfig::default(),
    };

    apply_env_overrides(&mut config, env)?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Apply `ROOTSTOCK_*` environment variables on top of a parsed config.
pub fn apply_env_overrides<F>(config: &mut ServerConfig, env: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let lookup = |key: &str| env(key).filter(|v| !v.trim().is_empty());

    // Preset first so the individual variables below can refine it.
    if let Some(network) = lookup(ENV_NETWORK) {
        let preset = match network.trim().to_ascii_lowercase().as_str() {
            "mainnet" => NetworkConfig::mainnet(),
            "testnet" => NetworkConfig::default(),
            other => {
                return Err(ConfigError::Env {
                    var: ENV_NETWORK,
                    message: format!("unknown network '{}' (expected mainnet or testnet)", other),
                })
            }
        };
        let network = &mut config.network;
        network.rpc_url = preset.rpc_url;
        network.chain_id = preset.chain_id;
        network.network_name = preset.network_name;
        network.explorer_url = preset.explorer_url;
        network.currency_symbol = preset.currency_symbol;
    }
    if let Some(url) = lookup(ENV_RPC_URL) {
        config.network.rpc_url = url;
    }
    if let Some(id) = lookup(ENV_CHAIN_ID) {
        config.network.chain_id = parse_env(ENV_CHAIN_ID, &id)?;
    }
    if let Some(name) = lookup(ENV_NETWORK_NAME) {
        config.network.network_name = name;
    }
    if let Some(url) = lookup(ENV_EXPLORER_URL) {
        config.network.explorer_url = Some(url);
    }
    if let Some(symbol) = lookup(ENV_CURRENCY_SYMBOL) {
        config.network.currency_symbol = symbol;
    }
    if let Some(limit) = lookup(ENV_DEFAULT_GAS_LIMIT) {
        config.network.default_gas_limit = Some(parse_env(ENV_DEFAULT_GAS_LIMIT, &limit)?);
    }
    if let Some(price) = lookup(ENV_DEFAULT_GAS_PRICE) {
        config.network.default_gas_price_wei = Some(parse_env(ENV_DEFAULT_GAS_PRICE, &price)?);
    }
    if let Some(transport) = lookup(ENV_TRANSPORT) {
        config.server.transport = transport.parse().map_err(|message| ConfigError::Env {
            var: ENV_TRANSPORT,
            message,
        })?;
    }
    if let Some(bind) = lookup(ENV_BIND) {
        config.server.bind_address = bind;
    }

    Ok(())
}

fn parse_env<T>(var: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::Env {
        var,
        message: e.to_string(),
    })
}
