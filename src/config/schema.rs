//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the server.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration for the Rootstock MCP server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// MCP transport and HTTP listener settings.
    pub server: McpConfig,

    /// Rootstock network and RPC settings.
    pub network: NetworkConfig,

    /// Contract artifacts used by the deploy tools.
    pub contracts: ContractsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Transport used to speak MCP with the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    /// Newline-delimited JSON-RPC over stdin/stdout.
    #[default]
    Stdio,
    /// JSON-RPC over HTTP POST.
    Http,
}

impl std::str::FromStr for Transport {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stdio" => Ok(Transport::Stdio),
            "http" => Ok(Transport::Http),
            other => Err(format!("unknown transport '{}'", other)),
        }
    }
}

/// MCP server settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct McpConfig {
    /// Server name reported during `initialize`.
    pub name: String,

    /// Transport to serve on.
    pub transport: Transport,

    /// Bind address for the HTTP transport (e.g., "127.0.0.1:3000").
    pub bind_address: String,

    /// Per-request timeout for the HTTP transport in seconds.
    pub request_timeout_secs: u64,

    /// Maximum message size in bytes (HTTP body or stdio line).
    pub max_body_bytes: usize,
}

impl Default for McpConfig {
    fn default() -> Self {
        Self {
            name: "rootstock-mcp".to_string(),
            transport: Transport::Stdio,
            bind_address: "127.0.0.1:3000".to_string(),
            request_timeout_secs: 120,
            max_body_bytes: 1024 * 1024,
        }
    }
}

/// Rootstock network configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// JSON-RPC endpoint URL.
    pub rpc_url: String,

    /// Failover JSON-RPC endpoint URLs.
    pub failover_urls: Vec<String>,

    /// Chain ID (30 for Rootstock mainnet, 31 for testnet).
    pub chain_id: u64,

    /// Human-readable network name.
    pub network_name: String,

    /// Block explorer base URL.
    pub explorer_url: Option<String>,

    /// Native currency symbol.
    pub currency_symbol: String,

    /// RPC request timeout in seconds.
    pub rpc_timeout_secs: u64,

    /// Number of block confirmations to wait for after broadcasting.
    pub confirmation_blocks: u32,

    /// Maximum time to wait for confirmations in seconds.
    pub confirmation_timeout_secs: u64,

    /// Receipt polling interval in milliseconds.
    pub poll_interval_ms: u64,

    /// Gas price multiplier (1.0 = node price, 1.1 = 10% buffer).
    pub gas_price_multiplier: f64,

    /// Maximum gas price in gwei (protection against spikes).
    pub max_gas_price_gwei: u64,

    /// Gas limit used when a tool call does not provide one.
    pub default_gas_limit: Option<u64>,

    /// Gas price in wei used instead of the node's price.
    pub default_gas_price_wei: Option<u128>,
}

impl NetworkConfig {
    /// Public Rootstock mainnet defaults.
    pub fn mainnet() -> Self {
        Self {
            rpc_url: "https://public-node.rsk.co".to_string(),
            chain_id: 30,
            network_name: "Rootstock Mainnet".to_string(),
            explorer_url: Some("https://explorer.rootstock.io".to_string()),
            currency_symbol: "RBTC".to_string(),
            ..Self::default()
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            rpc_url: "https://public-node.testnet.rsk.co".to_string(),
            failover_urls: Vec::new(),
            chain_id: 31,
            network_name: "Rootstock Testnet".to_string(),
            explorer_url: Some("https://explorer.testnet.rootstock.io".to_string()),
            currency_symbol: "tRBTC".to_string(),
            rpc_timeout_secs: 30,
            confirmation_blocks: 1,
            confirmation_timeout_secs: 300,
            poll_interval_ms: 2000,
            gas_price_multiplier: 1.1,
            max_gas_price_gwei: 1000,
            default_gas_limit: None,
            default_gas_price_wei: None,
        }
    }
}

/// Compiled contract artifacts for the deploy tools.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ContractsConfig {
    /// Path to an ERC20 artifact JSON (Hardhat or Foundry layout).
    pub erc20_artifact: Option<PathBuf>,

    /// Path to an ERC721 artifact JSON (Hardhat or Foundry layout).
    pub erc721_artifact: Option<PathBuf>,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
