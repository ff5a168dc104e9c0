//! Rootstock MCP server.
//!
//! ```text
//!     MCP host (Claude Desktop, IDE, agent runtime)
//!         │  JSON-RPC over stdio or HTTP
//!         ▼
//!     ┌──────────────────────────────────────────────┐
//!     │ mcp::transport → mcp::server → tools::*      │
//!     │                                  │           │
//!     │            blockchain::{wallet, client,      │
//!     │              transaction, contracts, tokens} │
//!     └──────────────────────────────────┬───────────┘
//!                                        ▼
//!                               Rootstock JSON-RPC node
//! ```

use clap::Parser;
use std::path::PathBuf;

use rootstock_mcp::blockchain::WalletManager;
use rootstock_mcp::config::{load_config, validation::validate_config, ConfigError, Transport};
use rootstock_mcp::lifecycle::{build_runtime, signals::spawn_signal_handler, Shutdown};
use rootstock_mcp::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "rootstock-mcp")]
#[command(about = "Model Context Protocol server for the Rootstock blockchain", version)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Transport to serve: stdio or http
    #[arg(short, long)]
    transport: Option<Transport>,

    /// Bind address for the HTTP transport
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(transport) = cli.transport {
        config.server.transport = transport;
    }
    if let Some(bind) = cli.bind {
        config.server.bind_address = bind;
    }
    validate_config(&config).map_err(ConfigError::Validation)?;

    logging::init_logging(&config.observability)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "rootstock-mcp starting");
    tracing::info!(
        transport = ?config.server.transport,
        rpc_url = %config.network.rpc_url,
        chain_id = config.network.chain_id,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let wallets = WalletManager::from_env(config.network.chain_id)?;
    let runtime = build_runtime(&config, wallets)?;
    runtime.spawn_chain_check();

    let shutdown = Shutdown::new();
    spawn_signal_handler(shutdown.clone());

    runtime.serve(&config, &shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
