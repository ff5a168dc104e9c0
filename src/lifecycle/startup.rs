//! Startup orchestration.
//!
//! # Responsibilities
//! - Initialize subsystems in dependency order (client, keystore, tools)
//! - Check the node's chain id in the background
//! - Run the configured transport until EOF or shutdown
//!
//! Nothing here touches the network synchronously: an MCP host must get its
//! `initialize` answer even when the RPC node is down.

use std::sync::Arc;
use tokio::net::TcpListener;

use crate::blockchain::{BlockchainResult, RootstockClient, WalletManager};
use crate::config::{ServerConfig, Transport};
use crate::lifecycle::Shutdown;
use crate::mcp::transport::{self, http::AppState};
use crate::mcp::McpServer;
use crate::tools::{rootstock_registry, ToolContext};

/// Fully wired server, ready to attach to a transport.
pub struct Runtime {
    pub server: Arc<McpServer>,
    pub client: RootstockClient,
}

/// Wire the RPC client, keystore and tool registry.
pub fn build_runtime(config: &ServerConfig, wallets: WalletManager) -> BlockchainResult<Runtime> {
    let client = RootstockClient::new(config.network.clone())?;
    let wallets = Arc::new(wallets);

    for (kind, artifact) in [
        ("ERC20", &config.contracts.erc20_artifact),
        ("ERC721", &config.contracts.erc721_artifact),
    ] {
        if let Some(path) = artifact {
            if !path.exists() {
                tracing::warn!(kind = kind, path = %path.display(), "Configured contract artifact not found");
            }
        }
    }

    let ctx = Arc::new(ToolContext::new(
        client.clone(),
        wallets.clone(),
        config.contracts.clone(),
    ));
    let registry = rootstock_registry(ctx);
    tracing::info!(
        tools = registry.len(),
        wallets = wallets.len(),
        network = %config.network.network_name,
        "Tool registry ready"
    );

    let server = Arc::new(McpServer::new(config.server.name.clone(), registry));
    Ok(Runtime { server, client })
}

impl Runtime {
    /// Log a warning if the node reports a different chain than configured.
    pub fn spawn_chain_check(&self) {
        let client = self.client.clone();
        tokio::spawn(async move {
            match client.verify_chain_id().await {
                Ok(()) => tracing::info!(chain_id = client.chain_id(), "Connected to Rootstock node"),
                Err(e) => tracing::warn!(error = %e, "Chain verification failed; tools will retry on use"),
            }
        });
    }

    /// Run the configured transport until it finishes or `shutdown` fires.
    pub async fn serve(self, config: &ServerConfig, shutdown: &Shutdown) -> std::io::Result<()> {
        match config.server.transport {
            Transport::Stdio => {
                transport::serve_stdio(self.server, config.server.max_body_bytes, shutdown.subscribe())
                    .await
            }
            Transport::Http => {
                let listener = TcpListener::bind(&config.server.bind_address).await?;
                let state = AppState {
                    server: self.server,
                    client: self.client,
                };
                transport::serve_http(listener, state, &config.server, shutdown.wait()).await
            }
        }
    }
}
