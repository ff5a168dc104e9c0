//! Rootstock RPC client with timeout and failover.
//!
//! # Responsibilities
//! - Connect to JSON-RPC endpoints (primary + failovers)
//! - Query chain state (blocks, balances, receipts, code)
//! - Sign locally and broadcast transactions
//! - Handle timeouts and network errors gracefully
//! - Provide health check for node connectivity

use alloy::consensus::Transaction as _;
use alloy::eips::BlockNumberOrTag;
use alloy::network::EthereumWallet;
use alloy::primitives::{Address, Bytes, TxHash, U256};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::{TransactionReceipt, TransactionRequest};
use alloy::transports::TransportResult;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use url::Url;

use crate::blockchain::types::{
    BlockInfo, BlockchainError, BlockchainResult, ChainId, NetworkConfig, NetworkInfo,
    TransactionResponse, TransactionStatus,
};
use crate::blockchain::units;
use crate::observability::metrics;

type SharedProvider = Arc<dyn Provider + Send + Sync>;

/// Rootstock JSON-RPC client wrapper with failover support.
#[derive(Clone)]
pub struct RootstockClient {
    /// Read providers (primary first, then failovers).
    providers: Vec<SharedProvider>,
    /// Primary endpoint, used for broadcasting.
    primary_url: Url,
    config: NetworkConfig,
    timeout_duration: Duration,
}

impl RootstockClient {
    /// Create a new client. No network traffic happens here.
    pub fn new(config: NetworkConfig) -> BlockchainResult<Self> {
        let timeout_duration = Duration::from_secs(config.rpc_timeout_secs);

        let primary_url: Url = config.rpc_url.parse().map_err(|e| {
            BlockchainError::Rpc(format!("Invalid RPC URL '{}': {}", config.rpc_url, e))
        })?;

        let mut providers = vec![
            Arc::new(ProviderBuilder::new().connect_http(primary_url.clone())) as SharedProvider,
        ];
        for url_str in &config.failover_urls {
            match url_str.parse::<Url>() {
                Ok(url) => providers.push(Arc::new(ProviderBuilder::new().connect_http(url)) as SharedProvider),
                Err(_) => tracing::warn!(url = %url_str, "Ignoring invalid failover RPC URL"),
            }
        }

        tracing::info!(
            rpc_url = %config.rpc_url,
            failovers = providers.len() - 1,
            chain_id = config.chain_id,
            "Rootstock client initialized"
        );

        Ok(Self {
            providers,
            primary_url,
            config,
            timeout_duration,
        })
    }

    /// Run an RPC call against each provider in turn until one succeeds.
    async fn with_failover<T, F, Fut>(&self, op: &'static str, call: F) -> BlockchainResult<T>
    where
        F: Fn(SharedProvider) -> Fut,
        Fut: Future<Output = TransportResult<T>>,
    {
        let mut last_error = String::from("no providers configured");

        for (i, provider) in self.providers.iter().enumerate() {
            match timeout(self.timeout_duration, call(provider.clone())).await {
                Ok(Ok(result)) => return Ok(result),
                Ok(Err(e)) => {
                    tracing::warn!(provider_idx = i, op = op, error = %e, "RPC error, trying next provider");
                    last_error = e.to_string();
                }
                Err(_) => {
                    tracing::warn!(provider_idx = i, op = op, "RPC timeout, trying next provider");
                    last_error = BlockchainError::Timeout(self.config.rpc_timeout_secs).to_string();
                }
            }
        }

        Err(BlockchainError::Rpc(format!(
            "All RPC providers failed to {}: {}",
            op, last_error
        )))
    }

    /// Verify the connected chain ID matches configuration.
    pub async fn verify_chain_id(&self) -> BlockchainResult<()> {
        let chain_id = self.get_chain_id().await?;
        if chain_id.0 != self.config.chain_id {
            return Err(BlockchainError::ChainMismatch {
                expected: self.config.chain_id,
                actual: chain_id.0,
            });
        }
        Ok(())
    }

    pub async fn get_chain_id(&self) -> BlockchainResult<ChainId> {
        self.with_failover("get chain id", |p| async move { p.get_chain_id().await })
            .await
            .map(ChainId)
    }

    pub async fn get_block_number(&self) -> BlockchainResult<u64> {
        self.with_failover("get block number", |p| async move { p.get_block_number().await })
            .await
    }

    /// Native balance in wei.
    pub async fn get_balance(&self, address: Address) -> BlockchainResult<U256> {
        self.with_failover("get balance", |p| async move { p.get_balance(address).await })
            .await
    }

    /// Next nonce for an address, counting transactions still in the mempool.
    pub async fn get_pending_transaction_count(&self, address: Address) -> BlockchainResult<u64> {
        self.with_failover("get transaction count", |p| async move {
            p.get_transaction_count(address).pending().await
        })
        .await
    }

    /// Node gas price in wei.
    pub async fn get_gas_price(&self) -> BlockchainResult<u128> {
        self.with_failover("get gas price", |p| async move { p.get_gas_price().await })
            .await
    }

    /// Deployed bytecode at an address (empty for EOAs).
    pub async fn get_code(&self, address: Address) -> BlockchainResult<Bytes> {
        self.with_failover("get code", |p| async move { p.get_code_at(address).await })
            .await
    }

    /// Block header summary by number, or the latest block.
    pub async fn get_block(&self, number: Option<u64>) -> BlockchainResult<BlockInfo> {
        let tag = number.map(BlockNumberOrTag::Number).unwrap_or(BlockNumberOrTag::Latest);
        let block = self
            .with_failover("get block", |p| async move { p.get_block_by_number(tag).await })
            .await?
            .ok_or_else(|| BlockchainError::NotFound(format!("block {}", tag)))?;

        Ok(BlockInfo {
            number: block.header.number,
            hash: block.header.hash.to_string(),
            parent_hash: block.header.parent_hash.to_string(),
            timestamp: block.header.timestamp,
            miner: self.checksum(&block.header.beneficiary),
            gas_used: block.header.gas_used,
            gas_limit: block.header.gas_limit,
            transaction_count: block.transactions.len(),
        })
    }

    pub async fn get_transaction_receipt(
        &self,
        tx_hash: TxHash,
    ) -> BlockchainResult<Option<TransactionReceipt>> {
        self.with_failover("get receipt", |p| async move {
            p.get_transaction_receipt(tx_hash).await
        })
        .await
    }

    /// Transaction details merged with its receipt, if mined.
    pub async fn get_transaction(&self, tx_hash: TxHash) -> BlockchainResult<TransactionResponse> {
        let tx = self
            .with_failover("get transaction", |p| async move {
                p.get_transaction_by_hash(tx_hash).await
            })
            .await?
            .ok_or_else(|| BlockchainError::NotFound(format!("transaction {}", tx_hash)))?;

        let receipt = self.get_transaction_receipt(tx_hash).await?;

        let mut response = TransactionResponse {
            hash: tx_hash.to_string(),
            from: self.checksum(&tx.inner.signer()),
            to: tx.to().map(|to| self.checksum(&to)),
            value: units::format_amount(tx.value(), units::NATIVE_DECIMALS)?,
            status: TransactionStatus::Pending,
            block_number: tx.block_number,
            gas_used: None,
            contract_address: None,
            explorer_url: self.explorer_tx_url(&tx_hash),
        };
        if let Some(receipt) = receipt {
            self.apply_receipt(&mut response, &receipt);
        }
        Ok(response)
    }

    /// Fill status, block, gas and created contract from a receipt.
    pub fn apply_receipt(&self, response: &mut TransactionResponse, receipt: &TransactionReceipt) {
        response.status = if receipt.status() {
            TransactionStatus::Confirmed
        } else {
            TransactionStatus::Failed
        };
        response.block_number = receipt.block_number;
        response.gas_used = Some(receipt.gas_used);
        response.contract_address = receipt.contract_address.map(|a| self.checksum(&a));
    }

    pub async fn estimate_gas(&self, tx: &TransactionRequest) -> BlockchainResult<u64> {
        self.with_failover("estimate gas", |p| {
            let tx = tx.clone();
            async move { p.estimate_gas(tx).await }
        })
        .await
    }

    /// `eth_call` against the latest block.
    pub async fn call(&self, tx: &TransactionRequest) -> BlockchainResult<Bytes> {
        self.with_failover("call contract", |p| {
            let tx = tx.clone();
            async move { p.call(tx).await }
        })
        .await
    }

    /// Sign with `wallet` and broadcast through the primary endpoint.
    ///
    /// Broadcasts never fail over: a timed-out send may still have reached
    /// the node, and re-sending with a freshly filled nonce could double-spend.
    pub async fn send_transaction(
        &self,
        wallet: EthereumWallet,
        tx: TransactionRequest,
    ) -> BlockchainResult<TxHash> {
        let provider = ProviderBuilder::new()
            .wallet(wallet)
            .connect_http(self.primary_url.clone());

        let pending = match timeout(self.timeout_duration, provider.send_transaction(tx)).await {
            Ok(Ok(pending)) => pending,
            Ok(Err(e)) => {
                return Err(BlockchainError::Rpc(format!("Failed to send transaction: {}", e)))
            }
            Err(_) => return Err(BlockchainError::Timeout(self.config.rpc_timeout_secs)),
        };

        let tx_hash = *pending.tx_hash();
        tracing::info!(tx_hash = %tx_hash, "Transaction broadcast");
        Ok(tx_hash)
    }

    /// Gas price to use: explicit, configured, or node price with multiplier.
    pub async fn resolve_gas_price(&self, explicit_wei: Option<u128>) -> BlockchainResult<u128> {
        if let Some(price) = explicit_wei.or(self.config.default_gas_price_wei) {
            return check_gas_price(price, self.config.max_gas_price_gwei);
        }

        let node_price = self.get_gas_price().await?;
        let adjusted = apply_multiplier(node_price, self.config.gas_price_multiplier);
        check_gas_price(adjusted, self.config.max_gas_price_gwei)
    }

    pub async fn network_info(&self) -> BlockchainResult<NetworkInfo> {
        let chain_id = self.get_chain_id().await?;
        let block_number = self.get_block_number().await?;
        let gas_price = self.get_gas_price().await?;

        Ok(NetworkInfo {
            chain_id: chain_id.0,
            network_name: self.config.network_name.clone(),
            rpc_url: self.config.rpc_url.clone(),
            explorer_url: self.config.explorer_url.clone(),
            currency_symbol: self.config.currency_symbol.clone(),
            block_number,
            gas_price_wei: gas_price.to_string(),
        })
    }

    /// Check if the node is reachable.
    ///
    /// Returns true if we can query the block number.
    pub async fn is_healthy(&self) -> bool {
        let healthy = self.get_block_number().await.is_ok();
        metrics::record_rpc_health(healthy);
        healthy
    }

    /// Address rendered with this chain's checksum.
    pub fn checksum(&self, address: &Address) -> String {
        units::checksum(address, self.config.chain_id)
    }

    pub fn explorer_tx_url(&self, tx_hash: &TxHash) -> Option<String> {
        self.config
            .explorer_url
            .as_ref()
            .map(|base| format!("{}/tx/{}", base.trim_end_matches('/'), tx_hash))
    }

    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    pub fn chain_id(&self) -> u64 {
        self.config.chain_id
    }
}

impl std::fmt::Debug for RootstockClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RootstockClient")
            .field("rpc_url", &self.config.rpc_url)
            .field("providers", &self.providers.len())
            .field("chain_id", &self.config.chain_id)
            .field("timeout_secs", &self.config.rpc_timeout_secs)
            .finish()
    }
}

fn apply_multiplier(price_wei: u128, multiplier: f64) -> u128 {
    (price_wei as f64 * multiplier).round() as u128
}

fn check_gas_price(price_wei: u128, max_gwei: u64) -> BlockchainResult<u128> {
    let max_wei = max_gwei as u128 * 1_000_000_000;
    if price_wei > max_wei {
        return Err(BlockchainError::GasPriceTooHigh {
            current_gwei: (price_wei / 1_000_000_000) as u64,
            max_gwei,
        });
    }
    Ok(price_wei)
}
