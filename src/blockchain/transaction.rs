//! Transaction building, submission and confirmation monitoring.
//!
//! # Responsibilities
//! - Build legacy transactions with the resolved gas price
//! - Sign with a keystore wallet and broadcast
//! - Monitor confirmations and report the outcome

use alloy::network::{EthereumWallet, TransactionBuilder};
use alloy::primitives::{Address, Bytes, TxHash, U256};
use alloy::rpc::types::{TransactionReceipt, TransactionRequest};
use std::time::Duration;
use tokio::time::{interval, timeout};

use crate::blockchain::client::RootstockClient;
use crate::blockchain::types::{
    BlockchainResult, TransactionResponse, TransactionStatus,
};
use crate::blockchain::units;

/// Per-call gas overrides from a tool invocation.
#[derive(Debug, Clone, Copy, Default)]
pub struct GasOverrides {
    pub gas_limit: Option<u64>,
    pub gas_price_wei: Option<u128>,
}

/// Outcome of waiting for a transaction.
#[derive(Debug, Clone)]
pub enum ConfirmationStatus {
    /// Not mined (or not deep enough) before the deadline.
    Pending,
    /// Mined with the required block depth.
    Confirmed(TransactionReceipt),
    /// Mined but reverted.
    Failed(TransactionReceipt),
}

impl ConfirmationStatus {
    pub fn status(&self) -> TransactionStatus {
        match self {
            ConfirmationStatus::Pending => TransactionStatus::Pending,
            ConfirmationStatus::Confirmed(_) => TransactionStatus::Confirmed,
            ConfirmationStatus::Failed(_) => TransactionStatus::Failed,
        }
    }

    pub fn receipt(&self) -> Option<&TransactionReceipt> {
        match self {
            ConfirmationStatus::Pending => None,
            ConfirmationStatus::Confirmed(r) | ConfirmationStatus::Failed(r) => Some(r),
        }
    }
}

/// Transaction builder for common operations.
pub struct TxBuilder {
    client: RootstockClient,
}

impl TxBuilder {
    pub fn new(client: RootstockClient) -> Self {
        Self { client }
    }

    /// Build a transaction request with a resolved gas price.
    ///
    /// # Arguments
    /// * `from` - Sender address
    /// * `to` - Destination address (`None` deploys `data` as creation code)
    /// * `value` - Amount of RBTC to send, in wei
    /// * `data` - Call data or creation code
    /// * `gas` - Optional gas limit / price overrides
    pub async fn build(
        &self,
        from: Address,
        to: Option<Address>,
        value: U256,
        data: Bytes,
        gas: GasOverrides,
    ) -> BlockchainResult<TransactionRequest> {
        let gas_price = self.client.resolve_gas_price(gas.gas_price_wei).await?;

        let mut tx = TransactionRequest::default()
            .with_from(from)
            .with_value(value)
            .with_gas_price(gas_price)
            .with_chain_id(self.client.chain_id());

        tx = match to {
            Some(to) => tx.with_to(to).with_input(data),
            None => tx.with_deploy_code(data),
        };

        if let Some(limit) = gas.gas_limit.or(self.client.config().default_gas_limit) {
            tx = tx.with_gas_limit(limit);
        }

        Ok(tx)
    }

    /// Sign, broadcast and optionally wait for confirmation.
    pub async fn execute(
        &self,
        wallet: EthereumWallet,
        tx: TransactionRequest,
        wait: bool,
    ) -> BlockchainResult<TransactionResponse> {
        let from = tx.from.unwrap_or_default();
        let to = tx.to.and_then(|kind| kind.to().copied());
        let value = tx.value.unwrap_or_default();

        let tx_hash = self.client.send_transaction(wallet, tx).await?;

        let mut response = TransactionResponse {
            hash: tx_hash.to_string(),
            from: self.client.checksum(&from),
            to: to.map(|to| self.client.checksum(&to)),
            value: units::format_amount(value, units::NATIVE_DECIMALS)?,
            status: TransactionStatus::Pending,
            block_number: None,
            gas_used: None,
            contract_address: None,
            explorer_url: self.client.explorer_tx_url(&tx_hash),
        };

        if wait {
            let confirmation = self.wait_for_confirmation(tx_hash).await;
            if let Some(receipt) = confirmation.receipt() {
                self.client.apply_receipt(&mut response, receipt);
            }
            response.status = confirmation.status();
        }

        Ok(response)
    }

    /// Wait until the transaction has the configured number of confirmations.
    ///
    /// Running out of time is not an error: the transaction is reported as
    /// still pending. Failed polls are logged and retried until the deadline.
    pub async fn wait_for_confirmation(&self, tx_hash: TxHash) -> ConfirmationStatus {
        let config = self.client.config();
        let required_confirmations = config.confirmation_blocks.max(1) as u64;
        let timeout_duration = Duration::from_secs(config.confirmation_timeout_secs);
        let poll_interval = Duration::from_millis(config.poll_interval_ms);

        let result = timeout(timeout_duration, async {
            let mut ticker = interval(poll_interval);

            loop {
                ticker.tick().await;

                let receipt = match self.client.get_transaction_receipt(tx_hash).await {
                    Ok(Some(r)) => r,
                    Ok(None) => {
                        tracing::debug!(tx_hash = %tx_hash, "Transaction pending");
                        continue;
                    }
                    Err(e) => {
                        tracing::warn!(tx_hash = %tx_hash, error = %e, "Receipt poll failed");
                        continue;
                    }
                };

                if !receipt.status() {
                    tracing::warn!(tx_hash = %tx_hash, "Transaction reverted");
                    return ConfirmationStatus::Failed(receipt);
                }

                let current_block = match self.client.get_block_number().await {
                    Ok(n) => n,
                    Err(e) => {
                        tracing::warn!(tx_hash = %tx_hash, error = %e, "Block number poll failed");
                        continue;
                    }
                };
                let tx_block = receipt.block_number.unwrap_or(current_block);
                let confirmations = confirmations(current_block, tx_block);

                if confirmations >= required_confirmations {
                    tracing::info!(tx_hash = %tx_hash, block_number = tx_block, "Transaction confirmed");
                    return ConfirmationStatus::Confirmed(receipt);
                }

                tracing::debug!(
                    tx_hash = %tx_hash,
                    confirmations = confirmations,
                    required = required_confirmations,
                    "Waiting for confirmations"
                );
            }
        })
        .await;

        result.unwrap_or_else(|_| {
            tracing::warn!(tx_hash = %tx_hash, "Confirmation wait timed out");
            ConfirmationStatus::Pending
        })
    }

    pub fn client(&self) -> &RootstockClient {
        &self.client
    }
}

/// Block depth of a transaction mined in `tx_block`; the mining block counts as one.
fn confirmations(current_block: u64, tx_block: u64) -> u64 {
    current_block.saturating_sub(tx_block) + 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::types::NetworkConfig;

    fn offline_builder() -> TxBuilder {
        let config = NetworkConfig {
            rpc_url: "http://127.0.0.1:1".to_string(),
            rpc_timeout_secs: 2,
            default_gas_limit: Some(100_000),
            ..NetworkConfig::default()
        };
        TxBuilder::new(RootstockClient::new(config).unwrap())
    }

    #[test]
    fn test_confirmations() {
        assert_eq!(confirmations(100, 100), 1);
        assert_eq!(confirmations(102, 100), 3);
        // Receipt from a node that is ahead of the one we asked for the tip
        assert_eq!(confirmations(99, 100), 1);
    }

    #[tokio::test]
    async fn test_failed_polls_end_as_pending() {
        let config = NetworkConfig {
            rpc_url: "http://127.0.0.1:1".to_string(),
            rpc_timeout_secs: 1,
            confirmation_timeout_secs: 1,
            poll_interval_ms: 100,
            ..NetworkConfig::default()
        };
        let builder = TxBuilder::new(RootstockClient::new(config).unwrap());

        let status = builder.wait_for_confirmation(TxHash::repeat_byte(0xab)).await;
        assert!(matches!(status, ConfirmationStatus::Pending));
    }

    #[test]
    fn test_pending_status() {
        let status = ConfirmationStatus::Pending;
        assert_eq!(status.status(), TransactionStatus::Pending);
        assert!(status.receipt().is_none());
    }

    #[tokio::test]
    async fn test_build_transfer_with_explicit_gas() {
        let builder = offline_builder();
        let to = Address::repeat_byte(0x11);
        let tx = builder
            .build(
                Address::repeat_byte(0x22),
                Some(to),
                U256::from(5),
                Bytes::new(),
                GasOverrides {
                    gas_limit: None,
                    gas_price_wei: Some(60_000_000),
                },
            )
            .await
            .unwrap();

        assert_eq!(tx.gas_price, Some(60_000_000));
        assert_eq!(tx.gas, Some(100_000));
        assert_eq!(tx.chain_id, Some(31));
        assert_eq!(tx.to.and_then(|k| k.to().copied()), Some(to));
        assert_eq!(tx.value, Some(U256::from(5)));
    }

    #[tokio::test]
    async fn test_build_deploy() {
        let builder = offline_builder();
        let code = Bytes::from(vec![0x60, 0x80]);
        let tx = builder
            .build(
                Address::repeat_byte(0x22),
                None,
                U256::ZERO,
                code.clone(),
                GasOverrides {
                    gas_limit: Some(3_000_000),
                    gas_price_wei: Some(60_000_000),
                },
            )
            .await
            .unwrap();

        assert!(tx.to.map(|k| k.is_create()).unwrap_or(false));
        assert_eq!(tx.gas, Some(3_000_000));
        assert_eq!(tx.input.input(), Some(&code));
    }

    #[tokio::test]
    async fn test_build_needs_gas_price_from_node() {
        let builder = offline_builder();
        let result = builder
            .build(
                Address::ZERO,
                Some(Address::ZERO),
                U256::ZERO,
                Bytes::new(),
                GasOverrides::default(),
            )
            .await;
        assert!(result.is_err());
    }
}
