//! MCP tool catalogue for Rootstock.
//!
//! Every tool parses its JSON arguments into a typed struct, performs one
//! wallet or chain operation and returns a JSON value that the registry
//! renders as text content.

pub mod account;
pub mod contract;
pub mod network;
pub mod registry;
pub mod token;
pub mod wallet;

use serde::de::{self, DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

use crate::blockchain::{
    units, BlockchainError, GasOverrides, RootstockClient, TxBuilder, WalletManager,
};
use crate::config::ContractsConfig;

pub use registry::{
    json_schema_amount, json_schema_array, json_schema_boolean, json_schema_integer,
    json_schema_object, json_schema_string, Tool, ToolRegistry, ToolTier,
};

/// Errors produced by tool execution.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error(transparent)]
    Blockchain(#[from] BlockchainError),
}

pub type ToolResult<T> = Result<T, ToolError>;

/// Shared state handed to every tool.
pub struct ToolContext {
    pub client: RootstockClient,
    pub wallets: Arc<WalletManager>,
    pub contracts: ContractsConfig,
}

impl ToolContext {
    pub fn new(client: RootstockClient, wallets: Arc<WalletManager>, contracts: ContractsConfig) -> Self {
        Self {
            client,
            wallets,
            contracts,
        }
    }

    pub fn tx_builder(&self) -> TxBuilder {
        TxBuilder::new(self.client.clone())
    }
}

/// Build a registry holding the full Rootstock tool set.
pub fn rootstock_registry(ctx: Arc<ToolContext>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();

    // Keystore
    registry.register(Arc::new(wallet::CreateWalletTool::new(ctx.clone())));
    registry.register(Arc::new(wallet::ImportWalletTool::new(ctx.clone())));
    registry.register(Arc::new(wallet::ListWalletsTool::new(ctx.clone())));
    registry.register(Arc::new(wallet::SetCurrentWalletTool::new(ctx.clone())));
    registry.register(Arc::new(wallet::GetCurrentWalletTool::new(ctx.clone())));

    // Balances and transfers
    registry.register(Arc::new(account::GetBalanceTool::new(ctx.clone())));
    registry.register(Arc::new(account::TransferTool::new(ctx.clone())));

    // Chain queries
    registry.register(Arc::new(network::GetTransactionTool::new(ctx.clone())));
    registry.register(Arc::new(network::GetBlockTool::new(ctx.clone())));
    registry.register(Arc::new(network::GetNetworkInfoTool::new(ctx.clone())));
    registry.register(Arc::new(network::EstimateGasTool::new(ctx.clone())));

    // Arbitrary contracts
    registry.register(Arc::new(contract::CallContractTool::new(ctx.clone())));
    registry.register(Arc::new(contract::WriteContractTool::new(ctx.clone())));

    // Tokens and NFTs
    registry.register(Arc::new(token::DeployErc20Tool::new(ctx.clone())));
    registry.register(Arc::new(token::DeployErc721Tool::new(ctx.clone())));
    registry.register(Arc::new(token::MintTokensTool::new(ctx.clone())));
    registry.register(Arc::new(token::MintNftTool::new(ctx.clone())));
    registry.register(Arc::new(token::GetTokenInfoTool::new(ctx.clone())));
    registry.register(Arc::new(token::GetNftInfoTool::new(ctx)));

    registry
}

/// Deserialize tool arguments; `null` counts as an empty object.
pub fn parse_args<T: DeserializeOwned>(arguments: Value) -> ToolResult<T> {
    let arguments = match arguments {
        Value::Null => Value::Object(Default::default()),
        other => other,
    };
    serde_json::from_value(arguments).map_err(|e| ToolError::InvalidArguments(e.to_string()))
}

/// Serialize a tool output record.
pub fn to_value<T: serde::Serialize>(value: &T) -> ToolResult<Value> {
    serde_json::to_value(value).map_err(|e| ToolError::InvalidArguments(e.to_string()))
}

/// Gas fields shared by every transaction-sending tool.
#[derive(Debug, Default, Deserialize)]
pub struct GasArgs {
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub gas_limit: Option<String>,
    /// Gas price in gwei.
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub gas_price: Option<String>,
}

impl GasArgs {
    pub fn overrides(&self) -> ToolResult<GasOverrides> {
        let gas_limit = self
            .gas_limit
            .as_deref()
            .map(|limit| {
                limit.trim().parse::<u64>().map_err(|_| {
                    ToolError::InvalidArguments(format!("invalid gas_limit '{}'", limit))
                })
            })
            .transpose()?;

        let gas_price_wei = self
            .gas_price
            .as_deref()
            .map(|gwei| -> ToolResult<u128> {
                let wei = units::parse_amount(gwei, 9)?;
                u128::try_from(wei)
                    .map_err(|_| ToolError::InvalidArguments(format!("gas_price '{}' too large", gwei)))
            })
            .transpose()?;

        Ok(GasOverrides {
            gas_limit,
            gas_price_wei,
        })
    }
}

/// Accept `"1.5"` or `1.5` for amount-like fields.
pub fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(de::Error::custom(format!(
            "expected a string or number, got {}",
            other
        ))),
    }
}

pub fn opt_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        other => Err(de::Error::custom(format!(
            "expected a string or number, got {}",
            other
        ))),
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_catalogue_is_complete() {
        let registry = rootstock_registry(test_support::offline_context());
        let expected = [
            "create_wallet",
            "import_wallet",
            "list_wallets",
            "set_current_wallet",
            "get_current_wallet",
            "get_balance",
            "transfer",
            "get_transaction",
            "get_block",
            "get_network_info",
            "estimate_gas",
            "call_contract",
            "write_contract",
            "deploy_erc20",
            "deploy_erc721",
            "mint_tokens",
            "mint_nft",
            "get_token_info",
            "get_nft_info",
        ];
        assert_eq!(registry.len(), expected.len());
        for name in expected {
            assert!(registry.contains(name), "missing tool {}", name);
        }

        for schema in registry.list_schemas() {
            assert_eq!(schema.input_schema["type"], "object", "{}", schema.name);
            assert!(!schema.description.is_empty());
        }
    }

    #[derive(Debug, Deserialize)]
    struct AmountArgs {
        #[serde(deserialize_with = "string_or_number")]
        amount: String,
    }

    #[test]
    fn test_parse_args_null_is_empty_object() {
        let gas: GasArgs = parse_args(Value::Null).unwrap();
        assert!(gas.gas_limit.is_none());
    }

    #[test]
    fn test_amount_accepts_string_or_number() {
        let a: AmountArgs = parse_args(json!({"amount": "0.25"})).unwrap();
        assert_eq!(a.amount, "0.25");
        let b: AmountArgs = parse_args(json!({"amount": 3})).unwrap();
        assert_eq!(b.amount, "3");
        assert!(parse_args::<AmountArgs>(json!({"amount": true})).is_err());
        assert!(parse_args::<AmountArgs>(json!({})).is_err());
    }

    #[test]
    fn test_gas_overrides() {
        let gas: GasArgs = parse_args(json!({"gas_limit": 21000, "gas_price": "0.065"})).unwrap();
        let overrides = gas.overrides().unwrap();
        assert_eq!(overrides.gas_limit, Some(21_000));
        assert_eq!(overrides.gas_price_wei, Some(65_000_000));

        let bad: GasArgs = parse_args(json!({"gas_limit": "lots"})).unwrap();
        assert!(bad.overrides().is_err());
    }
}
