//! Chain queries: transactions, blocks, network status and gas estimates.

use alloy::hex;
use alloy::network::TransactionBuilder;
use alloy::primitives::{Bytes, U256};
use alloy::rpc::types::TransactionRequest;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::blockchain::types::GasEstimate;
use crate::blockchain::units;
use crate::mcp::protocol::ToolSchema;
use crate::tools::{
    json_schema_amount, json_schema_object, json_schema_string, opt_string_or_number, parse_args,
    to_value, Tool, ToolContext, ToolError, ToolResult,
};

pub struct GetTransactionTool {
    ctx: Arc<ToolContext>,
}

impl GetTransactionTool {
    pub fn new(ctx: Arc<ToolContext>) -> Self {
        Self { ctx }
    }
}

#[derive(Debug, Deserialize)]
struct GetTransactionArgs {
    hash: String,
}

#[async_trait::async_trait]
impl Tool for GetTransactionTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_transaction".to_string(),
            description: "Look up a transaction and its receipt by hash.".to_string(),
            input_schema: json_schema_object(
                json!({ "hash": json_schema_string("Transaction hash (0x + 64 hex chars)") }),
                vec!["hash"],
            ),
            annotations: None,
        }
    }

    fn failure_prefix(&self) -> &'static str {
        "Failed to get transaction"
    }

    async fn execute(&self, arguments: Value) -> ToolResult<Value> {
        let args: GetTransactionArgs = parse_args(arguments)?;
        let hash = units::parse_tx_hash(&args.hash)?;
        let response = self.ctx.client.get_transaction(hash).await?;
        to_value(&response)
    }
}

pub struct GetBlockTool {
    ctx: Arc<ToolContext>,
}

impl GetBlockTool {
    pub fn new(ctx: Arc<ToolContext>) -> Self {
        Self { ctx }
    }
}

#[derive(Debug, Deserialize)]
struct GetBlockArgs {
    #[serde(default, deserialize_with = "opt_string_or_number")]
    block_number: Option<String>,
}

/// `None` selects the latest block.
fn parse_block_selector(selector: Option<&str>) -> ToolResult<Option<u64>> {
    let Some(selector) = selector.map(str::trim) else {
        return Ok(None);
    };
    if selector.eq_ignore_ascii_case("latest") {
        return Ok(None);
    }
    let number = units::parse_u256(selector)?;
    u64::try_from(number)
        .map(Some)
        .map_err(|_| ToolError::InvalidArguments(format!("block number {} out of range", selector)))
}

#[async_trait::async_trait]
impl Tool for GetBlockTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_block".to_string(),
            description: "Get a block summary by number, or the latest block.".to_string(),
            input_schema: json_schema_object(
                json!({
                    "block_number": json_schema_amount("Block number or \"latest\" (default latest)")
                }),
                vec![],
            ),
            annotations: None,
        }
    }

    fn failure_prefix(&self) -> &'static str {
        "Failed to get block"
    }

    async fn execute(&self, arguments: Value) -> ToolResult<Value> {
        let args: GetBlockArgs = parse_args(arguments)?;
        let number = parse_block_selector(args.block_number.as_deref())?;
        let block = self.ctx.client.get_block(number).await?;
        to_value(&block)
    }
}

pub struct GetNetworkInfoTool {
    ctx: Arc<ToolContext>,
}

impl GetNetworkInfoTool {
    pub fn new(ctx: Arc<ToolContext>) -> Self {
        Self { ctx }
    }
}

#[async_trait::async_trait]
impl Tool for GetNetworkInfoTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_network_info".to_string(),
            description: "Show the connected Rootstock network: chain id, latest block and gas price.".to_string(),
            input_schema: json_schema_object(json!({}), vec![]),
            annotations: None,
        }
    }

    fn failure_prefix(&self) -> &'static str {
        "Failed to get network info"
    }

    async fn execute(&self, _arguments: Value) -> ToolResult<Value> {
        let info = self.ctx.client.network_info().await?;
        to_value(&info)
    }
}

pub struct EstimateGasTool {
    ctx: Arc<ToolContext>,
}

impl EstimateGasTool {
    pub fn new(ctx: Arc<ToolContext>) -> Self {
        Self { ctx }
    }
}

#[derive(Debug, Deserialize)]
struct EstimateGasArgs {
    to: String,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    value: Option<String>,
    data: Option<String>,
    from: Option<String>,
}

impl EstimateGasArgs {
    fn request(&self, ctx: &ToolContext) -> ToolResult<TransactionRequest> {
        let to = units::parse_address(&self.to)?;
        let value = match self.value.as_deref() {
            Some(value) => units::parse_amount(value, units::NATIVE_DECIMALS)?,
            None => U256::ZERO,
        };
        let data: Bytes = match self.data.as_deref().map(str::trim) {
            Some(data) if !data.is_empty() => hex::decode(data)
                .map_err(|e| ToolError::InvalidArguments(format!("invalid data hex: {}", e)))?
                .into(),
            _ => Bytes::new(),
        };
        let from = match self.from.as_deref() {
            Some(from) => Some(units::parse_address(from)?),
            None => ctx.wallets.current_address(),
        };

        let mut tx = TransactionRequest::default()
            .with_to(to)
            .with_value(value)
            .with_input(data);
        if let Some(from) = from {
            tx = tx.with_from(from);
        }
        Ok(tx)
    }
}

#[async_trait::async_trait]
impl Tool for EstimateGasTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "estimate_gas".to_string(),
            description: "Estimate gas and cost for a transaction at the current gas price.".to_string(),
            input_schema: json_schema_object(
                json!({
                    "to": json_schema_string("Destination address"),
                    "value": json_schema_amount("RBTC value in whole units"),
                    "data": json_schema_string("Hex call data"),
                    "from": json_schema_string("Sender address (default: current wallet)")
                }),
                vec!["to"],
            ),
            annotations: None,
        }
    }

    fn failure_prefix(&self) -> &'static str {
        "Failed to estimate gas"
    }

    async fn execute(&self, arguments: Value) -> ToolResult<Value> {
        let args: EstimateGasArgs = parse_args(arguments)?;
        let tx = args.request(&self.ctx)?;

        let client = &self.ctx.client;
        let gas_limit = client.estimate_gas(&tx).await?;
        let gas_price = client.resolve_gas_price(None).await?;
        let cost = U256::from(gas_limit) * U256::from(gas_price);

        to_value(&GasEstimate {
            gas_limit,
            gas_price_wei: gas_price.to_string(),
            gas_price_gwei: units::format_gwei(gas_price),
            estimated_cost: units::format_amount(cost, units::NATIVE_DECIMALS)?,
        })
    }
}
