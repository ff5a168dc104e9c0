//! Arbitrary contract reads and writes from human-readable signatures.

use alloy::hex;
use alloy::network::TransactionBuilder;
use alloy::primitives::U256;
use alloy::rpc::types::TransactionRequest;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::blockchain::contracts::DynamicCall;
use crate::blockchain::units;
use crate::mcp::protocol::ToolSchema;
use crate::tools::{
    json_schema_amount, json_schema_array, json_schema_boolean, json_schema_object,
    json_schema_string, opt_string_or_number, parse_args, to_value, GasArgs, Tool, ToolContext,
    ToolResult, ToolTier,
};

fn args_schema() -> Value {
    json_schema_array(
        json!({}),
        "Arguments in declaration order; integers may be strings or numbers",
    )
}

pub struct CallContractTool {
    ctx: Arc<ToolContext>,
}

impl CallContractTool {
    pub fn new(ctx: Arc<ToolContext>) -> Self {
        Self { ctx }
    }
}

#[derive(Debug, Deserialize)]
struct CallContractArgs {
    contract_address: String,
    function_signature: String,
    #[serde(default)]
    args: Vec<Value>,
}

#[async_trait::async_trait]
impl Tool for CallContractTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "call_contract".to_string(),
            description: "Call a read-only contract function, e.g. \"balanceOf(address) returns (uint256)\".".to_string(),
            input_schema: json_schema_object(
                json!({
                    "contract_address": json_schema_string("Contract address"),
                    "function_signature": json_schema_string("Function signature including return types"),
                    "args": args_schema()
                }),
                vec!["contract_address", "function_signature"],
            ),
            annotations: None,
        }
    }

    fn failure_prefix(&self) -> &'static str {
        "Failed to call contract"
    }

    async fn execute(&self, arguments: Value) -> ToolResult<Value> {
        let args: CallContractArgs = parse_args(arguments)?;
        let contract = units::parse_address(&args.contract_address)?;
        let call = DynamicCall::parse(&args.function_signature)?;
        let calldata = call.encode(&args.args)?;

        let mut tx = TransactionRequest::default()
            .with_to(contract)
            .with_input(calldata);
        if let Some(from) = self.ctx.wallets.current_address() {
            tx = tx.with_from(from);
        }

        let client = &self.ctx.client;
        let data = client.call(&tx).await?;
        let mut outputs = call.decode_output(&data, client.chain_id())?;

        let result = match outputs.len() {
            0 => Value::Null,
            1 => outputs.remove(0),
            _ => Value::Array(outputs),
        };

        Ok(json!({
            "contract_address": client.checksum(&contract),
            "function": call.name(),
            "result": result,
            "raw": hex::encode_prefixed(&data),
        }))
    }
}

pub struct WriteContractTool {
    ctx: Arc<ToolContext>,
}

impl WriteContractTool {
    pub fn new(ctx: Arc<ToolContext>) -> Self {
        Self { ctx }
    }
}

#[derive(Debug, Deserialize)]
struct WriteContractArgs {
    contract_address: String,
    function_signature: String,
    #[serde(default)]
    args: Vec<Value>,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    value: Option<String>,
    from: Option<String>,
    #[serde(flatten)]
    gas: GasArgs,
    #[serde(default = "default_wait")]
    wait: bool,
}

fn default_wait() -> bool {
    true
}

#[async_trait::async_trait]
impl Tool for WriteContractTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "write_contract".to_string(),
            description: "Send a transaction calling a contract function, e.g. \"approve(address,uint256)\".".to_string(),
            input_schema: json_schema_object(
                json!({
                    "contract_address": json_schema_string("Contract address"),
                    "function_signature": json_schema_string("Function signature"),
                    "args": args_schema(),
                    "value": json_schema_amount("RBTC to attach, in whole units"),
                    "from": json_schema_string("Sender wallet (default: current wallet)"),
                    "gas_limit": json_schema_amount("Gas limit override"),
                    "gas_price": json_schema_amount("Gas price override in gwei"),
                    "wait": json_schema_boolean("Wait for confirmation (default true)")
                }),
                vec!["contract_address", "function_signature"],
            ),
            annotations: None,
        }
    }

    fn failure_prefix(&self) -> &'static str {
        "Failed to write contract"
    }

    fn tier(&self) -> ToolTier {
        ToolTier::Transaction
    }

    async fn execute(&self, arguments: Value) -> ToolResult<Value> {
        let args: WriteContractArgs = parse_args(arguments)?;
        let contract = units::parse_address(&args.contract_address)?;
        let call = DynamicCall::parse(&args.function_signature)?;
        let calldata = call.encode(&args.args)?;
        let value = match args.value.as_deref() {
            Some(value) => units::parse_amount(value, units::NATIVE_DECIMALS)?,
            None => U256::ZERO,
        };
        let gas = args.gas.overrides()?;

        let (from, wallet) = self.ctx.wallets.ethereum_wallet(args.from.as_deref())?;
        tracing::info!(from = %from, contract = %contract, function = call.name(), "Writing contract");

        let builder = self.ctx.tx_builder();
        let tx = builder.build(from, Some(contract), value, calldata, gas).await?;
        let response = builder.execute(wallet, tx, args.wait).await?;

        let mut output = to_value(&response)?;
        output["function"] = json!(call.name());
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::{offline_context, ANVIL_KEY};
    use crate::tools::ToolError;

    #[tokio::test]
    async fn test_call_rejects_bad_signature() {
        let tool = CallContractTool::new(offline_context());
        let err = tool
            .execute(json!({
                "contract_address": "0x70997970c51812dc3a010c7d01b50e0d17dc79c8",
                "function_signature": "not a signature("
            }))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("invalid function signature"));
    }

    #[tokio::test]
    async fn test_call_checks_argument_count_before_rpc() {
        let tool = CallContractTool::new(offline_context());
        let err = tool
            .execute(json!({
                "contract_address": "0x70997970c51812dc3a010c7d01b50e0d17dc79c8",
                "function_signature": "balanceOf(address) returns (uint256)",
                "args": []
            }))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("expects 1 argument"));
    }

    #[tokio::test]
    async fn test_write_without_node_fails_cleanly() {
        let ctx = offline_context();
        ctx.wallets.import_private_key(ANVIL_KEY, None).unwrap();
        let result = WriteContractTool::new(ctx)
            .execute(json!({
                "contract_address": "0x70997970c51812dc3a010c7d01b50e0d17dc79c8",
                "function_signature": "approve(address,uint256)",
                "args": ["0x70997970c51812dc3a010c7d01b50e0d17dc79c8", "1000"],
                "wait": false
            }))
            .await;
        assert!(matches!(result, Err(ToolError::Blockchain(_))));
    }

    #[tokio::test]
    async fn test_write_rejects_negative_value() {
        let ctx = offline_context();
        ctx.wallets.import_private_key(ANVIL_KEY, None).unwrap();
        let err = WriteContractTool::new(ctx)
            .execute(json!({
                "contract_address": "0x70997970c51812dc3a010c7d01b50e0d17dc79c8",
                "function_signature": "deposit()",
                "value": "-1"
            }))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("negative"));
    }
}
