//! Balance queries and RBTC / ERC20 transfers.

use alloy::primitives::{Bytes, U256};
use alloy::sol_types::SolCall;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::blockchain::contracts::{require_nonzero, IERC20};
use crate::blockchain::tokens::TokenReader;
use crate::blockchain::types::TokenBalance;
use crate::blockchain::units;
use crate::mcp::protocol::ToolSchema;
use crate::tools::{
    json_schema_amount, json_schema_boolean, json_schema_object, json_schema_string, parse_args,
    string_or_number, to_value, GasArgs, Tool, ToolContext, ToolError, ToolResult, ToolTier,
};

pub struct GetBalanceTool {
    ctx: Arc<ToolContext>,
}

impl GetBalanceTool {
    pub fn new(ctx: Arc<ToolContext>) -> Self {
        Self { ctx }
    }
}

#[derive(Debug, Deserialize)]
struct GetBalanceArgs {
    address: Option<String>,
    token_address: Option<String>,
}

#[async_trait::async_trait]
impl Tool for GetBalanceTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_balance".to_string(),
            description: "Get the RBTC balance of an address, or its ERC20 balance when token_address is given. Defaults to the current wallet.".to_string(),
            input_schema: json_schema_object(
                json!({
                    "address": json_schema_string("Address to query (default: current wallet)"),
                    "token_address": json_schema_string("ERC20 contract address")
                }),
                vec![],
            ),
            annotations: None,
        }
    }

    fn failure_prefix(&self) -> &'static str {
        "Failed to get balance"
    }

    async fn execute(&self, arguments: Value) -> ToolResult<Value> {
        let args: GetBalanceArgs = parse_args(arguments)?;

        let owner = match args.address.as_deref() {
            Some(address) => units::parse_address(address)?,
            None => self.ctx.wallets.current_address().ok_or_else(|| {
                ToolError::InvalidArguments(
                    "address is required when no wallet is selected".to_string(),
                )
            })?,
        };

        let client = &self.ctx.client;
        let balance = match args.token_address.as_deref() {
            Some(token) => {
                let token = units::parse_address(token)?;
                TokenReader::new(client).erc20_balance(token, owner).await?
            }
            None => {
                let raw = client.get_balance(owner).await?;
                TokenBalance {
                    address: client.checksum(&owner),
                    token_address: None,
                    symbol: client.config().currency_symbol.clone(),
                    decimals: units::NATIVE_DECIMALS,
                    balance: units::format_amount(raw, units::NATIVE_DECIMALS)?,
                    raw_balance: raw.to_string(),
                }
            }
        };

        to_value(&balance)
    }
}

pub struct TransferTool {
    ctx: Arc<ToolContext>,
}

impl TransferTool {
    pub fn new(ctx: Arc<ToolContext>) -> Self {
        Self { ctx }
    }
}

#[derive(Debug, Deserialize)]
struct TransferArgs {
    to: String,
    #[serde(deserialize_with = "string_or_number")]
    amount: String,
    token_address: Option<String>,
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
impl Tool for TransferTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "transfer".to_string(),
            description: "Send RBTC, or ERC20 tokens when token_address is given, from a keystore wallet.".to_string(),
            input_schema: json_schema_object(
                json!({
                    "to": json_schema_string("Recipient address"),
                    "amount": json_schema_amount("Amount in whole units, e.g. \"0.01\""),
                    "token_address": json_schema_string("ERC20 contract address (omit for RBTC)"),
                    "from": json_schema_string("Sender wallet (default: current wallet)"),
                    "gas_limit": json_schema_amount("Gas limit override"),
                    "gas_price": json_schema_amount("Gas price override in gwei"),
                    "wait": json_schema_boolean("Wait for confirmation (default true)")
                }),
                vec!["to", "amount"],
            ),
            annotations: None,
        }
    }

    fn failure_prefix(&self) -> &'static str {
        "Failed to transfer"
    }

    fn tier(&self) -> ToolTier {
        ToolTier::Transaction
    }

    async fn execute(&self, arguments: Value) -> ToolResult<Value> {
        let args: TransferArgs = parse_args(arguments)?;
        let recipient = units::parse_address(&args.to)?;
        require_nonzero(&recipient, "recipient")?;
        let gas = args.gas.overrides()?;

        let (from, wallet) = self.ctx.wallets.ethereum_wallet(args.from.as_deref())?;
        let builder = self.ctx.tx_builder();
        let client = builder.client();

        match args.token_address.as_deref() {
            None => {
                let value = units::parse_amount(&args.amount, units::NATIVE_DECIMALS)?;
                tracing::info!(from = %from, to = %recipient, amount = %args.amount, "Sending RBTC");

                let tx = builder.build(from, Some(recipient), value, Bytes::new(), gas).await?;
                let response = builder.execute(wallet, tx, args.wait).await?;
                to_value(&response)
            }
            Some(token) => {
                let token = units::parse_address(token)?;
                let reader = TokenReader::new(client);
                reader.ensure_contract(token).await?;
                let decimals = reader.erc20_decimals(token).await?;
                let amount = units::parse_amount(&args.amount, decimals)?;
                tracing::info!(from = %from, to = %recipient, token = %token, amount = %args.amount, "Sending ERC20");

                let data = IERC20::transferCall {
                    to: recipient,
                    amount,
                }
                .abi_encode();
                let tx = builder
                    .build(from, Some(token), U256::ZERO, data.into(), gas)
                    .await?;
                let response = builder.execute(wallet, tx, args.wait).await?;

                let mut value = to_value(&response)?;
                value["token_address"] = json!(client.checksum(&token));
                value["recipient"] = json!(client.checksum(&recipient));
                value["amount"] = json!(units::format_amount(amount, decimals)?);
                Ok(value)
            }
        }
    }
}
