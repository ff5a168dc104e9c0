//! ERC20 / ERC721 deployment, minting and metadata tools.

use alloy::network::{EthereumWallet, TransactionBuilder};
use alloy::primitives::{Address, Bytes, U256};
use alloy::sol_types::SolCall;
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;

use crate::blockchain::contracts::{
    erc20_deploy_code, erc721_deploy_code, load_artifact_bytecode, parse_bytecode,
    require_nonzero, IERC20, IERC721,
};
use crate::blockchain::tokens::TokenReader;
use crate::blockchain::types::{BlockchainError, DeploymentResult, TransactionStatus};
use crate::blockchain::{units, GasOverrides};
use crate::mcp::protocol::ToolSchema;
use crate::tools::{
    json_schema_amount, json_schema_integer, json_schema_object, json_schema_string, parse_args,
    string_or_number, to_value, GasArgs, Tool, ToolContext, ToolError, ToolResult, ToolTier,
};

const DEFAULT_ERC20_DECIMALS: u8 = 18;

/// Creation bytecode from the call, falling back to the configured artifact.
fn creation_bytecode(inline: Option<&str>, artifact: Option<&Path>, kind: &str) -> ToolResult<Bytes> {
    match (inline, artifact) {
        (Some(code), _) => Ok(parse_bytecode(code)?),
        (None, Some(path)) => Ok(load_artifact_bytecode(path)?),
        (None, None) => Err(ToolError::InvalidArguments(format!(
            "no {} bytecode: pass 'bytecode' or configure a compiled artifact",
            kind
        ))),
    }
}

/// Broadcast creation code and wait for the contract address.
///
/// The nonce is pinned so the address is known even if confirmation times out.
async fn deploy(
    ctx: &ToolContext,
    from: Address,
    wallet: EthereumWallet,
    code: Bytes,
    gas: GasOverrides,
) -> ToolResult<DeploymentResult> {
    let builder = ctx.tx_builder();
    let client = builder.client();

    let nonce = client.get_pending_transaction_count(from).await?;
    let predicted = from.create(nonce);

    let tx = builder
        .build(from, None, U256::ZERO, code, gas)
        .await?
        .with_nonce(nonce);
    let response = builder.execute(wallet, tx, true).await?;

    if response.status == TransactionStatus::Failed {
        return Err(BlockchainError::Contract(format!(
            "deployment reverted in transaction {}",
            response.hash
        ))
        .into());
    }

    let contract_address = response
        .contract_address
        .unwrap_or_else(|| client.checksum(&predicted));
    tracing::info!(contract = %contract_address, tx_hash = %response.hash, "Contract deployed");

    Ok(DeploymentResult {
        contract_address,
        transaction_hash: response.hash,
        block_number: response.block_number,
        gas_used: response.gas_used,
        explorer_url: response.explorer_url,
    })
}

pub struct DeployErc20Tool {
    ctx: Arc<ToolContext>,
}

impl DeployErc20Tool {
    pub fn new(ctx: Arc<ToolContext>) -> Self {
        Self { ctx }
    }
}

#[derive(Debug, Deserialize)]
struct DeployErc20Args {
    name: String,
    symbol: String,
    decimals: Option<u8>,
    #[serde(deserialize_with = "string_or_number")]
    initial_supply: String,
    bytecode: Option<String>,
    from: Option<String>,
    #[serde(flatten)]
    gas: GasArgs,
}

#[async_trait::async_trait]
impl Tool for DeployErc20Tool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "deploy_erc20".to_string(),
            description: "Deploy an ERC20 token with constructor (name, symbol, decimals, initialSupply). The initial supply is minted to the deployer.".to_string(),
            input_schema: json_schema_object(
                json!({
                    "name": json_schema_string("Token name"),
                    "symbol": json_schema_string("Token symbol"),
                    "decimals": json_schema_integer("Token decimals (default 18)"),
                    "initial_supply": json_schema_amount("Initial supply in whole tokens"),
                    "bytecode": json_schema_string("Creation bytecode hex (default: configured artifact)"),
                    "from": json_schema_string("Deployer wallet (default: current wallet)"),
                    "gas_limit": json_schema_amount("Gas limit override"),
                    "gas_price": json_schema_amount("Gas price override in gwei")
                }),
                vec!["name", "symbol", "initial_supply"],
            ),
            annotations: None,
        }
    }

    fn failure_prefix(&self) -> &'static str {
        "Failed to deploy ERC20 token"
    }

    fn tier(&self) -> ToolTier {
        ToolTier::Transaction
    }

    async fn execute(&self, arguments: Value) -> ToolResult<Value> {
        let args: DeployErc20Args = parse_args(arguments)?;
        let decimals = args.decimals.unwrap_or(DEFAULT_ERC20_DECIMALS);
        let supply = units::parse_amount(&args.initial_supply, decimals)?;
        let gas = args.gas.overrides()?;
        let bytecode = creation_bytecode(
            args.bytecode.as_deref(),
            self.ctx.contracts.erc20_artifact.as_deref(),
            "ERC20",
        )?;
        let code = erc20_deploy_code(&bytecode, &args.name, &args.symbol, decimals, supply);

        let (from, wallet) = self.ctx.wallets.ethereum_wallet(args.from.as_deref())?;
        tracing::info!(from = %from, symbol = %args.symbol, "Deploying ERC20");

        let deployment = deploy(&self.ctx, from, wallet, code, gas).await?;
        let mut output = to_value(&deployment)?;
        output["name"] = json!(args.name);
        output["symbol"] = json!(args.symbol);
        output["decimals"] = json!(decimals);
        output["initial_supply"] = json!(units::format_amount(supply, decimals)?);
        Ok(output)
    }
}

pub struct DeployErc721Tool {
    ctx: Arc<ToolContext>,
}

impl DeployErc721Tool {
    pub fn new(ctx: Arc<ToolContext>) -> Self {
        Self { ctx }
    }
}

#[derive(Debug, Deserialize)]
struct DeployErc721Args {
    name: String,
    symbol: String,
    bytecode: Option<String>,
    from: Option<String>,
    #[serde(flatten)]
    gas: GasArgs,
}

#[async_trait::async_trait]
impl Tool for DeployErc721Tool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "deploy_erc721".to_string(),
            description: "Deploy an ERC721 NFT collection with constructor (name, symbol).".to_string(),
            input_schema: json_schema_object(
                json!({
                    "name": json_schema_string("Collection name"),
                    "symbol": json_schema_string("Collection symbol"),
                    "bytecode": json_schema_string("Creation bytecode hex (default: configured artifact)"),
                    "from": json_schema_string("Deployer wallet (default: current wallet)"),
                    "gas_limit": json_schema_amount("Gas limit override"),
                    "gas_price": json_schema_amount("Gas price override in gwei")
                }),
                vec!["name", "symbol"],
            ),
            annotations: None,
        }
    }

    fn failure_prefix(&self) -> &'static str {
        "Failed to deploy ERC721 collection"
    }

    fn tier(&self) -> ToolTier {
        ToolTier::Transaction
    }

    async fn execute(&self, arguments: Value) -> ToolResult<Value> {
        let args: DeployErc721Args = parse_args(arguments)?;
        let gas = args.gas.overrides()?;
        let bytecode = creation_bytecode(
            args.bytecode.as_deref(),
            self.ctx.contracts.erc721_artifact.as_deref(),
            "ERC721",
        )?;
        let code = erc721_deploy_code(&bytecode, &args.name, &args.symbol);

        let (from, wallet) = self.ctx.wallets.ethereum_wallet(args.from.as_deref())?;
        tracing::info!(from = %from, symbol = %args.symbol, "Deploying ERC721");

        let deployment = deploy(&self.ctx, from, wallet, code, gas).await?;
        let mut output = to_value(&deployment)?;
        output["name"] = json!(args.name);
        output["symbol"] = json!(args.symbol);
        Ok(output)
    }
}

pub struct MintTokensTool {
    ctx: Arc<ToolContext>,
}

impl MintTokensTool {
    pub fn new(ctx: Arc<ToolContext>) -> Self {
        Self { ctx }
    }
}

#[derive(Debug, Deserialize)]
struct MintTokensArgs {
    token_address: String,
    to: String,
    #[serde(deserialize_with = "string_or_number")]
    amount: String,
    from: Option<String>,
    #[serde(flatten)]
    gas: GasArgs,
}

#[async_trait::async_trait]
impl Tool for MintTokensTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "mint_tokens".to_string(),
            description: "Mint ERC20 tokens via mint(address,uint256). The sender must be allowed to mint.".to_string(),
            input_schema: json_schema_object(
                json!({
                    "token_address": json_schema_string("ERC20 contract address"),
                    "to": json_schema_string("Recipient address"),
                    "amount": json_schema_amount("Amount in whole tokens"),
                    "from": json_schema_string("Minter wallet (default: current wallet)"),
                    "gas_limit": json_schema_amount("Gas limit override"),
                    "gas_price": json_schema_amount("Gas price override in gwei")
                }),
                vec!["token_address", "to", "amount"],
            ),
            annotations: None,
        }
    }

    fn failure_prefix(&self) -> &'static str {
        "Failed to mint tokens"
    }

    fn tier(&self) -> ToolTier {
        ToolTier::Transaction
    }

    async fn execute(&self, arguments: Value) -> ToolResult<Value> {
        let args: MintTokensArgs = parse_args(arguments)?;
        let token = units::parse_address(&args.token_address)?;
        let recipient = units::parse_address(&args.to)?;
        require_nonzero(&recipient, "recipient")?;
        let gas = args.gas.overrides()?;

        let (from, wallet) = self.ctx.wallets.ethereum_wallet(args.from.as_deref())?;
        let builder = self.ctx.tx_builder();
        let client = builder.client();

        let reader = TokenReader::new(client);
        reader.ensure_contract(token).await?;
        let decimals = reader.erc20_decimals(token).await?;
        let amount = units::parse_amount(&args.amount, decimals)?;
        tracing::info!(from = %from, token = %token, to = %recipient, amount = %args.amount, "Minting ERC20");

        let data = IERC20::mintCall {
            to: recipient,
            amount,
        }
        .abi_encode();
        let tx = builder.build(from, Some(token), U256::ZERO, data.into(), gas).await?;
        let response = builder.execute(wallet, tx, true).await?;

        let mut output = to_value(&response)?;
        output["token_address"] = json!(client.checksum(&token));
        output["recipient"] = json!(client.checksum(&recipient));
        output["amount"] = json!(units::format_amount(amount, decimals)?);
        Ok(output)
    }
}

pub struct MintNftTool {
    ctx: Arc<ToolContext>,
}

impl MintNftTool {
    pub fn new(ctx: Arc<ToolContext>) -> Self {
        Self { ctx }
    }
}

#[derive(Debug, Deserialize)]
struct MintNftArgs {
    token_address: String,
    to: String,
    #[serde(deserialize_with = "string_or_number")]
    token_id: String,
    #[serde(default)]
    token_uri: String,
    from: Option<String>,
    #[serde(flatten)]
    gas: GasArgs,
}

#[async_trait::async_trait]
impl Tool for MintNftTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "mint_nft".to_string(),
            description: "Mint an NFT via mint(address,uint256,string). The sender must be allowed to mint.".to_string(),
            input_schema: json_schema_object(
                json!({
                    "token_address": json_schema_string("ERC721 contract address"),
                    "to": json_schema_string("Recipient address"),
                    "token_id": json_schema_amount("Token id (decimal or 0x hex)"),
                    "token_uri": json_schema_string("Metadata URI (default empty)"),
                    "from": json_schema_string("Minter wallet (default: current wallet)"),
                    "gas_limit": json_schema_amount("Gas limit override"),
                    "gas_price": json_schema_amount("Gas price override in gwei")
                }),
                vec!["token_address", "to", "token_id"],
            ),
            annotations: None,
        }
    }

    fn failure_prefix(&self) -> &'static str {
        "Failed to mint NFT"
    }

    fn tier(&self) -> ToolTier {
        ToolTier::Transaction
    }

    async fn execute(&self, arguments: Value) -> ToolResult<Value> {
        let args: MintNftArgs = parse_args(arguments)?;
        let token = units::parse_address(&args.token_address)?;
        let recipient = units::parse_address(&args.to)?;
        require_nonzero(&recipient, "recipient")?;
        let token_id = units::parse_u256(&args.token_id)?;
        let gas = args.gas.overrides()?;

        let (from, wallet) = self.ctx.wallets.ethereum_wallet(args.from.as_deref())?;
        let builder = self.ctx.tx_builder();
        let client = builder.client();
        TokenReader::new(client).ensure_contract(token).await?;
        tracing::info!(from = %from, token = %token, to = %recipient, token_id = %token_id, "Minting NFT");

        let data = IERC721::mintCall {
            to: recipient,
            tokenId: token_id,
            uri: args.token_uri.clone(),
        }
        .abi_encode();
        let tx = builder.build(from, Some(token), U256::ZERO, data.into(), gas).await?;
        let response = builder.execute(wallet, tx, true).await?;

        let mut output = to_value(&response)?;
        output["token_address"] = json!(client.checksum(&token));
        output["recipient"] = json!(client.checksum(&recipient));
        output["token_id"] = json!(token_id.to_string());
        if !args.token_uri.is_empty() {
            output["token_uri"] = json!(args.token_uri);
        }
        Ok(output)
    }
}

pub struct GetTokenInfoTool {
    ctx: Arc<ToolContext>,
}

impl GetTokenInfoTool {
    pub fn new(ctx: Arc<ToolContext>) -> Self {
        Self { ctx }
    }
}

#[derive(Debug, Deserialize)]
struct GetTokenInfoArgs {
    token_address: String,
}

#[async_trait::async_trait]
impl Tool for GetTokenInfoTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_token_info".to_string(),
            description: "Read an ERC20 token's name, symbol, decimals and total supply.".to_string(),
            input_schema: json_schema_object(
                json!({ "token_address": json_schema_string("ERC20 contract address") }),
                vec!["token_address"],
            ),
            annotations: None,
        }
    }

    fn failure_prefix(&self) -> &'static str {
        "Failed to get token info"
    }

    async fn execute(&self, arguments: Value) -> ToolResult<Value> {
        let args: GetTokenInfoArgs = parse_args(arguments)?;
        let token = units::parse_address(&args.token_address)?;
        let info = TokenReader::new(&self.ctx.client).erc20_info(token).await?;
        to_value(&info)
    }
}

pub struct GetNftInfoTool {
    ctx: Arc<ToolContext>,
}

impl GetNftInfoTool {
    pub fn new(ctx: Arc<ToolContext>) -> Self {
        Self { ctx }
    }
}

#[derive(Debug, Deserialize)]
struct GetNftInfoArgs {
    token_address: String,
    #[serde(deserialize_with = "string_or_number")]
    token_id: String,
}

#[async_trait::async_trait]
impl Tool for GetNftInfoTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_nft_info".to_string(),
            description: "Read the owner and metadata URI of an NFT.".to_string(),
            input_schema: json_schema_object(
                json!({
                    "token_address": json_schema_string("ERC721 contract address"),
                    "token_id": json_schema_amount("Token id (decimal or 0x hex)")
                }),
                vec!["token_address", "token_id"],
            ),
            annotations: None,
        }
    }

    fn failure_prefix(&self) -> &'static str {
        "Failed to get NFT info"
    }

    async fn execute(&self, arguments: Value) -> ToolResult<Value> {
        let args: GetNftInfoArgs = parse_args(arguments)?;
        let token = units::parse_address(&args.token_address)?;
        let token_id = units::parse_u256(&args.token_id)?;
        let info = TokenReader::new(&self.ctx.client).nft_info(token, token_id).await?;
        to_value(&info)
    }
}
