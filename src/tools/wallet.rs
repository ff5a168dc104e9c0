//! Keystore tools: create, import, list and select wallets.

use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::mcp::protocol::ToolSchema;
use crate::tools::{
    json_schema_boolean, json_schema_integer, json_schema_object, json_schema_string, parse_args,
    to_value, Tool, ToolContext, ToolError, ToolResult, ToolTier,
};

pub struct CreateWalletTool {
    ctx: Arc<ToolContext>,
}

impl CreateWalletTool {
    pub fn new(ctx: Arc<ToolContext>) -> Self {
        Self { ctx }
    }
}

#[derive(Debug, Deserialize)]
struct CreateWalletArgs {
    name: Option<String>,
    #[serde(default)]
    with_mnemonic: bool,
}

#[async_trait::async_trait]
impl Tool for CreateWalletTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "create_wallet".to_string(),
            description: "Generate a new wallet and add it to the keystore. The private key (and mnemonic, if requested) is returned once and never again.".to_string(),
            input_schema: json_schema_object(
                json!({
                    "name": json_schema_string("Optional label for the wallet"),
                    "with_mnemonic": json_schema_boolean("Derive the key from a fresh 12-word mnemonic (default false)")
                }),
                vec![],
            ),
            annotations: None,
        }
    }

    fn failure_prefix(&self) -> &'static str {
        "Failed to create wallet"
    }

    fn tier(&self) -> ToolTier {
        ToolTier::Keystore
    }

    async fn execute(&self, arguments: Value) -> ToolResult<Value> {
        let args: CreateWalletArgs = parse_args(arguments)?;
        let info = self.ctx.wallets.create_wallet(args.name, args.with_mnemonic)?;
        to_value(&info)
    }
}

pub struct ImportWalletTool {
    ctx: Arc<ToolContext>,
}

impl ImportWalletTool {
    pub fn new(ctx: Arc<ToolContext>) -> Self {
        Self { ctx }
    }
}

#[derive(Debug, Deserialize)]
struct ImportWalletArgs {
    private_key: Option<String>,
    mnemonic: Option<String>,
    #[serde(default)]
    index: u32,
    name: Option<String>,
}

#[async_trait::async_trait]
impl Tool for ImportWalletTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "import_wallet".to_string(),
            description: "Import a wallet from a hex private key or a BIP-39 mnemonic phrase.".to_string(),
            input_schema: json_schema_object(
                json!({
                    "private_key": json_schema_string("Hex private key, with or without 0x"),
                    "mnemonic": json_schema_string("BIP-39 mnemonic phrase"),
                    "index": json_schema_integer("Account index for mnemonic derivation (default 0)"),
                    "name": json_schema_string("Optional label for the wallet")
                }),
                vec![],
            ),
            annotations: None,
        }
    }

    fn failure_prefix(&self) -> &'static str {
        "Failed to import wallet"
    }

    fn tier(&self) -> ToolTier {
        ToolTier::Keystore
    }

    async fn execute(&self, arguments: Value) -> ToolResult<Value> {
        let args: ImportWalletArgs = parse_args(arguments)?;

        let info = match (args.private_key, args.mnemonic) {
            (Some(key), None) => self.ctx.wallets.import_private_key(&key, args.name)?,
            (None, Some(phrase)) => self.ctx.wallets.import_mnemonic(&phrase, args.index, args.name)?,
            (Some(_), Some(_)) => {
                return Err(ToolError::InvalidArguments(
                    "provide either private_key or mnemonic, not both".to_string(),
                ))
            }
            (None, None) => {
                return Err(ToolError::InvalidArguments(
                    "either private_key or mnemonic is required".to_string(),
                ))
            }
        };
        to_value(&info)
    }
}

pub struct ListWalletsTool {
    ctx: Arc<ToolContext>,
}

impl ListWalletsTool {
    pub fn new(ctx: Arc<ToolContext>) -> Self {
        Self { ctx }
    }
}

#[async_trait::async_trait]
impl Tool for ListWalletsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "list_wallets".to_string(),
            description: "List wallets in the keystore. Secrets are never included.".to_string(),
            input_schema: json_schema_object(json!({}), vec![]),
            annotations: None,
        }
    }

    fn failure_prefix(&self) -> &'static str {
        "Failed to list wallets"
    }

    fn tier(&self) -> ToolTier {
        ToolTier::Keystore
    }

    async fn execute(&self, _arguments: Value) -> ToolResult<Value> {
        let wallets = self.ctx.wallets.list_wallets();
        Ok(json!({
            "count": wallets.len(),
            "wallets": wallets,
        }))
    }
}

pub struct SetCurrentWalletTool {
    ctx: Arc<ToolContext>,
}

impl SetCurrentWalletTool {
    pub fn new(ctx: Arc<ToolContext>) -> Self {
        Self { ctx }
    }
}

#[derive(Debug, Deserialize)]
struct SetCurrentWalletArgs {
    address: String,
}

#[async_trait::async_trait]
impl Tool for SetCurrentWalletTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "set_current_wallet".to_string(),
            description: "Select the wallet used when a call does not name a sender.".to_string(),
            input_schema: json_schema_object(
                json!({
                    "address": json_schema_string("Address of a wallet already in the keystore")
                }),
                vec!["address"],
            ),
            annotations: None,
        }
    }

    fn failure_prefix(&self) -> &'static str {
        "Failed to set current wallet"
    }

    fn tier(&self) -> ToolTier {
        ToolTier::Keystore
    }

    async fn execute(&self, arguments: Value) -> ToolResult<Value> {
        let args: SetCurrentWalletArgs = parse_args(arguments)?;
        let info = self.ctx.wallets.set_current(&args.address)?;
        to_value(&info)
    }
}

pub struct GetCurrentWalletTool {
    ctx: Arc<ToolContext>,
}

impl GetCurrentWalletTool {
    pub fn new(ctx: Arc<ToolContext>) -> Self {
        Self { ctx }
    }
}

#[async_trait::async_trait]
impl Tool for GetCurrentWalletTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_current_wallet".to_string(),
            description: "Show the currently selected wallet.".to_string(),
            input_schema: json_schema_object(json!({}), vec![]),
            annotations: None,
        }
    }

    fn failure_prefix(&self) -> &'static str {
        "Failed to get current wallet"
    }

    fn tier(&self) -> ToolTier {
        ToolTier::Keystore
    }

    async fn execute(&self, _arguments: Value) -> ToolResult<Value> {
        match self.ctx.wallets.current() {
            Some(info) => to_value(&info),
            None => Err(ToolError::InvalidArguments(
                "no wallet selected; create or import a wallet first".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::{offline_context, ANVIL_KEY};

    #[tokio::test]
    async fn test_create_then_list() {
        let ctx = offline_context();
        let created = CreateWalletTool::new(ctx.clone())
            .execute(json!({"name": "ops", "with_mnemonic": true}))
            .await
            .unwrap();
        assert!(created["private_key"].as_str().unwrap().starts_with("0x"));
        assert_eq!(created["mnemonic"].as_str().unwrap().split(' ').count(), 12);

        let listed = ListWalletsTool::new(ctx).execute(Value::Null).await.unwrap();
        assert_eq!(listed["count"], 1);
        assert_eq!(listed["wallets"][0]["name"], "ops");
        assert!(listed["wallets"][0].get("private_key").is_none());
    }

    #[tokio::test]
    async fn test_import_requires_exactly_one_secret() {
        let tool = ImportWalletTool::new(offline_context());
        assert!(tool.execute(json!({})).await.is_err());
        assert!(tool
            .execute(json!({"private_key": ANVIL_KEY, "mnemonic": "test test"}))
            .await
            .is_err());

        let imported = tool.execute(json!({"private_key": ANVIL_KEY})).await.unwrap();
        assert_eq!(
            imported["address"].as_str().unwrap().to_lowercase(),
            "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
        );
    }

    #[tokio::test]
    async fn test_current_wallet_selection() {
        let ctx = offline_context();
        let current = GetCurrentWalletTool::new(ctx.clone());
        assert!(current.execute(Value::Null).await.is_err());

        ImportWalletTool::new(ctx.clone())
            .execute(json!({"private_key": ANVIL_KEY, "name": "anvil"}))
            .await
            .unwrap();
        let other = CreateWalletTool::new(ctx.clone()).execute(json!({})).await.unwrap();

        let selected = SetCurrentWalletTool::new(ctx.clone())
            .execute(json!({"address": other["address"]}))
            .await
            .unwrap();
        assert_eq!(selected["is_current"], true);

        let now = current.execute(Value::Null).await.unwrap();
        assert_eq!(now["address"], other["address"]);
    }
}
