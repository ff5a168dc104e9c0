//! JSON-RPC method dispatch for the MCP session.
//!
//! Transport-agnostic: stdio and HTTP both feed raw messages into
//! [`McpServer::handle_message`] and write back whatever it returns.

use serde_json::{json, Value};

use crate::mcp::protocol::{
    negotiate_version, CallToolParams, Implementation, InitializeParams, InitializeResult,
    JsonRpcError, JsonRpcRequest, JsonRpcResponse, ListToolsResult, ServerCapabilities,
    ToolsCapability, JSONRPC_VERSION, SUPPORTED_PROTOCOL_VERSIONS,
};
use crate::tools::ToolRegistry;

const INSTRUCTIONS: &str = "Tools for the Rootstock (RSK) EVM chain. Create or import a wallet \
before sending transactions; amounts are in whole units (RBTC or tokens), gas prices in gwei.";

/// MCP server: owns the tool registry and answers protocol requests.
pub struct McpServer {
    info: Implementation,
    registry: ToolRegistry,
}

impl McpServer {
    pub fn new(name: impl Into<String>, registry: ToolRegistry) -> Self {
        Self {
            info: Implementation {
                name: name.into(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            registry,
        }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Handle one raw JSON-RPC message. Notifications produce no response.
    pub async fn handle_message(&self, raw: &str) -> Option<JsonRpcResponse> {
        let value: Value = match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(error = %e, "Unparseable JSON-RPC message");
                return Some(JsonRpcResponse::error(Value::Null, JsonRpcError::parse_error(e)));
            }
        };

        let id = value.get("id").cloned().unwrap_or(Value::Null);
        let request: JsonRpcRequest = match serde_json::from_value(value) {
            Ok(request) => request,
            Err(e) => return Some(JsonRpcResponse::error(id, JsonRpcError::invalid_request(e))),
        };

        if request.jsonrpc != JSONRPC_VERSION {
            return Some(JsonRpcResponse::error(
                id,
                JsonRpcError::invalid_request(format!("unsupported jsonrpc version '{}'", request.jsonrpc)),
            ));
        }

        self.handle_request(request).await
    }

    /// Dispatch a parsed request.
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        if request.is_notification() {
            tracing::debug!(method = %request.method, "Notification received");
            return None;
        }

        let id = request.id.clone().unwrap_or(Value::Null);
        let params = request.params.unwrap_or(Value::Null);
        tracing::debug!(method = %request.method, "Request received");

        let response = match request.method.as_str() {
            "initialize" => self.initialize(id, params),
            "ping" => JsonRpcResponse::success(id, json!({})),
            "tools/list" => JsonRpcResponse::from_result(
                id,
                &ListToolsResult {
                    tools: self.registry.list_schemas(),
                },
            ),
            "tools/call" => self.call_tool(id, params).await,
            method => JsonRpcResponse::error(id, JsonRpcError::method_not_found(method)),
        };

        Some(response)
    }

    fn initialize(&self, id: Value, params: Value) -> JsonRpcResponse {
        let requested = serde_json::from_value::<InitializeParams>(params)
            .map(|p| {
                if let Some(client) = &p.client_info {
                    tracing::info!(client = %client.name, version = %client.version, "Client connected");
                }
                p.protocol_version
            })
            .unwrap_or_else(|_| SUPPORTED_PROTOCOL_VERSIONS[0].to_string());

        JsonRpcResponse::from_result(
            id,
            &InitializeResult {
                protocol_version: negotiate_version(&requested).to_string(),
                capabilities: ServerCapabilities {
                    tools: ToolsCapability { list_changed: false },
                },
                server_info: self.info.clone(),
                instructions: Some(INSTRUCTIONS.to_string()),
            },
        )
    }

    async fn call_tool(&self, id: Value, params: Value) -> JsonRpcResponse {
        let params: CallToolParams = match serde_json::from_value(params) {
            Ok(params) => params,
            Err(e) => {
                return JsonRpcResponse::error(
                    id,
                    JsonRpcError::invalid_params(format!("Invalid tools/call params: {}", e)),
                )
            }
        };

        tracing::info!(tool = %params.name, "Tool call");
        let result = self.registry.call(&params.name, params.arguments).await;
        JsonRpcResponse::from_result(id, &result)
    }
}
