//! Shared utilities for integration tests.

use alloy::consensus::TxEnvelope;
use alloy::eips::eip2718::Decodable2718;
use alloy::hex;
use alloy::primitives::keccak256;
use alloy::sol_types::SolValue;
use axum::{routing::post, Json, Router};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use rootstock_mcp::blockchain::WalletManager;
use rootstock_mcp::config::{ServerConfig, Transport};
use rootstock_mcp::lifecycle::{build_runtime, Shutdown};
use rootstock_mcp::mcp::transport::{http::AppState, serve_http};

/// Block number reported by the mock node (0x64).
pub const MOCK_BLOCK_NUMBER: u64 = 100;

/// Gas price reported by the mock node, in wei.
pub const MOCK_GAS_PRICE_WEI: u128 = 60_000_000;

/// Configuration pointing at `rpc_url`, HTTP transport on an ephemeral port.
pub fn test_config(rpc_url: &str) -> ServerConfig {
    let mut config = ServerConfig::default();
    config.server.transport = Transport::Http;
    config.server.bind_address = "127.0.0.1:0".to_string();
    config.network.rpc_url = rpc_url.to_string();
    config.network.rpc_timeout_secs = 2;
    config.network.poll_interval_ms = 50;
    config.network.confirmation_timeout_secs = 5;
    config
}

/// Configuration whose RPC endpoint refuses connections.
#[allow(dead_code)]
pub fn offline_config() -> ServerConfig {
    test_config("http://127.0.0.1:1")
}

/// Anvil/Hardhat account #0.
#[allow(dead_code)]
pub const ANVIL_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
#[allow(dead_code)]
pub const ANVIL_ADDRESS: &str = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266";

/// Start a minimal Rootstock JSON-RPC node answering read calls.
#[allow(dead_code)]
pub async fn start_mock_node() -> String {
    start_programmable_node(|_, _| None).await
}

/// Start a mock node where `handler` answers first.
///
/// Returning `None` falls through to the defaults: chain 31 at block 100,
/// 1 RBTC balances, no contract code, nonce 0, broadcasts accepted and
/// receipts not yet available.
pub async fn start_programmable_node<F>(handler: F) -> String
where
    F: Fn(&str, &Value) -> Option<Value> + Send + Sync + 'static,
{
    let handler = Arc::new(handler);
    let app = Router::new().route(
        "/",
        post(move |Json(request): Json<Value>| {
            let handler = handler.clone();
            async move {
                let id = request.get("id").cloned().unwrap_or(Value::Null);
                let method = request.get("method").and_then(Value::as_str).unwrap_or_default();
                let params = request.get("params").cloned().unwrap_or(Value::Null);

                let reply = match handler(method, &params).or_else(|| default_result(method, &params)) {
                    Some(result) => json!({ "jsonrpc": "2.0", "id": id, "result": result }),
                    None => json!({
                        "jsonrpc": "2.0",
                        "id": id,
                        "error": { "code": -32601, "message": format!("method {} not mocked", method) }
                    }),
                };
                Json(reply)
            }
        }),
    );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    format!("http://{}", addr)
}

fn default_result(method: &str, params: &Value) -> Option<Value> {
    let result = match method {
        "eth_chainId" => json!("0x1f"),
        "eth_blockNumber" => json!(format!("{:#x}", MOCK_BLOCK_NUMBER)),
        "eth_gasPrice" => json!(format!("{:#x}", MOCK_GAS_PRICE_WEI)),
        // 1 RBTC
        "eth_getBalance" => json!("0xde0b6b3a7640000"),
        "eth_estimateGas" => json!("0x5208"),
        "eth_getTransactionCount" => json!("0x0"),
        "eth_getCode" => json!("0x"),
        "eth_sendRawTransaction" => json!(raw_tx_hash(params[0].as_str()?)),
        "eth_getTransactionReceipt" => Value::Null,
        _ => return None,
    };
    Some(result)
}

/// Hash of a hex-encoded signed transaction.
pub fn raw_tx_hash(raw: &str) -> String {
    keccak256(hex::decode(raw).unwrap()).to_string()
}

/// Decode a hex-encoded signed transaction.
#[allow(dead_code)]
pub fn decode_raw_tx(raw: &str) -> TxEnvelope {
    let bytes = hex::decode(raw).unwrap();
    TxEnvelope::decode_2718(&mut bytes.as_slice()).unwrap()
}

/// Legacy receipt mined in the mock's latest block.
#[allow(dead_code)]
pub fn receipt(tx_hash: &Value, success: bool, contract_address: Option<&str>) -> Value {
    json!({
        "transactionHash": tx_hash,
        "transactionIndex": "0x0",
        "blockHash": format!("0x{}", "11".repeat(32)),
        "blockNumber": format!("{:#x}", MOCK_BLOCK_NUMBER),
        "from": ANVIL_ADDRESS,
        "to": if contract_address.is_some() { Value::Null } else { json!(ANVIL_ADDRESS) },
        "cumulativeGasUsed": "0x5208",
        "gasUsed": "0x5208",
        "effectiveGasPrice": format!("{:#x}", MOCK_GAS_PRICE_WEI),
        "contractAddress": contract_address,
        "logs": [],
        "logsBloom": format!("0x{}", "00".repeat(256)),
        "type": "0x0",
        "status": if success { "0x1" } else { "0x0" }
    })
}

/// ABI-encoded return data as an RPC hex string.
#[allow(dead_code)]
pub fn abi_hex<T: SolValue>(value: T) -> Value {
    json!(hex::encode_prefixed(value.abi_encode()))
}

/// Calldata of an `eth_call`/`eth_estimateGas` request.
#[allow(dead_code)]
pub fn call_input(params: &Value) -> String {
    let tx = &params[0];
    tx.get("input")
        .or_else(|| tx.get("data"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Start the MCP HTTP transport; returns its address and shutdown handle.
pub async fn start_mcp_http(config: ServerConfig) -> (SocketAddr, Shutdown) {
    let wallets = WalletManager::new(config.network.chain_id);
    let runtime = build_runtime(&config, wallets).unwrap();

    let listener = TcpListener::bind(&config.server.bind_address).await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();

    let state = AppState {
        server: runtime.server,
        client: runtime.client,
    };
    let wait = shutdown.wait();
    let server_config = config.server.clone();
    tokio::spawn(async move {
        let _ = serve_http(listener, state, &server_config, wait).await;
    });

    (addr, shutdown)
}

pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .timeout(Duration::from_secs(10))
        .build()
        .unwrap()
}

/// POST one JSON-RPC request to `/mcp` and return the parsed response body.
pub async fn rpc(addr: SocketAddr, id: u64, method: &str, params: Value) -> Value {
    http_client()
        .post(format!("http://{}/mcp", addr))
        .json(&json!({ "jsonrpc": "2.0", "id": id, "method": method, "params": params }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

/// Call a tool and return `(is_error, text)`.
#[allow(dead_code)]
pub async fn call_tool(addr: SocketAddr, name: &str, arguments: Value) -> (bool, String) {
    let response = rpc(addr, 1, "tools/call", json!({ "name": name, "arguments": arguments })).await;
    let result = &response["result"];
    (
        result["isError"].as_bool().unwrap_or(false),
        result["content"][0]["text"].as_str().unwrap_or_default().to_string(),
    )
}
