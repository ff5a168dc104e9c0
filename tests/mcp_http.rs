//! End-to-end tests for the HTTP transport against a mock Rootstock node.

use serde_json::{json, Value};

mod common;

#[tokio::test]
async fn test_health_reports_node_and_tools() {
    let node = common::start_mock_node().await;
    let (addr, _shutdown) = common::start_mcp_http(common::test_config(&node)).await;

    let body: Value = common::http_client()
        .get(format!("http://{}/health", addr))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["status"], "ok");
    assert_eq!(body["chain_id"], 31);
    assert_eq!(body["rpc_reachable"], true);
    assert_eq!(body["tools"], 19);
}

#[tokio::test]
async fn test_initialize_sets_session_and_request_id() {
    let (addr, _shutdown) = common::start_mcp_http(common::offline_config()).await;

    let response = common::http_client()
        .post(format!("http://{}/mcp", addr))
        .json(&json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "initialize",
            "params": {
                "protocolVersion": "2025-03-26",
                "capabilities": {},
                "clientInfo": { "name": "integration-test", "version": "1.0" }
            }
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert!(response.headers().contains_key("mcp-session-id"));
    assert!(response.headers().contains_key("x-request-id"));

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["result"]["protocolVersion"], "2025-03-26");
    assert_eq!(body["result"]["serverInfo"]["name"], "rootstock-mcp");
}

#[tokio::test]
async fn test_notification_is_accepted_without_body() {
    let (addr, _shutdown) = common::start_mcp_http(common::offline_config()).await;

    let response = common::http_client()
        .post(format!("http://{}/mcp", addr))
        .json(&json!({ "jsonrpc": "2.0", "method": "notifications/initialized" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 202);
    assert!(response.text().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_malformed_body_is_parse_error() {
    let (addr, _shutdown) = common::start_mcp_http(common::offline_config()).await;

    let body: Value = common::http_client()
        .post(format!("http://{}/mcp", addr))
        .body("{oops")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["error"]["code"], -32700);
    assert_eq!(body["id"], Value::Null);
}

#[tokio::test]
async fn test_network_info_from_node() {
    let node = common::start_mock_node().await;
    let (addr, _shutdown) = common::start_mcp_http(common::test_config(&node)).await;

    let (is_error, text) = common::call_tool(addr, "get_network_info", json!({})).await;
    assert!(!is_error, "{}", text);

    let info: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(info["chain_id"], 31);
    assert_eq!(info["network_name"], "Rootstock Testnet");
    assert_eq!(info["currency_symbol"], "tRBTC");
    assert_eq!(info["block_number"], common::MOCK_BLOCK_NUMBER);
    assert_eq!(info["gas_price_wei"], common::MOCK_GAS_PRICE_WEI.to_string());
}

#[tokio::test]
async fn test_native_balance_from_node() {
    let node = common::start_mock_node().await;
    let (addr, _shutdown) = common::start_mcp_http(common::test_config(&node)).await;

    let (is_error, text) = common::call_tool(
        addr,
        "get_balance",
        json!({ "address": "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266" }),
    )
    .await;
    assert!(!is_error, "{}", text);

    let balance: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(balance["balance"], "1.0");
    assert_eq!(balance["raw_balance"], "1000000000000000000");
    assert_eq!(balance["symbol"], "tRBTC");
    assert_eq!(balance["decimals"], 18);
}

#[tokio::test]
async fn test_estimate_gas_applies_multiplier() {
    let node = common::start_mock_node().await;
    let (addr, _shutdown) = common::start_mcp_http(common::test_config(&node)).await;

    let (is_error, text) = common::call_tool(
        addr,
        "estimate_gas",
        json!({ "to": "0x70997970c51812dc3a010c7d01b50e0d17dc79c8", "value": "0.01" }),
    )
    .await;
    assert!(!is_error, "{}", text);

    // 60 Mwei node price * 1.1 default multiplier
    let estimate: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(estimate["gas_limit"], 21_000);
    assert_eq!(estimate["gas_price_wei"], "66000000");
    assert_eq!(estimate["gas_price_gwei"], "0.066");
    assert_eq!(estimate["estimated_cost"], "0.000001386");
}

#[tokio::test]
async fn test_unreachable_node_is_tool_error() {
    let (addr, _shutdown) = common::start_mcp_http(common::offline_config()).await;

    let (is_error, text) = common::call_tool(
        addr,
        "get_balance",
        json!({ "address": "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266" }),
    )
    .await;

    assert!(is_error);
    assert!(text.starts_with("Error: Failed to get balance: "), "{}", text);
}

#[tokio::test]
async fn test_wallet_flow_over_http() {
    let (addr, _shutdown) = common::start_mcp_http(common::offline_config()).await;

    let (is_error, text) = common::call_tool(
        addr,
        "import_wallet",
        json!({ "mnemonic": "test test test test test test test test test test test junk", "index": 1 }),
    )
    .await;
    assert!(!is_error, "{}", text);
    let imported: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(
        imported["address"].as_str().unwrap().to_lowercase(),
        "0x70997970c51812dc3a010c7d01b50e0d17dc79c8"
    );

    let (_, text) = common::call_tool(addr, "get_current_wallet", json!({})).await;
    let current: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(current["address"], imported["address"]);
    assert!(current.get("mnemonic").is_none());
}
