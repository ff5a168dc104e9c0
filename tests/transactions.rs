//! Transaction and contract-read tools against a scripted Rootstock node.

use alloy::consensus::Transaction;
use alloy::hex;
use alloy::primitives::{Address, U256};
use alloy::sol_types::SolCall;
use rootstock_mcp::blockchain::contracts::{IERC20, IERC721};
use rootstock_mcp::{ServerConfig, Shutdown};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

mod common;

const RECIPIENT: &str = "0x70997970c51812dc3a010c7d01b50e0d17dc79c8";
const TOKEN: &str = "0x5fbdb2315678afecb367f032d93f642f64180aa3";

/// MCP transport on `node` with the Anvil account as current wallet.
async fn start_with_wallet(node: &str, tweak: impl FnOnce(&mut ServerConfig)) -> (SocketAddr, Shutdown) {
    let mut config = common::test_config(node);
    tweak(&mut config);
    let (addr, shutdown) = common::start_mcp_http(config).await;

    let (is_error, text) =
        common::call_tool(addr, "import_wallet", json!({ "private_key": common::ANVIL_KEY })).await;
    assert!(!is_error, "{}", text);
    (addr, shutdown)
}

fn selector<C: SolCall>() -> String {
    hex::encode_prefixed(C::SELECTOR)
}

#[tokio::test]
async fn test_confirmed_transfer() {
    let sent = Arc::new(Mutex::new(Vec::<String>::new()));
    let recorded = sent.clone();
    let node = common::start_programmable_node(move |method, params| match method {
        "eth_sendRawTransaction" => {
            recorded.lock().unwrap().push(params[0].as_str().unwrap().to_string());
            None
        }
        "eth_getTransactionReceipt" => Some(common::receipt(&params[0], true, None)),
        _ => None,
    })
    .await;
    let (addr, _shutdown) = start_with_wallet(&node, |_| {}).await;

    let (is_error, text) =
        common::call_tool(addr, "transfer", json!({ "to": RECIPIENT, "amount": "0.5" })).await;
    assert!(!is_error, "{}", text);

    let tx: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(tx["status"], "confirmed");
    assert_eq!(tx["block_number"], common::MOCK_BLOCK_NUMBER);
    assert_eq!(tx["gas_used"], 21_000);
    assert_eq!(tx["value"], "0.5");

    let raw = sent.lock().unwrap()[0].clone();
    assert_eq!(tx["hash"], common::raw_tx_hash(&raw));

    let envelope = common::decode_raw_tx(&raw);
    assert_eq!(envelope.chain_id(), Some(31));
    assert_eq!(envelope.value(), U256::from(500_000_000_000_000_000u64));
    assert_eq!(envelope.to(), Some(RECIPIENT.parse::<Address>().unwrap()));
    // 60 Mwei node price * 1.1 multiplier
    assert_eq!(envelope.gas_price(), Some(66_000_000));
}

#[tokio::test]
async fn test_reverted_transfer_is_failed() {
    let node = common::start_programmable_node(|method, params| match method {
        "eth_getTransactionReceipt" => Some(common::receipt(&params[0], false, None)),
        _ => None,
    })
    .await;
    let (addr, _shutdown) = start_with_wallet(&node, |_| {}).await;

    let (is_error, text) =
        common::call_tool(addr, "transfer", json!({ "to": RECIPIENT, "amount": 1 })).await;
    assert!(!is_error, "{}", text);

    let tx: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(tx["status"], "failed");
    assert_eq!(tx["block_number"], common::MOCK_BLOCK_NUMBER);
}

#[tokio::test]
async fn test_unmined_transfer_is_pending() {
    let node = common::start_mock_node().await;
    let (addr, _shutdown) = start_with_wallet(&node, |config| {
        config.network.confirmation_timeout_secs = 1;
    })
    .await;

    let (is_error, text) =
        common::call_tool(addr, "transfer", json!({ "to": RECIPIENT, "amount": "0.1" })).await;
    assert!(!is_error, "{}", text);

    let tx: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(tx["status"], "pending");
    assert!(tx["hash"].as_str().unwrap().starts_with("0x"));
    assert!(tx.get("block_number").is_none());
}

#[tokio::test]
async fn test_transfer_without_wait_skips_receipt() {
    let polled = Arc::new(AtomicBool::new(false));
    let seen = polled.clone();
    let node = common::start_programmable_node(move |method, _| {
        if method == "eth_getTransactionReceipt" {
            seen.store(true, Ordering::SeqCst);
        }
        None
    })
    .await;
    let (addr, _shutdown) = start_with_wallet(&node, |_| {}).await;

    let (is_error, text) = common::call_tool(
        addr,
        "transfer",
        json!({ "to": RECIPIENT, "amount": "0.1", "wait": false }),
    )
    .await;
    assert!(!is_error, "{}", text);

    let tx: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(tx["status"], "pending");
    assert!(!polled.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_deploy_erc20_reports_contract_address() {
    let sent = Arc::new(Mutex::new(Vec::<String>::new()));
    let recorded = sent.clone();
    let node = common::start_programmable_node(move |method, params| match method {
        "eth_sendRawTransaction" => {
            recorded.lock().unwrap().push(params[0].as_str().unwrap().to_string());
            None
        }
        "eth_getTransactionReceipt" => Some(common::receipt(&params[0], true, Some(TOKEN))),
        _ => None,
    })
    .await;
    let (addr, _shutdown) = start_with_wallet(&node, |_| {}).await;

    let (is_error, text) = common::call_tool(
        addr,
        "deploy_erc20",
        json!({
            "name": "Test",
            "symbol": "TST",
            "decimals": 6,
            "initial_supply": "1000",
            "bytecode": "0x6080",
            "gas_limit": 3_000_000
        }),
    )
    .await;
    assert!(!is_error, "{}", text);

    let deployed: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(
        deployed["contract_address"].as_str().unwrap().to_lowercase(),
        TOKEN
    );
    assert_eq!(deployed["symbol"], "TST");
    assert_eq!(deployed["initial_supply"], "1000.0");

    let envelope = common::decode_raw_tx(&sent.lock().unwrap()[0]);
    assert!(envelope.to().is_none());
    assert_eq!(envelope.gas_limit(), 3_000_000);
    assert_eq!(&envelope.input()[..2], &[0x60, 0x80]);
}

#[tokio::test]
async fn test_deploy_uses_pending_nonce() {
    let sent = Arc::new(Mutex::new(Vec::<String>::new()));
    let recorded = sent.clone();
    let node = common::start_programmable_node(move |method, params| match method {
        // Two transactions still queued in the mempool.
        "eth_getTransactionCount" if params[1] == "pending" => Some(json!("0x5")),
        "eth_getTransactionCount" => Some(json!("0x3")),
        "eth_sendRawTransaction" => {
            recorded.lock().unwrap().push(params[0].as_str().unwrap().to_string());
            None
        }
        "eth_getTransactionReceipt" => Some(common::receipt(&params[0], true, None)),
        _ => None,
    })
    .await;
    let (addr, _shutdown) = start_with_wallet(&node, |_| {}).await;

    let (is_error, text) = common::call_tool(
        addr,
        "deploy_erc721",
        json!({ "name": "Art", "symbol": "ART", "bytecode": "0x6080" }),
    )
    .await;
    assert!(!is_error, "{}", text);

    let envelope = common::decode_raw_tx(&sent.lock().unwrap()[0]);
    assert_eq!(envelope.nonce(), 5);

    // Without a receipt address the result falls back to CREATE(from, nonce).
    let deployed: Value = serde_json::from_str(&text).unwrap();
    let expected = common::ANVIL_ADDRESS.parse::<Address>().unwrap().create(5);
    assert_eq!(
        deployed["contract_address"].as_str().unwrap().to_lowercase(),
        expected.to_string().to_lowercase()
    );
}

#[tokio::test]
async fn test_mint_nft_encodes_call() {
    let sent = Arc::new(Mutex::new(Vec::<String>::new()));
    let recorded = sent.clone();
    let node = common::start_programmable_node(move |method, params| match method {
        "eth_getCode" => Some(json!("0x6080")),
        "eth_sendRawTransaction" => {
            recorded.lock().unwrap().push(params[0].as_str().unwrap().to_string());
            None
        }
        "eth_getTransactionReceipt" => Some(common::receipt(&params[0], true, None)),
        _ => None,
    })
    .await;
    let (addr, _shutdown) = start_with_wallet(&node, |_| {}).await;

    let (is_error, text) = common::call_tool(
        addr,
        "mint_nft",
        json!({ "token_address": TOKEN, "to": RECIPIENT, "token_id": 7, "token_uri": "ipfs://art/7" }),
    )
    .await;
    assert!(!is_error, "{}", text);

    let minted: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(minted["status"], "confirmed");
    assert_eq!(minted["token_id"], "7");

    let envelope = common::decode_raw_tx(&sent.lock().unwrap()[0]);
    let call = IERC721::mintCall::abi_decode(envelope.input()).unwrap();
    assert_eq!(call.to, RECIPIENT.parse::<Address>().unwrap());
    assert_eq!(call.tokenId, U256::from(7));
    assert_eq!(call.uri, "ipfs://art/7");
}

/// Node hosting a 6-decimal ERC20 at `TOKEN`.
async fn start_token_node() -> String {
    common::start_programmable_node(|method, params| {
        let input = common::call_input(params);
        match method {
            "eth_getCode" => Some(json!("0x6080")),
            "eth_call" if input.starts_with(&selector::<IERC20::nameCall>()) => {
                Some(common::abi_hex("Rootstock Dollar".to_string()))
            }
            "eth_call" if input.starts_with(&selector::<IERC20::symbolCall>()) => {
                Some(common::abi_hex("RDOC".to_string()))
            }
            "eth_call" if input.starts_with(&selector::<IERC20::decimalsCall>()) => {
                Some(common::abi_hex(U256::from(6)))
            }
            "eth_call" if input.starts_with(&selector::<IERC20::totalSupplyCall>()) => {
                Some(common::abi_hex(U256::from(1_500_000_000_000u64)))
            }
            "eth_call" if input.starts_with(&selector::<IERC20::balanceOfCall>()) => {
                Some(common::abi_hex(U256::from(2_500_000u64)))
            }
            _ => None,
        }
    })
    .await
}

#[tokio::test]
async fn test_token_info_decodes_erc20() {
    let node = start_token_node().await;
    let (addr, _shutdown) = common::start_mcp_http(common::test_config(&node)).await;

    let (is_error, text) =
        common::call_tool(addr, "get_token_info", json!({ "token_address": TOKEN })).await;
    assert!(!is_error, "{}", text);

    let info: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(info["name"], "Rootstock Dollar");
    assert_eq!(info["symbol"], "RDOC");
    assert_eq!(info["decimals"], 6);
    assert_eq!(info["total_supply"], "1500000.0");
}

#[tokio::test]
async fn test_token_balance_decodes_erc20() {
    let node = start_token_node().await;
    let (addr, _shutdown) = common::start_mcp_http(common::test_config(&node)).await;

    let (is_error, text) = common::call_tool(
        addr,
        "get_balance",
        json!({ "address": RECIPIENT, "token_address": TOKEN }),
    )
    .await;
    assert!(!is_error, "{}", text);

    let balance: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(balance["balance"], "2.5");
    assert_eq!(balance["raw_balance"], "2500000");
    assert_eq!(balance["symbol"], "RDOC");
    assert_eq!(balance["decimals"], 6);
}

#[tokio::test]
async fn test_call_contract_decodes_outputs() {
    let node = start_token_node().await;
    let (addr, _shutdown) = common::start_mcp_http(common::test_config(&node)).await;

    let (is_error, text) = common::call_tool(
        addr,
        "call_contract",
        json!({
            "contract_address": TOKEN,
            "function_signature": "balanceOf(address) returns (uint256)",
            "args": [RECIPIENT]
        }),
    )
    .await;
    assert!(!is_error, "{}", text);

    let output: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(output["function"], "balanceOf");
    assert_eq!(output["result"], "2500000");
}

#[tokio::test]
async fn test_get_block_decodes_header() {
    let zero = format!("0x{}", "00".repeat(32));
    let node = common::start_programmable_node(move |method, _| match method {
        "eth_getBlockByNumber" => Some(json!({
            "hash": format!("0x{}", "aa".repeat(32)),
            "parentHash": format!("0x{}", "bb".repeat(32)),
            "sha3Uncles": zero,
            "miner": RECIPIENT,
            "stateRoot": zero,
            "transactionsRoot": zero,
            "receiptsRoot": zero,
            "logsBloom": format!("0x{}", "00".repeat(256)),
            "difficulty": "0x1",
            "number": "0x64",
            "gasLimit": "0x67c280",
            "gasUsed": "0x5208",
            "timestamp": "0x65000000",
            "extraData": "0x",
            "mixHash": zero,
            "nonce": "0x0000000000000000",
            "size": "0x100",
            "uncles": [],
            "transactions": [format!("0x{}", "cc".repeat(32))]
        })),
        _ => None,
    })
    .await;
    let (addr, _shutdown) = common::start_mcp_http(common::test_config(&node)).await;

    let (is_error, text) = common::call_tool(addr, "get_block", json!({ "block_number": 100 })).await;
    assert!(!is_error, "{}", text);

    let block: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(block["number"], 100);
    assert_eq!(block["gas_used"], 21_000);
    assert_eq!(block["transaction_count"], 1);
    assert_eq!(block["miner"].as_str().unwrap().to_lowercase(), RECIPIENT);
}
