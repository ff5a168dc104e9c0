//! HTTP transport for hosted deployments.
//!
//! # Routes
//! - `POST /mcp`: one JSON-RPC message in, one JSON-RPC response out
//!   (`202 Accepted` with no body for notifications)
//! - `GET /health`: liveness plus RPC node reachability

use axum::{
    extract::State,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::blockchain::RootstockClient;
use crate::config::McpConfig;
use crate::mcp::McpServer;

const SESSION_HEADER: &str = "mcp-session-id";

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub server: Arc<McpServer>,
    pub client: RootstockClient,
}

/// Build the Axum router with all middleware layers.
#[allow(deprecated)]
pub fn build_router(state: AppState, config: &McpConfig) -> Router {
    Router::new()
        .route("/mcp", post(mcp_handler))
        .route("/health", get(health_handler))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(RequestBodyLimitLayer::new(config.max_body_bytes))
                .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout_secs))),
        )
}

/// Serve until `shutdown` resolves.
pub async fn serve_http<F>(
    listener: TcpListener,
    state: AppState,
    config: &McpConfig,
    shutdown: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    tracing::info!(address = %addr, "MCP HTTP transport listening");

    axum::serve(listener, build_router(state, config))
        .with_graceful_shutdown(shutdown)
        .await?;

    tracing::info!("MCP HTTP transport stopped");
    Ok(())
}

async fn mcp_handler(State(state): State<AppState>, body: String) -> Response {
    let Some(reply) = state.server.handle_message(&body).await else {
        return StatusCode::ACCEPTED.into_response();
    };

    let is_initialize = reply
        .result
        .as_ref()
        .is_some_and(|r| r.get("protocolVersion").is_some());

    let mut response = Json(reply).into_response();
    if is_initialize {
        let session = uuid::Uuid::new_v4().to_string();
        if let Ok(value) = HeaderValue::from_str(&session) {
            response.headers_mut().insert(SESSION_HEADER, value);
        }
    }
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let rpc_reachable = state.client.is_healthy().await;
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "chain_id": state.client.chain_id(),
        "rpc_reachable": rpc_reachable,
        "tools": state.server.registry().len(),
    }))
}
