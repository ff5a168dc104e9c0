//! Metrics collection and exposition.
//!
//! # Metrics
//! - `rootstock_mcp_tool_calls_total` (counter): tool calls by tool, outcome
//! - `rootstock_mcp_tool_duration_seconds` (histogram): tool latency
//! - `rootstock_mcp_rpc_healthy` (gauge): 1=node reachable, 0=unreachable
//!
//! Without an installed recorder every update is a no-op.

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Duration;

/// Start the Prometheus scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_tool_call(tool: &str, success: bool, elapsed: Duration) {
    let outcome = if success { "success" } else { "error" };
    metrics::counter!(
        "rootstock_mcp_tool_calls_total",
        "tool" => tool.to_string(),
        "outcome" => outcome
    )
    .increment(1);
    metrics::histogram!("rootstock_mcp_tool_duration_seconds", "tool" => tool.to_string())
        .record(elapsed.as_secs_f64());
}

pub fn record_rpc_health(healthy: bool) {
    metrics::gauge!("rootstock_mcp_rpc_healthy").set(if healthy { 1.0 } else { 0.0 });
}
