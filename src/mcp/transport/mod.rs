//! Transports carrying JSON-RPC messages to the [`McpServer`](crate::mcp::McpServer).

pub mod http;
pub mod stdio;

pub use http::{build_router, serve_http};
pub use stdio::{serve_lines, serve_stdio};
