//! Model Context Protocol surface.
//!
//! # Data Flow
//! ```text
//! MCP client
//!     → transport (stdio lines | HTTP POST /mcp)
//!     → server.rs (JSON-RPC dispatch)
//!     → tools::ToolRegistry (tool execution, error wrapping)
//!     → JSON-RPC response back through the same transport
//! ```

pub mod protocol;
pub mod server;
pub mod transport;

pub use server::McpServer;
