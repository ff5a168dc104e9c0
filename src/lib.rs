//! Rootstock MCP server library.
//!
//! Exposes Rootstock (RSK) wallet, transfer, token and chain-query
//! operations as Model Context Protocol tools.

// Chain access
pub mod blockchain;

// Protocol surface
pub mod mcp;
pub mod tools;

// Cross-cutting concerns
pub mod config;
pub mod lifecycle;
pub mod observability;

pub use config::ServerConfig;
pub use lifecycle::Shutdown;
pub use mcp::McpServer;
