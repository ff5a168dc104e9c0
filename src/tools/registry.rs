//! MCP tool trait and registry.

use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use crate::mcp::protocol::{CallToolResult, ToolAnnotations, ToolSchema};
use crate::observability::metrics;
use crate::tools::ToolResult;

/// Tool executor trait
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool schema for MCP
    fn schema(&self) -> ToolSchema;

    /// Message prefixed to any failure, e.g. "Failed to get balance"
    fn failure_prefix(&self) -> &'static str;

    /// Execute the tool; the value is rendered as pretty JSON text
    async fn execute(&self, arguments: Value) -> ToolResult<Value>;

    /// What the tool touches (for client hints)
    fn tier(&self) -> ToolTier {
        ToolTier::Read
    }
}

/// What a tool is allowed to touch
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ToolTier {
    /// Chain reads only
    Read,
    /// Mutates the in-memory keystore, no network writes
    Keystore,
    /// Signs and broadcasts transactions
    Transaction,
}

impl ToolTier {
    fn annotations(self) -> ToolAnnotations {
        ToolAnnotations {
            read_only_hint: self == ToolTier::Read,
            open_world_hint: self != ToolTier::Keystore,
        }
    }
}

/// Tool registry for managing available tools
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: BTreeMap::new(),
        }
    }

    /// Register a tool, replacing any tool with the same name
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let schema = tool.schema();
        self.tools.insert(schema.name, tool);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// All tool schemas, sorted by name
    pub fn list_schemas(&self) -> Vec<ToolSchema> {
        self.tools
            .values()
            .map(|tool| {
                let mut schema = tool.schema();
                schema.annotations = Some(tool.tier().annotations());
                schema
            })
            .collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Run a tool and turn its outcome into MCP text content.
    ///
    /// Failures never escape: they come back as `isError` results.
    pub async fn call(&self, name: &str, arguments: Value) -> CallToolResult {
        let Some(tool) = self.get(name) else {
            tracing::warn!(tool = name, "Unknown tool requested");
            return CallToolResult::error(format!("Unknown tool: {}", name));
        };

        let started = Instant::now();
        let outcome = tool.execute(arguments).await;
        let elapsed = started.elapsed();
        metrics::record_tool_call(name, outcome.is_ok(), elapsed);

        match outcome {
            Ok(value) => {
                tracing::debug!(tool = name, elapsed_ms = elapsed.as_millis() as u64, "Tool call succeeded");
                let text = match value {
                    Value::String(s) => s,
                    other => serde_json::to_string_pretty(&other).unwrap_or_else(|_| other.to_string()),
                };
                CallToolResult::text(text)
            }
            Err(e) => {
                tracing::warn!(tool = name, error = %e, "Tool call failed");
                CallToolResult::error(format!("{}: {}", tool.failure_prefix(), e))
            }
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// Helper functions for creating tool schemas

pub fn json_schema_object(properties: Value, required: Vec<&str>) -> Value {
    serde_json::json!({
        "type": "object",
        "properties": properties,
        "required": required
    })
}

pub fn json_schema_string(description: &str) -> Value {
    serde_json::json!({
        "type": "string",
        "description": description
    })
}

pub fn json_schema_integer(description: &str) -> Value {
    serde_json::json!({
        "type": "integer",
        "minimum": 0,
        "description": description
    })
}

/// Decimal amount accepted as string or number
pub fn json_schema_amount(description: &str) -> Value {
    serde_json::json!({
        "type": ["string", "number"],
        "description": description
    })
}

pub fn json_schema_boolean(description: &str) -> Value {
    serde_json::json!({
        "type": "boolean",
        "description": description
    })
}

pub fn json_schema_array(items: Value, description: &str) -> Value {
    serde_json::json!({
        "type": "array",
        "items": items,
        "description": description
    })
}
