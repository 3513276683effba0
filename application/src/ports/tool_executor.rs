//! Tool Executor port
//!
//! Defines how the application layer executes tools. The adapter in the
//! infrastructure layer wraps every executor with parameter validation
//! before any network I/O happens.

use async_trait::async_trait;
use concierge_domain::tool::entities::{ToolCall, ToolDefinition, ToolSpec};
use concierge_domain::tool::value_objects::ToolResult;

/// Port for tool execution
#[async_trait]
pub trait ToolExecutorPort: Send + Sync {
    /// The catalog of all available tools.
    fn tool_spec(&self) -> &ToolSpec;

    /// Check if a tool is available
    fn has_tool(&self, name: &str) -> bool {
        self.tool_spec().contains(name)
    }

    /// Get the definition of a specific tool
    fn get_tool(&self, name: &str) -> Option<&ToolDefinition> {
        self.tool_spec().get(name)
    }

    /// Execute a tool call. Failures are carried in the result, never
    /// raised out of this method.
    async fn execute(&self, call: &ToolCall) -> ToolResult;
}
