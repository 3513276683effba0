//! Tool Schema port
//!
//! Converts tool definitions into the provider-specific JSON schema
//! passed alongside the conversational call.

use concierge_domain::tool::entities::{ToolDefinition, ToolSpec};

/// Port for converting tool definitions to provider schemas.
pub trait ToolSchemaPort: Send + Sync {
    /// Convert a single tool definition.
    fn tool_to_schema(&self, tool: &ToolDefinition) -> serde_json::Value;

    /// Convert the named subset of the catalog, preserving selection
    /// order. Names not present in the catalog are skipped.
    fn schemas_for(&self, spec: &ToolSpec, names: &[String]) -> Vec<serde_json::Value> {
        names
            .iter()
            .filter_map(|name| spec.get(name))
            .map(|tool| self.tool_to_schema(tool))
            .collect()
    }
}
