//! Tool definition to provider function-schema conversion.

use concierge_application::ToolSchemaPort;
use concierge_domain::ToolDefinition;
use serde_json::{json, Map, Value};

/// Converts tool definitions to the OpenAI-compatible function format.
pub struct FunctionSchemaConverter;

impl ToolSchemaPort for FunctionSchemaConverter {
    fn tool_to_schema(&self, tool: &ToolDefinition) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();

        for param in &tool.parameters {
            let schema = match param.param_type.as_str() {
                "array" => json!({
                    "type": "array",
                    "items": { "type": "string" },
                    "description": param.description,
                }),
                other => json!({
                    "type": other,
                    "description": param.description,
                }),
            };
            properties.insert(param.name.clone(), schema);
            if param.required {
                required.push(Value::String(param.name.clone()));
            }
        }

        json!({
            "type": "function",
            "function": {
                "name": tool.name,
                "description": tool.description,
                "parameters": {
                    "type": "object",
                    "properties": properties,
                    "required": required,
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use concierge_domain::{ToolParameter, ToolSpec};

    fn converter() -> FunctionSchemaConverter {
        FunctionSchemaConverter
    }

    #[test]
    fn scalar_tool_schema() {
        let tool = ToolDefinition::new("get_client_purchases", "Purchase history")
            .with_parameter(ToolParameter::new("client_id", "Client ID", true))
            .with_parameter(
                ToolParameter::new("limit", "Max results", false).with_type("number"),
            );

        let schema = converter().tool_to_schema(&tool);
        assert_eq!(schema["type"], "function");
        assert_eq!(schema["function"]["name"], "get_client_purchases");
        let params = &schema["function"]["parameters"];
        assert_eq!(params["type"], "object");
        assert_eq!(params["properties"]["client_id"]["type"], "string");
        assert_eq!(params["properties"]["limit"]["type"], "number");
        assert_eq!(params["required"], json!(["client_id"]));
    }

    #[test]
    fn array_parameters_declare_string_items() {
        let tool = ToolDefinition::new("get_active_clients_memberships", "Batch memberships")
            .with_parameter(
                ToolParameter::new("client_ids", "Client IDs", true).with_type("array"),
            );

        let schema = converter().tool_to_schema(&tool);
        let ids = &schema["function"]["parameters"]["properties"]["client_ids"];
        assert_eq!(ids["type"], "array");
        assert_eq!(ids["items"]["type"], "string");
    }

    #[test]
    fn subset_conversion_preserves_selection_order() {
        let spec = ToolSpec::new()
            .register(ToolDefinition::new("get_clients", "Lookup"))
            .register(ToolDefinition::new("get_sales", "Sales"));

        let schemas = converter().schemas_for(
            &spec,
            &[
                "get_sales".to_string(),
                "get_unknown".to_string(),
                "get_clients".to_string(),
            ],
        );
        assert_eq!(schemas.len(), 2);
        assert_eq!(schemas[0]["function"]["name"], "get_sales");
        assert_eq!(schemas[1]["function"]["name"], "get_clients");
    }
}
