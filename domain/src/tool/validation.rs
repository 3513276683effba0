//! Parameter validation for tool calls.
//!
//! Runs synchronously before an executor dispatches to the network:
//! coerces numeric identifiers to their canonical string form, then
//! checks the required-field contract declared in the tool's schema.
//! A failed check produces a [`ValidationRejection`] that teaches the
//! model the correct next step instead of letting a doomed upstream
//! call happen.
//!
//! Per-invocation state machine:
//! `received → {validated → dispatched → {succeeded, upstream-failed}} | rejected`

use crate::tool::entities::{ToolCall, ToolDefinition};
use crate::tool::value_objects::{ToolError, ToolResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Structured rejection returned when a required parameter is missing.
///
/// Fed back to the model as the tool's result; a guided-retry signal,
/// not a turn-level error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationRejection {
    /// What went wrong.
    pub error: String,
    /// Ordered corrective steps for the model.
    pub instructions: Vec<String>,
    /// A worked example of a correct call.
    pub example: Value,
    /// All parameters the tool's contract requires.
    pub required_parameters: Vec<String>,
    /// Parameter names actually received in this call.
    pub received_parameters: Vec<String>,
}

impl ValidationRejection {
    /// Serialize to the JSON text placed in the tool result.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| self.error.clone())
    }

    /// Wrap into a failed [`ToolResult`] without invoking any executor.
    pub fn into_result(self, tool_name: &str) -> ToolResult {
        let json = self.to_json();
        ToolResult::failure(
            tool_name,
            ToolError::new("VALIDATION_REJECTED", self.error).with_details(json),
        )
    }
}

/// Outcome of validating one tool call.
#[derive(Debug, Clone)]
pub enum ValidationOutcome {
    /// Parameters satisfy the contract; dispatch the coerced call.
    Pass(ToolCall),
    /// Contract violated; return the rejection, do not dispatch.
    Reject(ValidationRejection),
}

/// Validate a call against its tool definition.
///
/// Coercion happens first so a numeric `client_id` both passes the
/// required check and reaches the executor as a string.
pub fn validate_call(def: &ToolDefinition, call: &ToolCall) -> ValidationOutcome {
    let coerced = coerce_arguments(def, call.clone());

    let mut missing = Vec::new();
    for param in def.parameters.iter().filter(|p| p.required) {
        let value = coerced.arguments.get(&param.name);
        let satisfied = match value {
            None | Some(Value::Null) => false,
            Some(Value::String(s)) => !s.trim().is_empty(),
            Some(Value::Array(items)) => !items.is_empty(),
            Some(_) => true,
        };
        if !satisfied {
            missing.push(param.name.clone());
        }
    }

    if missing.is_empty() {
        ValidationOutcome::Pass(coerced)
    } else {
        ValidationOutcome::Reject(build_rejection(def, &coerced, missing))
    }
}

/// Coerce identifier-shaped arguments to the upstream string contract.
///
/// Upstream identifiers are strings; large IDs arriving as JSON numbers
/// must not mismatch the string-keyed contract. Declared string
/// parameters get stringified, and numeric elements of declared array
/// parameters do too.
pub fn coerce_arguments(def: &ToolDefinition, mut call: ToolCall) -> ToolCall {
    for param in &def.parameters {
        let Some(value) = call.arguments.get_mut(&param.name) else {
            continue;
        };
        match param.param_type.as_str() {
            "string" => {
                if let Value::Number(n) = value {
                    *value = Value::String(n.to_string());
                }
            }
            "array" => {
                if let Value::Array(items) = value {
                    for item in items.iter_mut() {
                        if let Value::Number(n) = item {
                            *item = Value::String(n.to_string());
                        }
                    }
                }
            }
            _ => {}
        }
    }
    call
}

fn build_rejection(
    def: &ToolDefinition,
    call: &ToolCall,
    missing: Vec<String>,
) -> ValidationRejection {
    let required: Vec<String> = def
        .required_parameters()
        .into_iter()
        .map(String::from)
        .collect();
    let mut received: Vec<String> = call.arguments.keys().cloned().collect();
    received.sort_unstable();

    let mut instructions = Vec::new();
    if missing.iter().any(|name| name.contains("client")) {
        instructions.push(
            "Call get_clients first with a search_text term to look up the client".to_string(),
        );
        instructions.push("Extract the Id field from the matching client record".to_string());
        instructions.push(format!(
            "Retry {} with that Id filled into the missing parameter(s)",
            def.name
        ));
    } else {
        instructions.push(format!(
            "Supply a value for: {} and retry {}",
            missing.join(", "),
            def.name
        ));
    }

    let mut example = serde_json::Map::new();
    for name in &required {
        let value = if name.ends_with("_ids") {
            serde_json::json!(["100000123", "100000456"])
        } else if name.ends_with("_id") {
            serde_json::json!("100000123")
        } else if name.contains("date") {
            serde_json::json!("2026-01-01")
        } else {
            serde_json::json!("value")
        };
        example.insert(name.clone(), value);
    }

    ValidationRejection {
        error: format!(
            "Missing required parameter(s) for {}: {}",
            def.name,
            missing.join(", ")
        ),
        instructions,
        example: Value::Object(example),
        required_parameters: required,
        received_parameters: received,
    }
}
