//! Tool result and error value objects.
//!
//! Every tool invocation produces a [`ToolResult`]. Failures — upstream
//! errors, authentication problems, validation rejections — stay inside
//! the result so they flow back into the model's reasoning loop instead
//! of aborting the turn.

use serde::{Deserialize, Serialize};

/// Error that occurred during tool execution.
///
/// | Code | Meaning |
/// |------|---------|
/// | `VALIDATION_REJECTED` | Required parameter missing; guided-retry payload in `details` |
/// | `AUTHENTICATION_FAILED` | Upstream rejected the credentials (401/403) |
/// | `UPSTREAM_ERROR` | Any other non-2xx upstream response |
/// | `NOT_FOUND` | Unknown tool name |
/// | `EXECUTION_FAILED` | Transport or decoding failure |
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolError {
    /// Error code (e.g. "UPSTREAM_ERROR")
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Additional structured details (JSON text for rejections)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ToolError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn not_found(tool: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", format!("Unknown tool: {}", tool.into()))
    }

    pub fn authentication_failed(message: impl Into<String>) -> Self {
        Self::new("AUTHENTICATION_FAILED", message)
    }

    pub fn upstream(status: u16, body: impl Into<String>) -> Self {
        Self::new(
            "UPSTREAM_ERROR",
            format!("Upstream API error: {} - {}", status, body.into()),
        )
    }

    pub fn execution_failed(message: impl Into<String>) -> Self {
        Self::new("EXECUTION_FAILED", message)
    }
}

impl std::fmt::Display for ToolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(details) = &self.details {
            write!(f, " ({})", details)?;
        }
        Ok(())
    }
}

impl std::error::Error for ToolError {}

/// Result of a tool execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// Name of the tool that was executed
    pub tool_name: String,
    /// Whether the execution was successful
    pub success: bool,
    /// Output content (JSON text for upstream payloads)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    /// Error information (for failed execution)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ToolError>,
}

impl ToolResult {
    /// Create a successful result
    pub fn success(tool_name: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            success: true,
            output: Some(output.into()),
            error: None,
        }
    }

    /// Create a failed result
    pub fn failure(tool_name: impl Into<String>, error: ToolError) -> Self {
        Self {
            tool_name: tool_name.into(),
            success: false,
            output: None,
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn output(&self) -> Option<&str> {
        self.output.as_deref()
    }

    pub fn error(&self) -> Option<&ToolError> {
        self.error.as_ref()
    }

    /// Text fed back to the model for this result.
    ///
    /// Rejections carry their structured payload in `details` so the
    /// model sees the corrective instructions, not just a message.
    pub fn model_output(&self) -> String {
        if let Some(output) = &self.output {
            return output.clone();
        }
        match &self.error {
            Some(err) => err.details.clone().unwrap_or_else(|| err.message.clone()),
            None => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_result() {
        let result = ToolResult::success("get_clients", r#"{"Clients":[]}"#);
        assert!(result.is_success());
        assert_eq!(result.output(), Some(r#"{"Clients":[]}"#));
        assert!(result.error().is_none());
        assert_eq!(result.model_output(), r#"{"Clients":[]}"#);
    }

    #[test]
    fn failure_result() {
        let result = ToolResult::failure("get_sales", ToolError::upstream(500, "oops"));
        assert!(!result.is_success());
        assert!(result.output().is_none());
        assert_eq!(result.error().unwrap().code, "UPSTREAM_ERROR");
        assert!(result.model_output().contains("500"));
    }

    #[test]
    fn model_output_prefers_details() {
        let err = ToolError::new("VALIDATION_REJECTED", "missing client_id")
            .with_details(r#"{"required_parameters":["client_id"]}"#);
        let result = ToolResult::failure("get_client_visits", err);
        assert!(result.model_output().contains("required_parameters"));
    }
}
