//! Validation wrapper around a tool executor.
//!
//! Runs the schema-derived required-field check and identifier coercion
//! before any network I/O. Rejections return a structured corrective
//! payload as the tool result; the inner executor is never invoked.

use async_trait::async_trait;
use concierge_application::ToolExecutorPort;
use concierge_domain::tool::validation::{validate_call, ValidationOutcome};
use concierge_domain::{ToolCall, ToolError, ToolResult, ToolSpec};
use std::sync::Arc;
use tracing::debug;

pub struct ValidatingExecutor {
    inner: Arc<dyn ToolExecutorPort>,
}

impl ValidatingExecutor {
    pub fn new(inner: Arc<dyn ToolExecutorPort>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl ToolExecutorPort for ValidatingExecutor {
    fn tool_spec(&self) -> &ToolSpec {
        self.inner.tool_spec()
    }

    async fn execute(&self, call: &ToolCall) -> ToolResult {
        let Some(definition) = self.inner.get_tool(&call.tool_name) else {
            return ToolResult::failure(&call.tool_name, ToolError::not_found(&call.tool_name));
        };
        match validate_call(definition, call) {
            ValidationOutcome::Pass(coerced) => self.inner.execute(&coerced).await,
            ValidationOutcome::Reject(rejection) => {
                debug!(tool = %call.tool_name, "Rejected tool call: {}", rejection.error);
                rejection.into_result(&call.tool_name)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use concierge_domain::{ToolDefinition, ToolParameter};
    use parking_lot::Mutex;
    use serde_json::json;

    struct RecordingInner {
        spec: ToolSpec,
        calls: Mutex<Vec<ToolCall>>,
    }

    impl RecordingInner {
        fn new() -> Self {
            let spec = ToolSpec::new().register(
                ToolDefinition::new("get_client_visits", "Visit history for one client")
                    .with_parameter(ToolParameter::new("client_id", "Client ID", true)),
            );
            Self {
                spec,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ToolExecutorPort for RecordingInner {
        fn tool_spec(&self) -> &ToolSpec {
            &self.spec
        }

        async fn execute(&self, call: &ToolCall) -> ToolResult {
            self.calls.lock().push(call.clone());
            ToolResult::success(&call.tool_name, r#"{"Visits":[]}"#)
        }
    }

    #[tokio::test]
    async fn valid_call_reaches_the_inner_executor_coerced() {
        let inner = Arc::new(RecordingInner::new());
        let executor = ValidatingExecutor::new(inner.clone());

        let call = ToolCall::new("get_client_visits").with_arg("client_id", 100000123u64);
        let result = executor.execute(&call).await;
        assert!(result.is_success());

        let dispatched = inner.calls.lock();
        assert_eq!(dispatched.len(), 1);
        assert_eq!(dispatched[0].arguments["client_id"], json!("100000123"));
    }

    #[tokio::test]
    async fn missing_required_parameter_never_dispatches() {
        let inner = Arc::new(RecordingInner::new());
        let executor = ValidatingExecutor::new(inner.clone());

        let result = executor.execute(&ToolCall::new("get_client_visits")).await;
        assert!(!result.is_success());
        assert_eq!(result.error().unwrap().code, "VALIDATION_REJECTED");
        assert!(inner.calls.lock().is_empty());

        let payload: serde_json::Value = serde_json::from_str(&result.model_output()).unwrap();
        assert_eq!(payload["required_parameters"][0], "client_id");
    }

    #[tokio::test]
    async fn unknown_tool_is_not_found() {
        let executor = ValidatingExecutor::new(Arc::new(RecordingInner::new()));
        let result = executor.execute(&ToolCall::new("get_nonexistent")).await;
        assert_eq!(result.error().unwrap().code, "NOT_FOUND");
    }
}
