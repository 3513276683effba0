//! Tool executor backed by the upstream gateway.

use async_trait::async_trait;
use concierge_application::ToolExecutorPort;
use concierge_domain::{ToolCall, ToolError, ToolResult, ToolSpec};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use super::catalog;
use super::composite;
use crate::upstream::UpstreamGateway;

/// Executes catalog tools against the studio API.
///
/// Single-endpoint tools become one GET with PascalCase query keys;
/// the two composites fan out into batched per-client fetches.
pub struct StudioToolProvider {
    gateway: Arc<UpstreamGateway>,
    spec: ToolSpec,
    endpoints: HashMap<String, &'static str>,
}

impl StudioToolProvider {
    pub fn new(gateway: Arc<UpstreamGateway>) -> Self {
        Self {
            gateway,
            spec: catalog::build_spec(),
            endpoints: catalog::endpoint_table(),
        }
    }

    /// Query parameters for a single-endpoint call, sorted by key so
    /// identical calls produce identical URLs for the cache.
    fn query_params(call: &ToolCall) -> Vec<(String, Value)> {
        let mut params: Vec<(String, Value)> = call
            .arguments
            .iter()
            .filter(|(_, value)| !value.is_null())
            .map(|(name, value)| (catalog::wire_key(name), value.clone()))
            .collect();
        params.sort_by(|a, b| a.0.cmp(&b.0));
        params
    }
}

#[async_trait]
impl ToolExecutorPort for StudioToolProvider {
    fn tool_spec(&self) -> &ToolSpec {
        &self.spec
    }

    async fn execute(&self, call: &ToolCall) -> ToolResult {
        debug!(tool = %call.tool_name, "Executing tool");
        match call.tool_name.as_str() {
            catalog::CLIENTS_WITH_VISITS => {
                composite::clients_with_visits(&self.gateway, call).await
            }
            catalog::NON_MEMBER_TRIAL_CLIENTS => {
                composite::non_member_trial_clients(&self.gateway, call).await
            }
            name => {
                let Some(endpoint) = self.endpoints.get(name) else {
                    return ToolResult::failure(name, ToolError::not_found(name));
                };
                let params = Self::query_params(call);
                match self.gateway.get(endpoint, &params).await {
                    Ok(payload) => ToolResult::success(name, payload.to_string()),
                    Err(e) => ToolResult::failure(name, e.into_tool_error()),
                }
            }
        }
    }
}
