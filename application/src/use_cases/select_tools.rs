//! Select Tools use case.
//!
//! Narrows the full tool catalog to the subset relevant to one user
//! message via a single low-temperature auxiliary LLM call. Never
//! fails: any error falls back to the full catalog, because
//! under-equipping the assistant costs correctness while the selector
//! only exists to save cost.

use crate::ports::llm_gateway::LlmGateway;
use concierge_domain::prompt::selection_prompt;
use concierge_domain::selection::parse_selection;
use concierge_domain::tool::entities::ToolSpec;
use std::sync::Arc;
use tracing::{debug, warn};

/// Temperature for the selection call, favoring determinism.
const SELECTION_TEMPERATURE: f32 = 0.1;

/// Use case for selecting the relevant tool subset.
pub struct SelectToolsUseCase {
    gateway: Arc<dyn LlmGateway>,
}

impl SelectToolsUseCase {
    pub fn new(gateway: Arc<dyn LlmGateway>) -> Self {
        Self { gateway }
    }

    /// Select tool names for the given user message.
    ///
    /// Returns the full catalog when the auxiliary call or its output
    /// fails in any way; an empty list is a valid selection meaning
    /// "no tools needed this turn".
    pub async fn execute(&self, spec: &ToolSpec, user_message: &str) -> Vec<String> {
        let catalog = spec.sorted_names();
        let prompt = selection_prompt(&catalog, user_message);

        let raw = match self.gateway.generate(&prompt, SELECTION_TEMPERATURE).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Tool selection call failed, using full catalog: {e}");
                return catalog.into_iter().map(String::from).collect();
            }
        };

        let result = match parse_selection(&raw) {
            Ok(result) => result,
            Err(e) => {
                warn!("Tool selection output unparseable, using full catalog: {e}");
                return catalog.into_iter().map(String::from).collect();
            }
        };

        let (kept, dropped) = result.filter_against(spec);
        if !dropped.is_empty() {
            warn!("Tool selection returned unknown names: {}", dropped.join(", "));
        }
        debug!(
            "Selected {}/{} tools: {} ({})",
            kept.len(),
            spec.len(),
            kept.join(", "),
            result.reasoning
        );
        kept
    }
}
