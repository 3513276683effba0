//! Chat Turn use case.
//!
//! Drives one conversational turn: tool selection strictly first, then
//! the streaming main call with a bounded multi-step tool loop. Text
//! deltas and tool-invocation records are relayed to the caller as they
//! happen; errors local to one tool invocation stay local as tool
//! results so the model can self-correct within the turn.

use crate::ports::llm_gateway::{GatewayError, LlmGateway, StreamHandle, ToolResultMessage};
use crate::ports::tool_executor::ToolExecutorPort;
use crate::ports::tool_schema::ToolSchemaPort;
use crate::use_cases::select_tools::SelectToolsUseCase;
use concierge_domain::chat::message::latest_user_message;
use concierge_domain::chat::{ChatEvent, ChatMessage, ToolInvocationRecord};
use concierge_domain::prompt::system_prompt;
use concierge_domain::session::response::LlmResponse;
use concierge_domain::session::stream::StreamEvent;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Default bound on model tool steps per turn.
pub const DEFAULT_MAX_TOOL_STEPS: usize = 10;
/// Hard upper bound regardless of configuration.
pub const MAX_TOOL_STEPS_CEILING: usize = 30;

/// Errors that abort the whole turn (tool-level failures never do).
#[derive(Error, Debug)]
pub enum ChatTurnError {
    #[error("No user message in request")]
    NoUserMessage,

    #[error("Streaming failed: {0}")]
    Gateway(#[from] GatewayError),

    #[error("No response from model")]
    EmptyResponse,
}

/// Input for one chat turn.
#[derive(Debug, Clone)]
pub struct ChatTurnInput {
    /// Ordered prior messages plus the new user message.
    pub messages: Vec<ChatMessage>,
    /// Tool-step budget for this turn.
    pub max_tool_steps: usize,
}

impl ChatTurnInput {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            max_tool_steps: DEFAULT_MAX_TOOL_STEPS,
        }
    }

    pub fn with_max_tool_steps(mut self, steps: usize) -> Self {
        self.max_tool_steps = steps.min(MAX_TOOL_STEPS_CEILING);
        self
    }
}

/// Use case orchestrating one chat turn.
pub struct ChatTurnUseCase {
    gateway: Arc<dyn LlmGateway>,
    tool_executor: Arc<dyn ToolExecutorPort>,
    tool_schema: Arc<dyn ToolSchemaPort>,
    selector: SelectToolsUseCase,
}

impl ChatTurnUseCase {
    pub fn new(
        gateway: Arc<dyn LlmGateway>,
        tool_executor: Arc<dyn ToolExecutorPort>,
        tool_schema: Arc<dyn ToolSchemaPort>,
    ) -> Self {
        let selector = SelectToolsUseCase::new(gateway.clone());
        Self {
            gateway,
            tool_executor,
            tool_schema,
            selector,
        }
    }

    /// Execute the turn, emitting [`ChatEvent`]s as it progresses.
    ///
    /// Returns the final assistant answer. A send failure on `events`
    /// means the caller went away; the turn keeps running to completion
    /// since tool invocations may have side effects upstream.
    pub async fn execute(
        &self,
        input: ChatTurnInput,
        events: mpsc::Sender<ChatEvent>,
    ) -> Result<String, ChatTurnError> {
        let latest = latest_user_message(&input.messages).ok_or(ChatTurnError::NoUserMessage)?;
        info!("Chat turn started ({} messages)", input.messages.len());

        // Selection completes (or falls back) before the main call begins.
        let spec = self.tool_executor.tool_spec();
        let selected = self.selector.execute(spec, &latest.content).await;
        let tools = self.tool_schema.schemas_for(spec, &selected);
        debug!("Main call equipped with {} tools", tools.len());

        let today = chrono::Utc::now().format("%Y-%m-%d").to_string();
        let session = self
            .gateway
            .start_chat(&system_prompt(&today), &input.messages)
            .await?;

        let stream = session.send_with_tools(&tools).await?;
        let mut response = pump_stream(stream, &events).await?;

        let mut all_text = Vec::new();
        let text = response.text_content();
        if !text.is_empty() {
            all_text.push(text);
        }

        let mut steps = 0usize;
        loop {
            let tool_calls = response.tool_calls();
            if tool_calls.is_empty() {
                break;
            }

            steps += 1;
            if steps > input.max_tool_steps {
                warn!(
                    "Tool loop exceeded step budget ({}), stopping",
                    input.max_tool_steps
                );
                break;
            }

            // Each call is awaited to completion before the model's next
            // step; parallelism lives inside composite tools only.
            let mut result_messages = Vec::new();
            for call in &tool_calls {
                let result = self.tool_executor.execute(call).await;

                let _ = events
                    .send(ChatEvent::ToolInvocation(ToolInvocationRecord {
                        name: call.tool_name.clone(),
                        arguments: call.arguments.clone(),
                        result: result.clone(),
                    }))
                    .await;

                let Some(native_id) = call.native_id.clone() else {
                    warn!(
                        "Missing native id for tool call '{}'; skipping result",
                        call.tool_name
                    );
                    continue;
                };
                result_messages.push(ToolResultMessage {
                    tool_use_id: native_id,
                    tool_name: call.tool_name.clone(),
                    output: result.model_output(),
                    is_error: !result.is_success(),
                });
            }

            debug!(
                "Tool step {}/{}: sending {} results",
                steps,
                input.max_tool_steps,
                result_messages.len()
            );

            let stream = session.send_tool_results(&result_messages).await?;
            response = pump_stream(stream, &events).await?;

            let text = response.text_content();
            if !text.is_empty() {
                all_text.push(text);
            }
        }

        // The last text block is the answer; intermediate narration
        // ("Let me look that up...") is superseded by it.
        let answer = all_text.pop().unwrap_or_default();
        if answer.is_empty() {
            return Err(ChatTurnError::EmptyResponse);
        }

        info!("Chat turn completed in {} tool steps", steps);
        let _ = events
            .send(ChatEvent::Completed {
                answer: answer.clone(),
            })
            .await;
        Ok(answer)
    }
}

/// Forward text deltas to the caller and return the terminal response.
async fn pump_stream(
    mut stream: StreamHandle,
    events: &mpsc::Sender<ChatEvent>,
) -> Result<LlmResponse, ChatTurnError> {
    while let Some(event) = stream.receiver.recv().await {
        match event {
            StreamEvent::Delta(chunk) => {
                let _ = events.send(ChatEvent::TextDelta(chunk)).await;
            }
            StreamEvent::Error(e) => {
                return Err(ChatTurnError::Gateway(GatewayError::RequestFailed(e)));
            }
            StreamEvent::CompletedResponse(response) => return Ok(response),
        }
    }
    Err(ChatTurnError::Gateway(GatewayError::StreamClosed))
}
