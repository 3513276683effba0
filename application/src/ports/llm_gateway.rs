//! LLM Gateway port
//!
//! Defines the two external LLM capabilities the core depends on:
//! streaming a conversational answer given tools + history, and
//! generating short structured text for tool selection.

use async_trait::async_trait;
use concierge_domain::chat::ChatMessage;
use concierge_domain::session::response::LlmResponse;
use concierge_domain::session::stream::StreamEvent;
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors that can occur during LLM gateway operations
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Stream closed before completion")]
    StreamClosed,

    #[error("Other error: {0}")]
    Other(String),
}

/// A tool result sent back to the model so it can continue reasoning.
#[derive(Debug, Clone)]
pub struct ToolResultMessage {
    /// Provider-assigned ID of the tool call this answers.
    pub tool_use_id: String,
    /// Tool name, echoed for providers that require it.
    pub tool_name: String,
    /// Result text (payload JSON, error message, or rejection payload).
    pub output: String,
    /// Whether the result represents a failure.
    pub is_error: bool,
}

/// Handle for receiving streaming events from an LLM call.
pub struct StreamHandle {
    pub receiver: mpsc::Receiver<StreamEvent>,
}

impl StreamHandle {
    pub fn new(receiver: mpsc::Receiver<StreamEvent>) -> Self {
        Self { receiver }
    }

    /// Drain the stream, discarding deltas, and return the structured
    /// terminal response.
    pub async fn collect_response(mut self) -> Result<LlmResponse, GatewayError> {
        while let Some(event) = self.receiver.recv().await {
            match event {
                StreamEvent::Delta(_) => {}
                StreamEvent::Error(e) => return Err(GatewayError::RequestFailed(e)),
                StreamEvent::CompletedResponse(response) => return Ok(response),
            }
        }
        Err(GatewayError::StreamClosed)
    }
}

/// Gateway for LLM communication
///
/// The application layer treats the provider as a black box behind this
/// port; the adapter lives in the infrastructure layer.
#[async_trait]
pub trait LlmGateway: Send + Sync {
    /// Start a conversational session seeded with a system prompt and
    /// the prior message history.
    async fn start_chat(
        &self,
        system_prompt: &str,
        history: &[ChatMessage],
    ) -> Result<Box<dyn LlmSession>, GatewayError>;

    /// One-shot text generation without tool access (used for tool
    /// selection). `temperature` is passed through to the provider.
    async fn generate(&self, prompt: &str, temperature: f32) -> Result<String, GatewayError>;
}

/// An active conversational session with tool support.
#[async_trait]
pub trait LlmSession: Send + Sync {
    /// Send the pending conversation with the given tool schemas and
    /// stream the model's response.
    async fn send_with_tools(
        &self,
        tools: &[serde_json::Value],
    ) -> Result<StreamHandle, GatewayError>;

    /// Send tool results back and stream the model's next step.
    async fn send_tool_results(
        &self,
        results: &[ToolResultMessage],
    ) -> Result<StreamHandle, GatewayError>;
}
