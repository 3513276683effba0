//! Streaming events for LLM session communication.
//!
//! Bridges infrastructure-level streaming (SSE chunks from the provider)
//! to the application layer: text deltas arrive as they are generated,
//! and the terminal event carries the full structured response.

use super::response::LlmResponse;

/// An event in a streaming LLM response.
#[derive(Debug, Clone)]
pub enum StreamEvent {
    /// A text chunk from the model.
    Delta(String),
    /// An error that occurred during streaming.
    Error(String),
    /// The full structured response; terminal event of the stream.
    CompletedResponse(LlmResponse),
}

impl StreamEvent {
    /// Returns the text content if this is a delta event.
    pub fn text(&self) -> Option<&str> {
        match self {
            StreamEvent::Delta(s) => Some(s),
            _ => None,
        }
    }

    /// Returns true if this event signals the end of the stream.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            StreamEvent::Error(_) | StreamEvent::CompletedResponse(_)
        )
    }
}
