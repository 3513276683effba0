//! Domain layer for studio-concierge
//!
//! Pure business logic: chat messages, tool entities and validation,
//! tool-selection parsing, prompts, and structured LLM response types.
//! No I/O happens in this crate.

pub mod chat;
pub mod prompt;
pub mod selection;
pub mod session;
pub mod tool;

// Re-export commonly used types
pub use chat::{ChatEvent, ChatMessage, Role, ToolInvocationRecord};
pub use session::response::{ContentBlock, LlmResponse, StopReason};
pub use session::stream::StreamEvent;
pub use tool::entities::{ToolCall, ToolDefinition, ToolParameter, ToolSpec};
pub use tool::value_objects::{ToolError, ToolResult};
