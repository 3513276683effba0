//! Application layer for studio-concierge
//!
//! Ports (interfaces to the outside world) and use cases that drive a
//! chat turn: tool selection followed by the streaming tool loop.

pub mod ports;
pub mod use_cases;

pub use ports::llm_gateway::{
    GatewayError, LlmGateway, LlmSession, StreamHandle, ToolResultMessage,
};
pub use ports::tool_executor::ToolExecutorPort;
pub use ports::tool_schema::ToolSchemaPort;
pub use use_cases::chat_turn::{ChatTurnError, ChatTurnInput, ChatTurnUseCase};
pub use use_cases::select_tools::SelectToolsUseCase;
