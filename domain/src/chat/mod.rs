//! Chat conversation types.

pub mod events;
pub mod message;

pub use events::{ChatEvent, ToolInvocationRecord};
pub use message::{latest_user_message, ChatMessage, Role};
