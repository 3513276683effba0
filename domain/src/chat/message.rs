//! Chat message entities.
//!
//! A chat turn receives the ordered prior conversation plus the new user
//! message; the last user message drives tool selection.

use serde::{Deserialize, Serialize};

/// Role of a conversation participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One message in the conversation history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Find the latest user message in a history slice.
pub fn latest_user_message(messages: &[ChatMessage]) -> Option<&ChatMessage> {
    messages.iter().rev().find(|m| m.role == Role::User)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latest_user_message_skips_assistant_turns() {
        let history = vec![
            ChatMessage::user("show me Jane Doe's purchases"),
            ChatMessage::assistant("Looking that up."),
        ];
        let latest = latest_user_message(&history).unwrap();
        assert_eq!(latest.content, "show me Jane Doe's purchases");
    }

    #[test]
    fn latest_user_message_empty_history() {
        assert!(latest_user_message(&[]).is_none());
        let assistant_only = vec![ChatMessage::assistant("hello")];
        assert!(latest_user_message(&assistant_only).is_none());
    }

    #[test]
    fn role_serializes_lowercase() {
        let msg = ChatMessage::user("hi");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["role"], "user");
    }
}
