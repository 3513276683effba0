//! Outbound events for one chat turn.
//!
//! The orchestrator emits these as the turn progresses: text deltas from
//! the streaming model, a record per tool invocation, and a terminal
//! `Completed` or `Error` event.

use crate::tool::value_objects::ToolResult;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Record of one tool invocation within a chat turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInvocationRecord {
    /// Tool name as requested by the model.
    pub name: String,
    /// Arguments the model supplied (post-coercion).
    pub arguments: HashMap<String, serde_json::Value>,
    /// The tool's result, including rejections and upstream failures.
    pub result: ToolResult,
}

/// An event emitted while a chat turn is being processed.
#[derive(Debug, Clone)]
pub enum ChatEvent {
    /// A text chunk from the streaming model.
    TextDelta(String),
    /// A tool was invoked and produced a result.
    ToolInvocation(ToolInvocationRecord),
    /// The turn finished; carries the final assistant answer.
    Completed { answer: String },
    /// The turn failed mid-stream.
    Error(String),
}

impl ChatEvent {
    /// Returns true if this event ends the turn.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ChatEvent::Completed { .. } | ChatEvent::Error(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_events() {
        assert!(!ChatEvent::TextDelta("hi".to_string()).is_terminal());
        assert!(
            ChatEvent::Completed {
                answer: "done".to_string()
            }
            .is_terminal()
        );
        assert!(ChatEvent::Error("boom".to_string()).is_terminal());
    }

    #[test]
    fn invocation_record_serializes_arguments() {
        let record = ToolInvocationRecord {
            name: "get_clients".to_string(),
            arguments: [("search_text".to_string(), serde_json::json!("Jane Doe"))]
                .into_iter()
                .collect(),
            result: ToolResult::success("get_clients", "{}"),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["name"], "get_clients");
        assert_eq!(json["arguments"]["search_text"], "Jane Doe");
    }
}
