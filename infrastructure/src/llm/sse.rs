//! Server-sent-event parsing for streaming chat completions.
//!
//! The wire format is the OpenAI-compatible one: `data:` lines carrying
//! JSON chunks with `choices[0].delta` deltas, tool calls assembled
//! incrementally by index, and a `[DONE]` sentinel.

use concierge_domain::{ContentBlock, LlmResponse, StopReason};
use serde_json::Value;
use std::collections::HashMap;

/// Splits a byte stream into complete SSE `data:` payloads.
///
/// Bytes can arrive mid-line; anything after the last newline stays
/// buffered until the next feed.
pub struct LineBuffer {
    pending: String,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self {
            pending: String::new(),
        }
    }

    /// Feed a chunk and return the `data:` payloads completed by it.
    /// `[DONE]` is consumed here and never surfaced.
    pub fn feed(&mut self, chunk: &str) -> Vec<String> {
        self.pending.push_str(chunk);
        let mut payloads = Vec::new();
        while let Some(newline) = self.pending.find('\n') {
            let line = self.pending[..newline].trim_end_matches('\r').to_string();
            self.pending.drain(..=newline);
            if let Some(data) = line.strip_prefix("data:") {
                let data = data.trim();
                if !data.is_empty() && data != "[DONE]" {
                    payloads.push(data.to_string());
                }
            }
        }
        payloads
    }
}

#[derive(Default)]
struct PartialToolCall {
    id: String,
    name: String,
    arguments: String,
}

/// Assembles streamed chunks into a structured [`LlmResponse`].
pub struct ResponseAccumulator {
    text: String,
    tool_calls: HashMap<u64, PartialToolCall>,
    finish_reason: Option<String>,
    model: Option<String>,
}

impl ResponseAccumulator {
    pub fn new() -> Self {
        Self {
            text: String::new(),
            tool_calls: HashMap::new(),
            finish_reason: None,
            model: None,
        }
    }

    /// Ingest one parsed chunk; returns the text delta it carried, if any.
    pub fn ingest(&mut self, chunk: &Value) -> Option<String> {
        if self.model.is_none() {
            self.model = chunk.get("model").and_then(Value::as_str).map(String::from);
        }
        let choice = chunk.get("choices")?.get(0)?;
        if let Some(reason) = choice.get("finish_reason").and_then(Value::as_str) {
            self.finish_reason = Some(reason.to_string());
        }

        let delta = choice.get("delta")?;
        if let Some(calls) = delta.get("tool_calls").and_then(Value::as_array) {
            for call in calls {
                let index = call.get("index").and_then(Value::as_u64).unwrap_or(0);
                let partial = self.tool_calls.entry(index).or_default();
                if let Some(id) = call.get("id").and_then(Value::as_str) {
                    partial.id.push_str(id);
                }
                if let Some(function) = call.get("function") {
                    if let Some(name) = function.get("name").and_then(Value::as_str) {
                        partial.name.push_str(name);
                    }
                    if let Some(args) = function.get("arguments").and_then(Value::as_str) {
                        partial.arguments.push_str(args);
                    }
                }
            }
        }

        let content = delta.get("content").and_then(Value::as_str)?;
        if content.is_empty() {
            return None;
        }
        self.text.push_str(content);
        Some(content.to_string())
    }

    /// Produce the final structured response.
    pub fn finish(self) -> LlmResponse {
        let mut content = Vec::new();
        if !self.text.is_empty() {
            content.push(ContentBlock::Text(self.text));
        }

        let mut calls: Vec<(u64, PartialToolCall)> = self.tool_calls.into_iter().collect();
        calls.sort_by_key(|(index, _)| *index);
        for (_, call) in calls {
            let input: HashMap<String, Value> = serde_json::from_str(&call.arguments)
                .unwrap_or_default();
            content.push(ContentBlock::ToolUse {
                id: call.id,
                name: call.name,
                input,
            });
        }

        let stop_reason = self.finish_reason.map(|reason| match reason.as_str() {
            "stop" => StopReason::EndTurn,
            "tool_calls" => StopReason::ToolUse,
            "length" => StopReason::MaxTokens,
            other => StopReason::Other(other.to_string()),
        });

        LlmResponse {
            content,
            stop_reason,
            model: self.model,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn line_buffer_handles_split_chunks() {
        let mut buffer = LineBuffer::new();
        assert!(buffer.feed("data: {\"a\"").is_empty());
        let payloads = buffer.feed(":1}\n\ndata: [DONE]\n");
        assert_eq!(payloads, vec!["{\"a\":1}"]);
    }

    #[test]
    fn line_buffer_ignores_comments_and_blank_lines() {
        let mut buffer = LineBuffer::new();
        let payloads = buffer.feed(": keep-alive\n\ndata: {\"b\":2}\r\n");
        assert_eq!(payloads, vec!["{\"b\":2}"]);
    }

    #[test]
    fn text_deltas_accumulate() {
        let mut acc = ResponseAccumulator::new();
        let chunks = [
            json!({"model": "test-model", "choices": [{"delta": {"content": "Jane has "}}]}),
            json!({"choices": [{"delta": {"content": "3 visits."}}]}),
            json!({"choices": [{"delta": {}, "finish_reason": "stop"}]}),
        ];
        let mut deltas = Vec::new();
        for chunk in &chunks {
            if let Some(delta) = acc.ingest(chunk) {
                deltas.push(delta);
            }
        }
        assert_eq!(deltas, vec!["Jane has ", "3 visits."]);

        let response = acc.finish();
        assert_eq!(response.text_content(), "Jane has 3 visits.");
        assert_eq!(response.stop_reason, Some(StopReason::EndTurn));
        assert_eq!(response.model.as_deref(), Some("test-model"));
        assert!(!response.has_tool_calls());
    }

    #[test]
    fn tool_call_fragments_assemble_by_index() {
        let mut acc = ResponseAccumulator::new();
        let chunks = [
            json!({"choices": [{"delta": {"tool_calls": [
                {"index": 0, "id": "call_1", "function": {"name": "get_clients", "arguments": ""}}
            ]}}]}),
            json!({"choices": [{"delta": {"tool_calls": [
                {"index": 0, "function": {"arguments": "{\"search_"}}
            ]}}]}),
            json!({"choices": [{"delta": {"tool_calls": [
                {"index": 0, "function": {"arguments": "text\":\"Jane Doe\"}"}}
            ]}}]}),
            json!({"choices": [{"delta": {}, "finish_reason": "tool_calls"}]}),
        ];
        for chunk in &chunks {
            acc.ingest(chunk);
        }

        let response = acc.finish();
        assert_eq!(response.stop_reason, Some(StopReason::ToolUse));
        let calls = response.tool_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].tool_name, "get_clients");
        assert_eq!(calls[0].native_id.as_deref(), Some("call_1"));
        assert_eq!(calls[0].get_string("search_text"), Some("Jane Doe"));
    }

    #[test]
    fn parallel_tool_calls_keep_their_order() {
        let mut acc = ResponseAccumulator::new();
        acc.ingest(&json!({"choices": [{"delta": {"tool_calls": [
            {"index": 1, "id": "call_b", "function": {"name": "get_sales", "arguments": "{}"}},
            {"index": 0, "id": "call_a", "function": {"name": "get_clients", "arguments": "{}"}}
        ]}}]}));
        acc.ingest(&json!({"choices": [{"delta": {}, "finish_reason": "tool_calls"}]}));

        let calls = acc.finish().tool_calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].tool_name, "get_clients");
        assert_eq!(calls[1].tool_name, "get_sales");
    }

    #[test]
    fn malformed_arguments_fall_back_to_empty_input() {
        let mut acc = ResponseAccumulator::new();
        acc.ingest(&json!({"choices": [{"delta": {"tool_calls": [
            {"index": 0, "id": "call_1", "function": {"name": "get_clients", "arguments": "{broken"}}
        ]}}]}));
        acc.ingest(&json!({"choices": [{"delta": {}, "finish_reason": "tool_calls"}]}));

        let calls = acc.finish().tool_calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].arguments.is_empty());
    }
}
