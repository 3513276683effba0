//! OpenRouter chat-completions gateway.
//!
//! One adapter serves both LLM roles: the streaming conversational call
//! with tools, and the one-shot low-temperature generation used for
//! tool selection.

use async_trait::async_trait;
use concierge_application::{
    GatewayError, LlmGateway, LlmSession, StreamHandle, ToolResultMessage,
};
use concierge_domain::{ChatMessage, ContentBlock, LlmResponse, StreamEvent};
use futures::StreamExt;
use reqwest::Client;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, warn};

use super::sse::{LineBuffer, ResponseAccumulator};

/// Temperature of the conversational call.
pub const MAIN_TEMPERATURE: f32 = 0.5;

const STREAM_CHANNEL_CAPACITY: usize = 64;

pub struct OpenRouterGateway {
    http: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenRouterGateway {
    pub fn new(http: Client, base_url: String, api_key: String, model: String) -> Self {
        Self {
            http,
            base_url,
            api_key,
            model,
        }
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

/// Flatten prior history into wire messages.
fn history_messages(system_prompt: &str, history: &[ChatMessage]) -> Vec<Value> {
    let mut messages = vec![json!({ "role": "system", "content": system_prompt })];
    for message in history {
        messages.push(json!({ "role": message.role, "content": message.content }));
    }
    messages
}

/// Wire form of the model's own turn, echoed back so the provider sees
/// its text and tool calls when the conversation continues.
fn assistant_message(response: &LlmResponse) -> Value {
    let text = response.text_content();
    let tool_calls: Vec<Value> = response
        .content
        .iter()
        .filter_map(|block| match block {
            ContentBlock::ToolUse { id, name, input } => Some(json!({
                "id": id,
                "type": "function",
                "function": {
                    "name": name,
                    "arguments": serde_json::to_string(input).unwrap_or_else(|_| "{}".to_string()),
                }
            })),
            ContentBlock::Text(_) => None,
        })
        .collect();

    let mut message = json!({
        "role": "assistant",
        "content": if text.is_empty() { Value::Null } else { json!(text) },
    });
    if !tool_calls.is_empty() {
        message["tool_calls"] = Value::Array(tool_calls);
    }
    message
}

#[async_trait]
impl LlmGateway for OpenRouterGateway {
    async fn start_chat(
        &self,
        system_prompt: &str,
        history: &[ChatMessage],
    ) -> Result<Box<dyn LlmSession>, GatewayError> {
        Ok(Box::new(OpenRouterSession {
            http: self.http.clone(),
            url: self.completions_url(),
            api_key: self.api_key.clone(),
            model: self.model.clone(),
            messages: Arc::new(Mutex::new(history_messages(system_prompt, history))),
            tools: Mutex::new(Vec::new()),
        }))
    }

    async fn generate(&self, prompt: &str, temperature: f32) -> Result<String, GatewayError> {
        let body = json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
            "temperature": temperature,
        });

        let response = self
            .http
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| GatewayError::ConnectionError(format!("OpenRouter: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::RequestFailed(format!(
                "OpenRouter request failed: {status} - {body}"
            )));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| GatewayError::Other(format!("OpenRouter response decode: {e}")))?;
        payload["choices"][0]["message"]["content"]
            .as_str()
            .map(String::from)
            .ok_or_else(|| {
                GatewayError::Other("OpenRouter response carried no content".to_string())
            })
    }
}

struct OpenRouterSession {
    http: Client,
    url: String,
    api_key: String,
    model: String,
    messages: Arc<Mutex<Vec<Value>>>,
    tools: Mutex<Vec<Value>>,
}

impl OpenRouterSession {
    /// Send the current conversation and stream one model step.
    ///
    /// The spawned task parses SSE chunks into deltas, then appends the
    /// assistant's completed turn to the conversation before emitting
    /// the terminal event.
    async fn stream_step(&self) -> Result<StreamHandle, GatewayError> {
        let mut body = json!({
            "model": self.model,
            "messages": self.messages.lock().await.clone(),
            "temperature": MAIN_TEMPERATURE,
            "stream": true,
        });
        {
            let tools = self.tools.lock().await;
            if !tools.is_empty() {
                body["tools"] = Value::Array(tools.clone());
            }
        }

        let (tx, rx) = mpsc::channel(STREAM_CHANNEL_CAPACITY);
        let http = self.http.clone();
        let url = self.url.clone();
        let api_key = self.api_key.clone();
        let messages = self.messages.clone();

        tokio::spawn(async move {
            let response = match http.post(&url).bearer_auth(&api_key).json(&body).send().await
            {
                Ok(response) => response,
                Err(e) => {
                    let _ = tx
                        .send(StreamEvent::Error(format!("OpenRouter: {e}")))
                        .await;
                    return;
                }
            };
            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                let _ = tx
                    .send(StreamEvent::Error(format!(
                        "OpenRouter request failed: {status} - {body}"
                    )))
                    .await;
                return;
            }

            let mut buffer = LineBuffer::new();
            let mut accumulator = ResponseAccumulator::new();
            let mut bytes = response.bytes_stream();
            while let Some(chunk) = bytes.next().await {
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        let _ = tx
                            .send(StreamEvent::Error(format!("OpenRouter stream: {e}")))
                            .await;
                        return;
                    }
                };
                for payload in buffer.feed(&String::from_utf8_lossy(&chunk)) {
                    match serde_json::from_str::<Value>(&payload) {
                        Ok(parsed) => {
                            if let Some(delta) = accumulator.ingest(&parsed) {
                                if tx.send(StreamEvent::Delta(delta)).await.is_err() {
                                    return;
                                }
                            }
                        }
                        Err(e) => warn!("Skipping malformed stream chunk: {e}"),
                    }
                }
            }

            let completed = accumulator.finish();
            debug!(
                stop_reason = ?completed.stop_reason,
                "Model step complete"
            );
            messages.lock().await.push(assistant_message(&completed));
            let _ = tx.send(StreamEvent::CompletedResponse(completed)).await;
        });

        Ok(StreamHandle::new(rx))
    }
}

#[async_trait]
impl LlmSession for OpenRouterSession {
    async fn send_with_tools(&self, tools: &[Value]) -> Result<StreamHandle, GatewayError> {
        *self.tools.lock().await = tools.to_vec();
        self.stream_step().await
    }

    async fn send_tool_results(
        &self,
        results: &[ToolResultMessage],
    ) -> Result<StreamHandle, GatewayError> {
        {
            let mut messages = self.messages.lock().await;
            for result in results {
                messages.push(json!({
                    "role": "tool",
                    "tool_call_id": result.tool_use_id,
                    "content": result.output,
                }));
            }
        }
        self.stream_step().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use concierge_domain::StopReason;
    use std::collections::HashMap;

    #[test]
    fn history_starts_with_the_system_prompt() {
        let history = vec![
            ChatMessage::user("Does Jane Doe have an active membership?"),
            ChatMessage::assistant("Let me check."),
        ];
        let messages = history_messages("You are a studio assistant.", &history);
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[1]["role"], "user");
        assert_eq!(messages[2]["role"], "assistant");
        assert_eq!(messages[2]["content"], "Let me check.");
    }

    #[test]
    fn assistant_message_carries_tool_calls() {
        let mut input = HashMap::new();
        input.insert("search_text".to_string(), json!("Jane Doe"));
        let response = LlmResponse {
            content: vec![
                ContentBlock::Text("Looking that up.".to_string()),
                ContentBlock::ToolUse {
                    id: "call_1".to_string(),
                    name: "get_clients".to_string(),
                    input,
                },
            ],
            stop_reason: Some(StopReason::ToolUse),
            model: None,
        };

        let message = assistant_message(&response);
        assert_eq!(message["role"], "assistant");
        assert_eq!(message["content"], "Looking that up.");
        assert_eq!(message["tool_calls"][0]["id"], "call_1");
        assert_eq!(message["tool_calls"][0]["type"], "function");
        assert_eq!(message["tool_calls"][0]["function"]["name"], "get_clients");
        let args: Value =
            serde_json::from_str(message["tool_calls"][0]["function"]["arguments"].as_str().unwrap())
                .unwrap();
        assert_eq!(args["search_text"], "Jane Doe");
    }

    #[test]
    fn text_only_turn_has_no_tool_calls_field() {
        let message = assistant_message(&LlmResponse::from_text("All set."));
        assert_eq!(message["content"], "All set.");
        assert!(message.get("tool_calls").is_none());
    }

    #[test]
    fn tool_only_turn_has_null_content() {
        let response = LlmResponse {
            content: vec![ContentBlock::ToolUse {
                id: "call_1".to_string(),
                name: "get_sales".to_string(),
                input: HashMap::new(),
            }],
            stop_reason: Some(StopReason::ToolUse),
            model: None,
        };
        let message = assistant_message(&response);
        assert!(message["content"].is_null());
        assert_eq!(message["tool_calls"][0]["function"]["name"], "get_sales");
    }
}
