//! The chat endpoint.
//!
//! `POST /api/chat` takes the full message history and streams the
//! turn back as SSE: `delta` events for text, `tool` events per tool
//! invocation, then a terminal `done` or `error` event.

use axum::{
    extract::State,
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    routing::post,
    Json, Router,
};
use futures::stream::Stream;
use serde::Deserialize;
use serde_json::json;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info};

use concierge_application::{ChatTurnInput, ChatTurnUseCase};
use concierge_domain::chat::message::latest_user_message;
use concierge_domain::{ChatEvent, ChatMessage};

use super::error::ErrorBody;

const EVENT_CHANNEL_CAPACITY: usize = 64;

pub struct AppState {
    pub chat: Arc<ChatTurnUseCase>,
    pub max_tool_steps: usize,
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    messages: Vec<ChatMessage>,
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/chat", post(chat))
        .with_state(state)
}

/// SSE name and JSON data for one chat event.
fn event_parts(event: &ChatEvent) -> (&'static str, String) {
    match event {
        ChatEvent::TextDelta(text) => ("delta", json!({ "text": text }).to_string()),
        ChatEvent::ToolInvocation(record) => (
            "tool",
            serde_json::to_string(record).unwrap_or_else(|_| "{}".to_string()),
        ),
        ChatEvent::Completed { answer } => ("done", json!({ "answer": answer }).to_string()),
        ChatEvent::Error(message) => (
            "error",
            serde_json::to_string(&ErrorBody::from_error(message.clone()))
                .unwrap_or_else(|_| "{}".to_string()),
        ),
    }
}

async fn chat(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, (StatusCode, Json<ErrorBody>)> {
    if latest_user_message(&request.messages).is_none() {
        return Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorBody::from_error("No user message in request")),
        ));
    }
    info!("Chat request with {} messages", request.messages.len());

    let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
    let chat = state.chat.clone();
    let input = ChatTurnInput::new(request.messages).with_max_tool_steps(state.max_tool_steps);

    tokio::spawn(async move {
        if let Err(e) = chat.execute(input, tx.clone()).await {
            error!("Chat turn failed: {e}");
            let _ = tx.send(ChatEvent::Error(e.to_string())).await;
        }
    });

    let stream = futures::stream::unfold((rx, false), |(mut rx, done)| async move {
        if done {
            return None;
        }
        let event = rx.recv().await?;
        let terminal = event.is_terminal();
        let (name, data) = event_parts(&event);
        Some((
            Ok(Event::default().event(name).data(data)),
            (rx, terminal),
        ))
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use concierge_domain::{ToolInvocationRecord, ToolResult};

    #[test]
    fn delta_events_carry_text() {
        let (name, data) = event_parts(&ChatEvent::TextDelta("Jane has".to_string()));
        assert_eq!(name, "delta");
        let json: serde_json::Value = serde_json::from_str(&data).unwrap();
        assert_eq!(json["text"], "Jane has");
    }

    #[test]
    fn tool_events_serialize_the_invocation_record() {
        let record = ToolInvocationRecord {
            name: "get_clients".to_string(),
            arguments: [("search_text".to_string(), json!("Jane Doe"))]
                .into_iter()
                .collect(),
            result: ToolResult::success("get_clients", r#"{"Clients":[]}"#),
        };
        let (name, data) = event_parts(&ChatEvent::ToolInvocation(record));
        assert_eq!(name, "tool");
        let json: serde_json::Value = serde_json::from_str(&data).unwrap();
        assert_eq!(json["name"], "get_clients");
        assert_eq!(json["result"]["success"], true);
    }

    #[test]
    fn done_events_carry_the_answer() {
        let (name, data) = event_parts(&ChatEvent::Completed {
            answer: "Jane has 3 visits.".to_string(),
        });
        assert_eq!(name, "done");
        let json: serde_json::Value = serde_json::from_str(&data).unwrap();
        assert_eq!(json["answer"], "Jane has 3 visits.");
    }

    #[test]
    fn error_events_include_hints_when_matched() {
        let (name, data) = event_parts(&ChatEvent::Error(
            "OpenRouter request failed: 401 - invalid key".to_string(),
        ));
        assert_eq!(name, "error");
        let json: serde_json::Value = serde_json::from_str(&data).unwrap();
        assert!(json["hint"].as_str().unwrap().contains("CONCIERGE_LLM__API_KEY"));
    }
}
