//! LLM session types: structured responses and streaming events.

pub mod response;
pub mod stream;
