//! LLM provider adapter.

mod openrouter;
mod sse;

pub use openrouter::{OpenRouterGateway, MAIN_TEMPERATURE};
