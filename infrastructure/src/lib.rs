//! Infrastructure layer for studio-concierge
//!
//! Adapters for the outside world: configuration, the upstream studio
//! API (token lifecycle, response cache, authenticated gateway), the
//! tool catalog and its validating executor, and the streaming LLM
//! client.

pub mod config;
pub mod llm;
pub mod tools;
pub mod upstream;

pub use config::{ConfigError, Settings};
pub use llm::OpenRouterGateway;
pub use tools::{FunctionSchemaConverter, StudioToolProvider, ValidatingExecutor};
pub use upstream::{ResponseCache, TokenManager, UpstreamError, UpstreamGateway};
