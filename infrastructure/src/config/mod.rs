//! Configuration loading.

mod settings;

pub use settings::{
    ChatSettings, ConfigError, LlmSettings, ServerSettings, Settings, UpstreamSettings,
};
