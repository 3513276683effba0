//! Application settings with multi-source merging.
//!
//! Priority (highest to lowest): environment variables prefixed
//! `CONCIERGE_` (nested with `__`), an explicit `--config` file,
//! `./concierge.toml`, built-in defaults.
//!
//! Mandatory credentials are checked after extraction so a missing key
//! fails fast at startup with the variable name in the message.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors raised while loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required configuration: {0}. Set it in concierge.toml or the environment.")]
    MissingKey(&'static str),

    #[error("Configuration error: {0}")]
    Figment(#[from] Box<figment::Error>),
}

/// Upstream studio API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamSettings {
    /// Base URL of the studio platform's public API.
    pub base_url: String,
    /// Mandatory API key sent on every call.
    pub api_key: String,
    /// Site identifier header; "-99" is the sandbox site.
    pub site_id: String,
    /// Staff username for token issuance.
    pub username: Option<String>,
    /// Staff password for token issuance.
    pub password: Option<String>,
    /// Pre-issued operator token; takes precedence and is never renewed.
    pub static_token: Option<String>,
}

impl Default for UpstreamSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.mindbodyonline.com/public/v6".to_string(),
            api_key: String::new(),
            site_id: "-99".to_string(),
            username: None,
            password: None,
            static_token: None,
        }
    }
}

/// LLM provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmSettings {
    /// Provider API key.
    pub api_key: String,
    /// OpenAI-compatible endpoint base.
    pub base_url: String,
    /// Model identifier for both the main and selection calls.
    pub model: String,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://openrouter.ai/api/v1".to_string(),
            model: "anthropic/claude-3.5-sonnet".to_string(),
        }
    }
}

/// Chat orchestration settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSettings {
    /// Model tool-step budget per turn (clamped to 30).
    pub max_tool_steps: usize,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self { max_tool_steps: 10 }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Bind address for the chat endpoint.
    pub bind: String,
    /// Coarse wall-clock budget per request, in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".to_string(),
            request_timeout_secs: 120,
        }
    }
}

/// Root settings object.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    pub upstream: UpstreamSettings,
    pub llm: LlmSettings,
    pub chat: ChatSettings,
    pub server: ServerSettings,
}

impl Settings {
    /// Load and validate settings from all sources.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file("concierge.toml"));

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        let settings: Settings = figment
            .merge(Env::prefixed("CONCIERGE_").split("__"))
            .extract()
            .map_err(Box::new)?;

        settings.validate()?;
        Ok(settings)
    }

    /// Check mandatory credentials, naming the missing variable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.upstream.api_key.trim().is_empty() {
            return Err(ConfigError::MissingKey("CONCIERGE_UPSTREAM__API_KEY"));
        }
        if self.llm.api_key.trim().is_empty() {
            return Err(ConfigError::MissingKey("CONCIERGE_LLM__API_KEY"));
        }
        Ok(())
    }

    /// Whether staff credentials for token issuance are configured.
    pub fn has_staff_credentials(&self) -> bool {
        self.upstream.username.is_some() && self.upstream.password.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let settings = Settings::default();
        assert_eq!(settings.upstream.site_id, "-99");
        assert_eq!(settings.llm.model, "anthropic/claude-3.5-sonnet");
        assert_eq!(settings.chat.max_tool_steps, 10);
        assert_eq!(settings.server.request_timeout_secs, 120);
        assert!(!settings.has_staff_credentials());
    }

    #[test]
    fn missing_api_key_names_the_variable() {
        let err = Settings::default().validate().unwrap_err();
        assert!(err.to_string().contains("CONCIERGE_UPSTREAM__API_KEY"));
    }

    #[test]
    fn missing_llm_key_names_the_variable() {
        let mut settings = Settings::default();
        settings.upstream.api_key = "key".to_string();
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("CONCIERGE_LLM__API_KEY"));
    }

    #[test]
    fn complete_settings_validate() {
        let mut settings = Settings::default();
        settings.upstream.api_key = "key".to_string();
        settings.llm.api_key = "sk-or-xyz".to_string();
        settings.upstream.username = Some("owner".to_string());
        settings.upstream.password = Some("hunter2".to_string());
        assert!(settings.validate().is_ok());
        assert!(settings.has_staff_credentials());
    }
}
