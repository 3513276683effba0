//! User-facing error shape.
//!
//! Every failed request returns `{error, hint?}`. The hint points the
//! operator at the likely misconfiguration, matched by provider name in
//! the error text.

use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorBody {
    pub fn from_error(text: impl Into<String>) -> Self {
        let error = text.into();
        let hint = hint_for(&error);
        Self { error, hint }
    }
}

/// Configuration hint for an error message, if it implicates a provider.
pub fn hint_for(text: &str) -> Option<String> {
    if text.contains("Upstream") {
        Some(
            "Check your studio API credentials: CONCIERGE_UPSTREAM__API_KEY, \
             CONCIERGE_UPSTREAM__SITE_ID, and the staff username/password."
                .to_string(),
        )
    } else if text.contains("OpenRouter") {
        Some("Check your CONCIERGE_LLM__API_KEY for OpenRouter.".to_string())
    } else {
        None
    }
}
