//! Tool-selection result parsing.
//!
//! The selection model is asked for strict JSON of shape
//! `{"tools": ["..."], "reasoning": "..."}` but routinely wraps it in
//! prose or code fences. This module is the single lenient-decode
//! utility for that output; callers handle [`SelectionParseError`] with
//! their own fallback policy.

use crate::tool::entities::ToolSpec;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Parsed output of the auxiliary selection call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionResult {
    /// Ordered list of selected tool names.
    pub tools: Vec<String>,
    /// Free-text rationale from the model.
    #[serde(default)]
    pub reasoning: String,
}

impl SelectionResult {
    /// Drop names not present in the catalog, preserving order.
    ///
    /// Returns the surviving names and the dropped ones (for logging).
    pub fn filter_against(&self, spec: &ToolSpec) -> (Vec<String>, Vec<String>) {
        let mut kept = Vec::new();
        let mut dropped = Vec::new();
        for name in &self.tools {
            if spec.contains(name) {
                kept.push(name.clone());
            } else {
                dropped.push(name.clone());
            }
        }
        (kept, dropped)
    }
}

/// Failure to extract a selection from model output.
#[derive(Error, Debug)]
pub enum SelectionParseError {
    #[error("no JSON object found in selection output")]
    NoJsonObject,

    #[error("selection output is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("selection output has no 'tools' array")]
    MissingToolsArray,
}

/// Extract a [`SelectionResult`] from possibly prose-wrapped model output.
///
/// Tolerates code fences and surrounding text by locating the first `{`
/// and the last `}` and parsing the span between them. Non-string
/// entries in the `tools` array are skipped.
pub fn parse_selection(raw: &str) -> Result<SelectionResult, SelectionParseError> {
    let candidate = extract_json_object(raw).ok_or(SelectionParseError::NoJsonObject)?;
    let value: serde_json::Value = serde_json::from_str(candidate)?;

    let tools = value
        .get("tools")
        .and_then(|v| v.as_array())
        .ok_or(SelectionParseError::MissingToolsArray)?;

    let names = tools
        .iter()
        .filter_map(|v| v.as_str())
        .map(String::from)
        .collect();

    let reasoning = value
        .get("reasoning")
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string();

    Ok(SelectionResult {
        tools: names,
        reasoning,
    })
}

/// Find the first top-level-looking JSON object substring.
fn extract_json_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&raw[start..=end])
}
