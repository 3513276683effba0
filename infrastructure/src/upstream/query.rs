//! Query-string building for upstream calls.
//!
//! Mirrors the upstream API's querystring conventions: array values
//! append the key once per element, nulls are skipped entirely, and
//! scalars are rendered without JSON quoting.

use reqwest::Url;
use serde_json::Value;

/// Append query parameters to a URL.
pub fn append_query(url: &mut Url, params: &[(String, Value)]) {
    {
        let mut pairs = url.query_pairs_mut();
        for (key, value) in params {
            match value {
                Value::Null => {}
                Value::Array(items) => {
                    for item in items {
                        pairs.append_pair(key, &scalar_text(item));
                    }
                }
                other => {
                    pairs.append_pair(key, &scalar_text(other));
                }
            }
        }
    }
    if url.query() == Some("") {
        url.set_query(None);
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url() -> Url {
        Url::parse("https://api.example.com/client/clients").unwrap()
    }

    #[test]
    fn scalars_are_rendered_unquoted() {
        let mut url = url();
        append_query(
            &mut url,
            &[
                ("SearchText".to_string(), serde_json::json!("Jane Doe")),
                ("Limit".to_string(), serde_json::json!(25)),
            ],
        );
        assert_eq!(url.query(), Some("SearchText=Jane+Doe&Limit=25"));
    }

    #[test]
    fn arrays_repeat_the_key() {
        let mut url = url();
        append_query(
            &mut url,
            &[("ClientIds".to_string(), serde_json::json!(["1", "2", "3"]))],
        );
        assert_eq!(url.query(), Some("ClientIds=1&ClientIds=2&ClientIds=3"));
    }

    #[test]
    fn nulls_are_skipped() {
        let mut url = url();
        append_query(
            &mut url,
            &[
                ("SearchText".to_string(), Value::Null),
                ("Offset".to_string(), serde_json::json!(0)),
            ],
        );
        assert_eq!(url.query(), Some("Offset=0"));
    }
}
