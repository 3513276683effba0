//! Authenticated HTTP gateway to the studio platform API.
//!
//! Every call carries `Api-Key` and `SiteId` headers plus, when a token
//! is available, a bearer token. GET responses are cached; failures map
//! to structured errors without retrying.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Method, StatusCode, Url};
use serde_json::{json, Value};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use concierge_domain::ToolError;

use super::cache::ResponseCache;
use super::query::append_query;
use super::token::{AuthApi, IssuedToken, TokenManager};

/// Errors from the upstream API.
#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("Upstream authentication failed; check the API key, site id, and staff credentials")]
    Authentication,

    #[error("Upstream API error: {status} - {body}")]
    Status { status: u16, body: String },

    #[error("Upstream transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid upstream URL: {0}")]
    Url(String),
}

impl UpstreamError {
    /// Map to the tool-facing error vocabulary.
    pub fn into_tool_error(self) -> ToolError {
        match self {
            UpstreamError::Authentication => ToolError::authentication_failed(self.to_string()),
            UpstreamError::Status { status, body } => ToolError::upstream(status, &body),
            other => ToolError::execution_failed(other.to_string()),
        }
    }
}

/// Gateway for tool-driven calls into the studio API.
pub struct UpstreamGateway {
    http: Client,
    base_url: String,
    api_key: String,
    site_id: String,
    tokens: Arc<TokenManager>,
    cache: Arc<ResponseCache>,
}

impl UpstreamGateway {
    pub fn new(
        http: Client,
        base_url: String,
        api_key: String,
        site_id: String,
        tokens: Arc<TokenManager>,
        cache: Arc<ResponseCache>,
    ) -> Self {
        Self {
            http,
            base_url,
            api_key,
            site_id,
            tokens,
            cache,
        }
    }

    /// GET an endpoint with query parameters.
    pub async fn get(
        &self,
        endpoint: &str,
        query: &[(String, Value)],
    ) -> Result<Value, UpstreamError> {
        self.fetch(Method::GET, endpoint, query, None).await
    }

    /// Perform a request against the upstream API.
    ///
    /// GETs are served from the cache when warm and cached on success;
    /// other methods always go to the network.
    pub async fn fetch(
        &self,
        method: Method,
        endpoint: &str,
        query: &[(String, Value)],
        body: Option<&Value>,
    ) -> Result<Value, UpstreamError> {
        let mut url = Url::parse(&format!("{}{endpoint}", self.base_url))
            .map_err(|e| UpstreamError::Url(e.to_string()))?;
        append_query(&mut url, query);

        let body_text = body.map(Value::to_string).unwrap_or_default();
        let cacheable = method == Method::GET;
        let cache_key = ResponseCache::key(method.as_str(), url.as_str(), &body_text);
        if cacheable {
            if let Some(hit) = self.cache.get(&cache_key) {
                debug!(%url, "Upstream cache hit");
                return Ok(hit);
            }
        }

        let mut request = self
            .http
            .request(method, url.clone())
            .header("Content-Type", "application/json")
            .header("Api-Key", &self.api_key)
            .header("SiteId", &self.site_id);
        if let Some(token) = self.tokens.bearer().await {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        debug!(%url, "Upstream request");
        let response = request.send().await?;
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(UpstreamError::Authentication);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let payload: Value = response.json().await?;
        if cacheable {
            self.cache.put(cache_key, payload.clone());
        }
        Ok(payload)
    }
}

/// Token endpoints of the studio API.
pub struct HttpAuthApi {
    http: Client,
    base_url: String,
    api_key: String,
    site_id: String,
}

impl HttpAuthApi {
    pub fn new(http: Client, base_url: String, api_key: String, site_id: String) -> Self {
        Self {
            http,
            base_url,
            api_key,
            site_id,
        }
    }

    async fn token_request(
        &self,
        endpoint: &str,
        bearer: Option<&str>,
        body: Option<Value>,
    ) -> Result<IssuedToken, UpstreamError> {
        let mut request = self
            .http
            .post(format!("{}{endpoint}", self.base_url))
            .header("Content-Type", "application/json")
            .header("Api-Key", &self.api_key)
            .header("SiteId", &self.site_id);
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }
        if let Some(body) = &body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(UpstreamError::Authentication);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let payload: Value = response.json().await?;
        parse_issued(&payload).ok_or_else(|| UpstreamError::Status {
            status: status.as_u16(),
            body: "token response missing AccessToken".to_string(),
        })
    }
}

fn parse_issued(payload: &Value) -> Option<IssuedToken> {
    let token = payload.get("AccessToken")?.as_str()?.to_string();
    let expires_at = payload
        .get("AccessTokenExpiration")
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc));
    Some(IssuedToken { token, expires_at })
}

#[async_trait]
impl AuthApi for HttpAuthApi {
    async fn issue(&self, username: &str, password: &str) -> Result<IssuedToken, UpstreamError> {
        self.token_request(
            "/usertoken/issue",
            None,
            Some(json!({ "Username": username, "Password": password })),
        )
        .await
    }

    async fn renew(&self, current_token: &str) -> Result<IssuedToken, UpstreamError> {
        self.token_request("/usertoken/renew", Some(current_token), None)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upstream::token::TokenManager;
    use serde_json::json;
    use std::time::Duration;

    struct NoAuth;

    #[async_trait]
    impl AuthApi for NoAuth {
        async fn issue(&self, _: &str, _: &str) -> Result<IssuedToken, UpstreamError> {
            Err(UpstreamError::Authentication)
        }

        async fn renew(&self, _: &str) -> Result<IssuedToken, UpstreamError> {
            Err(UpstreamError::Authentication)
        }
    }

    // Unroutable base URL: any network attempt fails fast.
    fn gateway(cache: Arc<ResponseCache>) -> UpstreamGateway {
        let http = Client::builder()
            .timeout(Duration::from_millis(250))
            .build()
            .unwrap();
        let tokens = Arc::new(TokenManager::new(Arc::new(NoAuth), None, None, None));
        UpstreamGateway::new(
            http,
            "http://127.0.0.1:1".to_string(),
            "key".to_string(),
            "-99".to_string(),
            tokens,
            cache,
        )
    }

    #[tokio::test]
    async fn warm_cache_serves_gets_without_network() {
        let cache = Arc::new(ResponseCache::new());
        let key = ResponseCache::key("GET", "http://127.0.0.1:1/client/clients?Limit=5", "");
        cache.put(key, json!({"Clients": [{"Id": 100000123}]}));

        let gateway = gateway(cache);
        let result = gateway
            .get(
                "/client/clients",
                &[("Limit".to_string(), json!(5))],
            )
            .await
            .unwrap();
        assert_eq!(result["Clients"][0]["Id"], 100000123);
    }

    #[tokio::test]
    async fn posts_bypass_the_cache() {
        let cache = Arc::new(ResponseCache::new());
        let body = json!({"Test": true});
        let key = ResponseCache::key(
            "POST",
            "http://127.0.0.1:1/sale/checkoutshoppingcart",
            &body.to_string(),
        );
        cache.put(key, json!({"cached": true}));

        let gateway = gateway(cache);
        let result = gateway
            .fetch(Method::POST, "/sale/checkoutshoppingcart", &[], Some(&body))
            .await;
        assert!(matches!(result, Err(UpstreamError::Transport(_))));
    }

    #[test]
    fn tool_error_mapping() {
        let auth = UpstreamError::Authentication.into_tool_error();
        assert_eq!(auth.code, "AUTHENTICATION_FAILED");

        let status = UpstreamError::Status {
            status: 404,
            body: "no such client".to_string(),
        }
        .into_tool_error();
        assert_eq!(status.code, "UPSTREAM_ERROR");
        assert!(status.message.contains("404"));
        assert!(status.message.contains("no such client"));

        let url = UpstreamError::Url("bad".to_string()).into_tool_error();
        assert_eq!(url.code, "EXECUTION_FAILED");
    }

    #[test]
    fn issued_token_parsing() {
        let payload = json!({
            "AccessToken": "abc123",
            "AccessTokenExpiration": "2026-08-25T10:00:00Z"
        });
        let issued = parse_issued(&payload).unwrap();
        assert_eq!(issued.token, "abc123");
        assert!(issued.expires_at.is_some());

        let bare = json!({"AccessToken": "abc123"});
        let issued = parse_issued(&bare).unwrap();
        assert!(issued.expires_at.is_none());

        assert!(parse_issued(&json!({})).is_none());
    }
}
