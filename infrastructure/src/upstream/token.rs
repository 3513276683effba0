//! Access-token lifecycle for the upstream API.
//!
//! One token is current at a time, process-wide. A pre-issued static
//! token takes precedence and is never renewed. Issued tokens are
//! reused while more than [`SAFETY_MARGIN_SECS`] remains, renewed up to
//! [`RENEWAL_BUDGET`] times while still valid, and re-issued otherwise.
//!
//! The slot is a `tokio::sync::Mutex` held across the refresh await, so
//! concurrent callers needing a new token share a single in-flight
//! issuance instead of racing.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::gateway::UpstreamError;

/// Reuse margin: a token within an hour of expiry is refreshed early.
pub const SAFETY_MARGIN_SECS: i64 = 60 * 60;
/// Renewals allowed before a full re-issue.
pub const RENEWAL_BUDGET: u32 = 7;
/// Fallback lifetime when the upstream omits an expiration.
const DEFAULT_LIFETIME_HOURS: i64 = 24;

/// The current upstream bearer token.
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub renewal_count: u32,
    /// Operator-supplied token; never expires, never renewed.
    pub is_static: bool,
}

impl AccessToken {
    /// Adopt an operator-supplied token with a far-future expiration.
    pub fn static_token(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            expires_at: Utc::now() + Duration::days(365 * 100),
            renewal_count: 0,
            is_static: true,
        }
    }

    fn issued(issued: IssuedToken, renewal_count: u32, now: DateTime<Utc>) -> Self {
        Self {
            token: issued.token,
            expires_at: issued
                .expires_at
                .unwrap_or_else(|| now + Duration::hours(DEFAULT_LIFETIME_HOURS)),
            renewal_count,
            is_static: false,
        }
    }
}

/// A token returned by the issue or renew endpoint.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    /// Parsed `AccessTokenExpiration`, when present and well-formed.
    pub expires_at: Option<DateTime<Utc>>,
}

/// What `bearer()` must do next for the current slot state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenAction {
    /// Current token is fresh enough; return it unchanged.
    UseCached,
    /// Renew using the current token as bearer credential.
    Renew,
    /// Issue a brand-new token with username/password.
    Issue,
    /// No credentials configured; proceed key-only.
    KeyOnly,
}

/// Decide the next step for a `bearer()` call.
///
/// Pure so the margin and budget boundaries are directly testable.
pub fn next_action(
    current: Option<&AccessToken>,
    has_credentials: bool,
    now: DateTime<Utc>,
) -> TokenAction {
    if let Some(token) = current {
        if token.is_static {
            return TokenAction::UseCached;
        }
        if !has_credentials {
            return TokenAction::KeyOnly;
        }
        if token.expires_at > now + Duration::seconds(SAFETY_MARGIN_SECS) {
            return TokenAction::UseCached;
        }
        if token.renewal_count < RENEWAL_BUDGET && token.expires_at > now {
            return TokenAction::Renew;
        }
        return TokenAction::Issue;
    }
    if has_credentials {
        TokenAction::Issue
    } else {
        TokenAction::KeyOnly
    }
}

/// Auth endpoints of the upstream API, behind a seam for testing.
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// `POST /usertoken/issue` with staff credentials.
    async fn issue(&self, username: &str, password: &str) -> Result<IssuedToken, UpstreamError>;

    /// `POST /usertoken/renew` with the current token as bearer.
    async fn renew(&self, current_token: &str) -> Result<IssuedToken, UpstreamError>;
}

/// Manages the process-wide current token.
pub struct TokenManager {
    auth: Arc<dyn AuthApi>,
    username: Option<String>,
    password: Option<String>,
    slot: Mutex<Option<AccessToken>>,
}

impl TokenManager {
    pub fn new(
        auth: Arc<dyn AuthApi>,
        username: Option<String>,
        password: Option<String>,
        static_token: Option<String>,
    ) -> Self {
        let seeded = static_token.map(AccessToken::static_token);
        Self {
            auth,
            username,
            password,
            slot: Mutex::new(seeded),
        }
    }

    fn has_credentials(&self) -> bool {
        self.username.is_some() && self.password.is_some()
    }

    /// Produce a valid bearer token, or `None` for key-only operation.
    ///
    /// Issuance failure is logged and yields `None`; the subsequent
    /// upstream 401/403 carries the user-facing diagnostic.
    pub async fn bearer(&self) -> Option<String> {
        let mut slot = self.slot.lock().await;
        let now = Utc::now();

        match next_action(slot.as_ref(), self.has_credentials(), now) {
            TokenAction::UseCached => slot.as_ref().map(|t| t.token.clone()),
            TokenAction::KeyOnly => None,
            TokenAction::Renew => {
                let current = slot.as_ref().cloned();
                if let Some(current) = current {
                    match self.auth.renew(&current.token).await {
                        Ok(issued) => {
                            debug!("Renewed upstream token (renewal {})", current.renewal_count + 1);
                            let token =
                                AccessToken::issued(issued, current.renewal_count + 1, now);
                            let value = token.token.clone();
                            *slot = Some(token);
                            return Some(value);
                        }
                        Err(e) => {
                            warn!("Token renewal failed, re-issuing: {e}");
                        }
                    }
                }
                self.issue_into(&mut slot, now).await
            }
            TokenAction::Issue => self.issue_into(&mut slot, now).await,
        }
    }

    async fn issue_into(
        &self,
        slot: &mut Option<AccessToken>,
        now: DateTime<Utc>,
    ) -> Option<String> {
        let (Some(username), Some(password)) = (&self.username, &self.password) else {
            return None;
        };
        match self.auth.issue(username, password).await {
            Ok(issued) => {
                debug!("Issued new upstream token");
                let token = AccessToken::issued(issued, 0, now);
                let value = token.token.clone();
                *slot = Some(token);
                Some(value)
            }
            Err(e) => {
                warn!("Token issuance failed, proceeding key-only: {e}");
                None
            }
        }
    }

    #[cfg(test)]
    async fn seed(&self, token: AccessToken) {
        *self.slot.lock().await = Some(token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingAuth {
        issues: AtomicUsize,
        renews: AtomicUsize,
        fail_renew: bool,
    }

    impl CountingAuth {
        fn new() -> Self {
            Self {
                issues: AtomicUsize::new(0),
                renews: AtomicUsize::new(0),
                fail_renew: false,
            }
        }

        fn failing_renew() -> Self {
            Self {
                fail_renew: true,
                ..Self::new()
            }
        }
    }

    #[async_trait]
    impl AuthApi for CountingAuth {
        async fn issue(&self, _u: &str, _p: &str) -> Result<IssuedToken, UpstreamError> {
            let n = self.issues.fetch_add(1, Ordering::SeqCst);
            Ok(IssuedToken {
                token: format!("issued-{n}"),
                expires_at: Some(Utc::now() + Duration::hours(24)),
            })
        }

        async fn renew(&self, current: &str) -> Result<IssuedToken, UpstreamError> {
            self.renews.fetch_add(1, Ordering::SeqCst);
            if self.fail_renew {
                return Err(UpstreamError::Status {
                    status: 400,
                    body: "renewal rejected".to_string(),
                });
            }
            Ok(IssuedToken {
                token: format!("{current}-renewed"),
                expires_at: Some(Utc::now() + Duration::hours(24)),
            })
        }
    }

    fn manager(auth: Arc<CountingAuth>) -> TokenManager {
        TokenManager::new(
            auth,
            Some("owner".to_string()),
            Some("hunter2".to_string()),
            None,
        )
    }

    fn token(expires_in_secs: i64, renewal_count: u32) -> AccessToken {
        AccessToken {
            token: "tok".to_string(),
            expires_at: Utc::now() + Duration::seconds(expires_in_secs),
            renewal_count,
            is_static: false,
        }
    }

    // ==================== next_action (pure) ====================

    #[test]
    fn fresh_token_is_reused() {
        let t = token(SAFETY_MARGIN_SECS + 60, 0);
        assert_eq!(next_action(Some(&t), true, Utc::now()), TokenAction::UseCached);
    }

    #[test]
    fn margin_minus_one_second_triggers_renewal() {
        let now = Utc::now();
        let t = AccessToken {
            token: "tok".to_string(),
            expires_at: now + Duration::seconds(SAFETY_MARGIN_SECS - 1),
            renewal_count: 0,
            is_static: false,
        };
        assert_eq!(next_action(Some(&t), true, now), TokenAction::Renew);
    }

    #[test]
    fn exhausted_renewal_budget_forces_reissue() {
        let t = token(60, RENEWAL_BUDGET);
        assert_eq!(next_action(Some(&t), true, Utc::now()), TokenAction::Issue);
    }

    #[test]
    fn expired_token_forces_reissue() {
        let t = token(-10, 0);
        assert_eq!(next_action(Some(&t), true, Utc::now()), TokenAction::Issue);
    }

    #[test]
    fn static_token_always_wins() {
        let t = AccessToken::static_token("operator-token");
        assert_eq!(next_action(Some(&t), true, Utc::now()), TokenAction::UseCached);
        assert_eq!(next_action(Some(&t), false, Utc::now()), TokenAction::UseCached);
    }

    #[test]
    fn no_credentials_means_key_only() {
        assert_eq!(next_action(None, false, Utc::now()), TokenAction::KeyOnly);
        let t = token(-10, 0);
        assert_eq!(next_action(Some(&t), false, Utc::now()), TokenAction::KeyOnly);
    }

    // ==================== TokenManager ====================

    #[tokio::test]
    async fn repeated_calls_reuse_the_issued_token() {
        let auth = Arc::new(CountingAuth::new());
        let manager = manager(auth.clone());

        let first = manager.bearer().await.unwrap();
        let second = manager.bearer().await.unwrap();
        assert_eq!(first, second);
        assert_eq!(auth.issues.load(Ordering::SeqCst), 1);
        assert_eq!(auth.renews.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn near_expiry_token_is_renewed() {
        let auth = Arc::new(CountingAuth::new());
        let manager = manager(auth.clone());
        manager.seed(token(SAFETY_MARGIN_SECS - 1, 2)).await;

        let bearer = manager.bearer().await.unwrap();
        assert_eq!(bearer, "tok-renewed");
        assert_eq!(auth.renews.load(Ordering::SeqCst), 1);
        assert_eq!(auth.issues.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn eighth_refresh_reissues_instead_of_renewing() {
        let auth = Arc::new(CountingAuth::new());
        let manager = manager(auth.clone());
        manager.seed(token(SAFETY_MARGIN_SECS - 1, RENEWAL_BUDGET)).await;

        let bearer = manager.bearer().await.unwrap();
        assert_eq!(bearer, "issued-0");
        assert_eq!(auth.renews.load(Ordering::SeqCst), 0);
        assert_eq!(auth.issues.load(Ordering::SeqCst), 1);

        // Renewal count reset: the fresh token renews again next time
        manager.seed(token(SAFETY_MARGIN_SECS - 1, 0)).await;
        manager.bearer().await.unwrap();
        assert_eq!(auth.renews.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_renewal_falls_back_to_reissue() {
        let auth = Arc::new(CountingAuth::failing_renew());
        let manager = manager(auth.clone());
        manager.seed(token(SAFETY_MARGIN_SECS - 1, 1)).await;

        let bearer = manager.bearer().await.unwrap();
        assert_eq!(bearer, "issued-0");
        assert_eq!(auth.renews.load(Ordering::SeqCst), 1);
        assert_eq!(auth.issues.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn static_token_never_touches_auth_endpoints() {
        let auth = Arc::new(CountingAuth::new());
        let manager = TokenManager::new(
            auth.clone(),
            Some("owner".to_string()),
            Some("hunter2".to_string()),
            Some("operator-token".to_string()),
        );

        for _ in 0..3 {
            assert_eq!(manager.bearer().await.as_deref(), Some("operator-token"));
        }
        assert_eq!(auth.issues.load(Ordering::SeqCst), 0);
        assert_eq!(auth.renews.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn without_credentials_bearer_is_none() {
        let auth = Arc::new(CountingAuth::new());
        let manager = TokenManager::new(auth.clone(), None, None, None);
        assert!(manager.bearer().await.is_none());
        assert_eq!(auth.issues.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_issuance() {
        let auth = Arc::new(CountingAuth::new());
        let manager = Arc::new(manager(auth.clone()));

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let m = manager.clone();
                tokio::spawn(async move { m.bearer().await })
            })
            .collect();
        for task in tasks {
            assert!(task.await.unwrap().is_some());
        }
        assert_eq!(auth.issues.load(Ordering::SeqCst), 1);
    }
}
