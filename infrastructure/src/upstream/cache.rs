//! In-memory response cache for upstream GET requests.
//!
//! Entries are keyed by `{method}:{url}:{body}` and live for
//! [`CACHE_TTL`]. Reads purge the hit entry lazily when stale; a
//! background sweeper reclaims entries nobody re-reads.

use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};
use tracing::debug;

/// How long a cached response stays servable.
pub const CACHE_TTL: Duration = Duration::from_secs(5 * 60);
/// Background sweep period.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(10 * 60);

struct CacheEntry {
    payload: Value,
    expires_at: Instant,
}

/// Unbounded TTL cache of upstream response payloads.
pub struct ResponseCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    ttl: Duration,
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::with_ttl(CACHE_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Cache key for a request.
    pub fn key(method: &str, url: &str, body: &str) -> String {
        format!("{method}:{url}:{body}")
    }

    /// Fetch a live entry, purging it if stale.
    pub fn get(&self, key: &str) -> Option<Value> {
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Some(entry.payload.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn put(&self, key: String, payload: Value) {
        let entry = CacheEntry {
            payload,
            expires_at: Instant::now() + self.ttl,
        };
        self.entries.lock().insert(key, entry);
    }

    /// Drop every expired entry.
    pub fn sweep(&self) {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at > now);
        let swept = before - entries.len();
        if swept > 0 {
            debug!("Swept {swept} expired cache entries");
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Start the periodic sweeper. The task exits once the cache is
    /// dropped, so it never keeps the process alive on its own.
    pub fn spawn_sweeper(self: &Arc<Self>) {
        let weak: Weak<Self> = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(SWEEP_INTERVAL);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(cache) = weak.upgrade() else {
                    break;
                };
                cache.sweep();
            }
        });
    }
}
