use std::sync::Arc;

use axum::http::HeaderMap;
use chrono::{DateTime, Utc};
use tracing::warn;

use requeue_core::RateLimitWindow;
use requeue_store::ReplayStore;

use super::config::{RateLimitConfig, RateLimitErrorBehavior};

/// Origin recorded when no forwarding header is present.
pub const UNKNOWN_ORIGIN: &str = "unknown";

/// Retry-after reported when the store is unreachable and `on_error = "deny"`.
const STORE_ERROR_RETRY_AFTER: u64 = 60;

/// Result of an allowed rate limit check.
#[derive(Debug, Clone)]
pub struct RateLimitResult {
    /// The configured limit.
    pub limit: u32,
    /// Requests left in the current window.
    pub remaining: u32,
}

/// Error returned when the rate limit is exceeded.
#[derive(Debug)]
pub struct RateLimitExceeded {
    /// Seconds until the caller can retry.
    pub retry_after: u64,
    pub limit: u32,
}

/// Fixed-window rate limiter backed by the replay store.
///
/// Windows are rows in the shared store accessed by read then conditional
/// write, so every server instance sees the same counters. The key is
/// `{tenant}:{origin}`; the actor is deliberately not part of it so that
/// signature-authenticated traffic is still capped per tenant and origin.
pub struct RateLimiter {
    store: Arc<dyn ReplayStore>,
    config: RateLimitConfig,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn ReplayStore>, config: RateLimitConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Check and record a request for `(tenant, origin)`.
    pub async fn check(
        &self,
        tenant: &str,
        origin: &str,
    ) -> Result<RateLimitResult, RateLimitExceeded> {
        self.check_at(tenant, origin, Utc::now()).await
    }

    /// [`check`](Self::check) at an explicit instant.
    pub async fn check_at(
        &self,
        tenant: &str,
        origin: &str,
        now: DateTime<Utc>,
    ) -> Result<RateLimitResult, RateLimitExceeded> {
        let limit = self.config.max_requests;
        if !self.config.enabled {
            return Ok(RateLimitResult {
                limit,
                remaining: limit,
            });
        }

        let key = format!("{tenant}:{origin}");
        let existing = match self.store.get_rate_limit_window(&key).await {
            Ok(window) => window,
            Err(e) => {
                warn!(error = %e, key = %key, "rate limiter: failed to read window");
                return self.handle_store_error();
            }
        };

        let window = match existing {
            Some(window) if !window.is_expired(now) => {
                if window.request_count >= limit {
                    return Err(RateLimitExceeded {
                        retry_after: window.seconds_remaining(now),
                        limit,
                    });
                }
                RateLimitWindow {
                    request_count: window.request_count + 1,
                    ..window
                }
            }
            _ => RateLimitWindow::open(key, now, self.window_length()),
        };

        if let Err(e) = self.store.put_rate_limit_window(&window).await {
            warn!(error = %e, key = %window.key, "rate limiter: failed to write window");
            return self.handle_store_error();
        }

        Ok(RateLimitResult {
            limit,
            remaining: limit.saturating_sub(window.request_count),
        })
    }

    fn window_length(&self) -> chrono::Duration {
        let secs = i64::try_from(self.config.window_seconds).unwrap_or(i64::MAX);
        chrono::Duration::try_seconds(secs).unwrap_or(chrono::Duration::MAX)
    }

    fn handle_store_error(&self) -> Result<RateLimitResult, RateLimitExceeded> {
        let limit = self.config.max_requests;
        match self.config.on_error {
            RateLimitErrorBehavior::Allow => Ok(RateLimitResult {
                limit,
                remaining: limit,
            }),
            RateLimitErrorBehavior::Deny => Err(RateLimitExceeded {
                retry_after: STORE_ERROR_RETRY_AFTER,
                limit,
            }),
        }
    }
}

/// Network origin of the caller: the first address in `X-Forwarded-For`,
/// then `X-Real-IP`, then [`UNKNOWN_ORIGIN`].
pub fn network_origin(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .or_else(|| headers.get("x-real-ip"))
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(UNKNOWN_ORIGIN)
        .to_owned()
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chrono::Duration;

    use requeue_core::{DlqItem, ReplayRun, TaskRecord};
    use requeue_store::{DlqSelection, StoreError};
    use requeue_store_memory::MemoryReplayStore;

    use super::*;

    fn limiter(store: Arc<dyn ReplayStore>) -> RateLimiter {
        RateLimiter::new(store, RateLimitConfig::default())
    }

    #[tokio::test]
    async fn fourth_request_in_window_is_rejected() {
        let store = Arc::new(MemoryReplayStore::new());
        let limiter = limiter(store.clone());
        let now = Utc::now();

        for expected_remaining in [2, 1, 0] {
            let result = limiter.check_at("c1", "10.0.0.1", now).await.unwrap();
            assert_eq!(result.remaining, expected_remaining);
        }
        let err = limiter
            .check_at("c1", "10.0.0.1", now + Duration::seconds(10))
            .await
            .unwrap_err();
        assert_eq!(err.retry_after, 290);
        assert_eq!(store.rate_limit_window_count(), 1);
    }

    #[tokio::test]
    async fn keys_are_per_tenant_and_origin() {
        let limiter = limiter(Arc::new(MemoryReplayStore::new()));
        let now = Utc::now();
        for _ in 0..3 {
            limiter.check_at("c1", "10.0.0.1", now).await.unwrap();
        }
        assert!(limiter.check_at("c1", "10.0.0.2", now).await.is_ok());
        assert!(limiter.check_at("c2", "10.0.0.1", now).await.is_ok());
        assert!(limiter.check_at("c1", "10.0.0.1", now).await.is_err());
    }

    #[tokio::test]
    async fn expired_window_resets() {
        let store = Arc::new(MemoryReplayStore::new());
        let limiter = limiter(store.clone());
        let now = Utc::now();
        for _ in 0..3 {
            limiter.check_at("c1", "o", now).await.unwrap();
        }
        let later = now + Duration::seconds(301);
        let result = limiter.check_at("c1", "o", later).await.unwrap();
        assert_eq!(result.remaining, 2);

        let window = store.get_rate_limit_window("c1:o").await.unwrap().unwrap();
        assert_eq!(window.request_count, 1);
        assert_eq!(window.window_start, later);
    }

    #[tokio::test]
    async fn disabled_limiter_never_touches_store() {
        let store = Arc::new(MemoryReplayStore::new());
        let limiter = RateLimiter::new(
            store.clone(),
            RateLimitConfig {
                enabled: false,
                ..RateLimitConfig::default()
            },
        );
        for _ in 0..10 {
            assert!(limiter.check("c1", "o").await.is_ok());
        }
        assert_eq!(store.rate_limit_window_count(), 0);
    }

    /// Store whose rate limit rows are unreachable.
    struct BrokenWindows(MemoryReplayStore);

    #[async_trait]
    impl ReplayStore for BrokenWindows {
        async fn select_dlq_items(&self, s: &DlqSelection) -> Result<Vec<DlqItem>, StoreError> {
            self.0.select_dlq_items(s).await
        }
        async fn get_dlq_item(&self, id: &str) -> Result<Option<DlqItem>, StoreError> {
            self.0.get_dlq_item(id).await
        }
        async fn update_dlq_retry_state(
            &self,
            id: &str,
            retry_count: u32,
            retry_after: DateTime<Utc>,
        ) -> Result<(), StoreError> {
            self.0.update_dlq_retry_state(id, retry_count, retry_after).await
        }
        async fn get_task(&self, id: &str) -> Result<Option<TaskRecord>, StoreError> {
            self.0.get_task(id).await
        }
        async fn is_tenant_paused(&self, c: &str) -> Result<bool, StoreError> {
            self.0.is_tenant_paused(c).await
        }
        async fn is_super_admin(&self, u: &str) -> Result<bool, StoreError> {
            self.0.is_super_admin(u).await
        }
        async fn is_company_admin(&self, u: &str, c: &str) -> Result<bool, StoreError> {
            self.0.is_company_admin(u, c).await
        }
        async fn get_rate_limit_window(&self, _: &str) -> Result<Option<RateLimitWindow>, StoreError> {
            Err(StoreError::Connection("refused".into()))
        }
        async fn put_rate_limit_window(&self, _: &RateLimitWindow) -> Result<(), StoreError> {
            Err(StoreError::Connection("refused".into()))
        }
        async fn find_run(&self, k: &str, s: &str) -> Result<Option<ReplayRun>, StoreError> {
            self.0.find_run(k, s).await
        }
        async fn get_run(&self, id: &str) -> Result<Option<ReplayRun>, StoreError> {
            self.0.get_run(id).await
        }
        async fn create_run(&self, run: &ReplayRun) -> Result<(), StoreError> {
            self.0.create_run(run).await
        }
        async fn update_run(&self, run: &ReplayRun) -> Result<(), StoreError> {
            self.0.update_run(run).await
        }
    }

    #[tokio::test]
    async fn store_outage_fails_open_by_default() {
        let limiter = limiter(Arc::new(BrokenWindows(MemoryReplayStore::new())));
        for _ in 0..5 {
            assert!(limiter.check("c1", "o").await.is_ok());
        }
    }

    #[tokio::test]
    async fn store_outage_can_fail_closed() {
        let limiter = RateLimiter::new(
            Arc::new(BrokenWindows(MemoryReplayStore::new())),
            RateLimitConfig {
                on_error: RateLimitErrorBehavior::Deny,
                ..RateLimitConfig::default()
            },
        );
        let err = limiter.check("c1", "o").await.unwrap_err();
        assert_eq!(err.retry_after, 60);
    }

    #[test]
    fn origin_prefers_first_forwarded_address() {
        let mut headers = HeaderMap::new();
        assert_eq!(network_origin(&headers), UNKNOWN_ORIGIN);

        headers.insert("x-real-ip", "192.168.1.9".parse().unwrap());
        assert_eq!(network_origin(&headers), "192.168.1.9");

        headers.insert("x-forwarded-for", "203.0.113.7, 10.0.0.1".parse().unwrap());
        assert_eq!(network_origin(&headers), "203.0.113.7");
    }
}
