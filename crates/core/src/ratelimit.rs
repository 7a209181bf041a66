use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Persisted fixed-length request window for one rate-limit key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitWindow {
    /// Composite key, `{tenant}:{origin}`.
    pub key: String,
    pub request_count: u32,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
}

impl RateLimitWindow {
    /// Open a fresh window at `now` that already counts the current request.
    pub fn open(key: impl Into<String>, now: DateTime<Utc>, length: chrono::Duration) -> Self {
        Self {
            key: key.into(),
            request_count: 1,
            window_start: now,
            window_end: now + length,
        }
    }

    /// A window is expired strictly after its end instant.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.window_end
    }

    /// Whole seconds until the window closes, never less than one.
    pub fn seconds_remaining(&self, now: DateTime<Utc>) -> u64 {
        let remaining = (self.window_end - now).num_seconds();
        u64::try_from(remaining).unwrap_or(0).max(1)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[test]
    fn open_counts_current_request() {
        let now = Utc::now();
        let window = RateLimitWindow::open("t:1.2.3.4", now, Duration::minutes(5));
        assert_eq!(window.request_count, 1);
        assert_eq!(window.window_end - window.window_start, Duration::minutes(5));
    }

    #[test]
    fn expiry_is_strict() {
        let now = Utc::now();
        let window = RateLimitWindow::open("k", now, Duration::minutes(5));
        assert!(!window.is_expired(window.window_end));
        assert!(window.is_expired(window.window_end + Duration::milliseconds(1)));
    }

    #[test]
    fn seconds_remaining_is_positive() {
        let now = Utc::now();
        let window = RateLimitWindow::open("k", now, Duration::minutes(5));
        assert_eq!(window.seconds_remaining(now), 300);
        assert_eq!(window.seconds_remaining(window.window_end), 1);
    }
}
