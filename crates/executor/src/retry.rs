use chrono::{DateTime, Duration, Utc};

/// Ceiling applied to the backoff delay, in minutes.
pub const DEFAULT_BACKOFF_CAP_MINUTES: u32 = 16;

/// Backoff delay in minutes after the `retry_count`-th failed attempt.
///
/// Follows `min(2^(retry_count - 1), 16)`; a count of zero is treated as the
/// first attempt.
///
/// ```
/// use requeue_executor::backoff_minutes;
///
/// assert_eq!(backoff_minutes(1), 1);
/// assert_eq!(backoff_minutes(3), 4);
/// assert_eq!(backoff_minutes(9), 16);
/// ```
pub fn backoff_minutes(retry_count: u32) -> u32 {
    BackoffPolicy::default().minutes_for(retry_count)
}

/// Capped exponential backoff with a configurable ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    pub cap_minutes: u32,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            cap_minutes: DEFAULT_BACKOFF_CAP_MINUTES,
        }
    }
}

impl BackoffPolicy {
    pub fn new(cap_minutes: u32) -> Self {
        Self { cap_minutes }
    }

    /// Delay in minutes for the given (already incremented) retry count.
    pub fn minutes_for(&self, retry_count: u32) -> u32 {
        let exponent = retry_count.max(1) - 1;
        1u32.checked_shl(exponent)
            .unwrap_or(u32::MAX)
            .min(self.cap_minutes)
    }

    pub fn delay_for(&self, retry_count: u32) -> Duration {
        Duration::minutes(i64::from(self.minutes_for(retry_count)))
    }

    /// Next eligible instant for an item that just reached `retry_count`.
    pub fn next_retry_at(&self, now: DateTime<Utc>, retry_count: u32) -> DateTime<Utc> {
        now + self.delay_for(retry_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doubles_until_cap() {
        let minutes: Vec<u32> = (1..=7).map(backoff_minutes).collect();
        assert_eq!(minutes, vec![1, 2, 4, 8, 16, 16, 16]);
    }

    #[test]
    fn zero_is_first_attempt() {
        assert_eq!(backoff_minutes(0), 1);
    }

    #[test]
    fn huge_counts_stay_capped() {
        assert_eq!(backoff_minutes(31), 16);
        assert_eq!(backoff_minutes(32), 16);
        assert_eq!(backoff_minutes(u32::MAX), 16);
    }

    #[test]
    fn monotonic_non_decreasing() {
        let policy = BackoffPolicy::default();
        for n in 1..64 {
            assert!(policy.minutes_for(n) <= policy.minutes_for(n + 1));
        }
    }

    #[test]
    fn custom_cap() {
        let policy = BackoffPolicy::new(5);
        assert_eq!(policy.minutes_for(3), 4);
        assert_eq!(policy.minutes_for(4), 5);
    }

    #[test]
    fn next_retry_at_adds_delay() {
        let now = Utc::now();
        let policy = BackoffPolicy::default();
        assert_eq!(policy.next_retry_at(now, 3), now + Duration::minutes(4));
    }
}
