use crate::retry::BackoffPolicy;

/// Configuration for the [`RetryExecutor`](crate::RetryExecutor).
///
/// # Examples
///
/// ```
/// use requeue_executor::ExecutorConfig;
///
/// let config = ExecutorConfig::default();
/// assert_eq!(config.backoff.cap_minutes, 16);
/// assert!((config.breaker_failure_ratio - 0.2).abs() < f64::EPSILON);
/// ```
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Delay schedule applied to failed items.
    pub backoff: BackoffPolicy,
    /// Share of the batch that may fail before the loop stops.
    pub breaker_failure_ratio: f64,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            backoff: BackoffPolicy::default(),
            breaker_failure_ratio: 0.2,
        }
    }
}
