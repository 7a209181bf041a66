use serde::Deserialize;

use requeue_core::{DEFAULT_MAX_ITEMS, MAX_ITEMS_CEILING};
use requeue_executor::{BackoffPolicy, DEFAULT_BACKOFF_CAP_MINUTES, ExecutorConfig};
use requeue_gateway::{DEFAULT_PAYLOAD_CEILING_BYTES, DEFAULT_PREVIEW_SIZE, ReplayConfig};

use crate::error::ServerError;

/// `[replay]` section: selection limits, safety rails, backoff and breaker.
///
/// # Example
///
/// ```toml
/// [replay]
/// default_max = 50
/// payload_ceiling_bytes = 2097152
/// breaker_failure_ratio = 0.2
/// backoff_cap_minutes = 16
/// preview_size = 5
/// ```
#[derive(Debug, Deserialize)]
pub struct ReplaySettings {
    #[serde(default = "default_max")]
    pub default_max: u32,
    #[serde(default = "default_payload_ceiling")]
    pub payload_ceiling_bytes: usize,
    #[serde(default = "default_breaker_ratio")]
    pub breaker_failure_ratio: f64,
    #[serde(default = "default_backoff_cap")]
    pub backoff_cap_minutes: u32,
    #[serde(default = "default_preview_size")]
    pub preview_size: usize,
}

impl Default for ReplaySettings {
    fn default() -> Self {
        Self {
            default_max: default_max(),
            payload_ceiling_bytes: default_payload_ceiling(),
            breaker_failure_ratio: default_breaker_ratio(),
            backoff_cap_minutes: default_backoff_cap(),
            preview_size: default_preview_size(),
        }
    }
}

impl ReplaySettings {
    pub fn replay_config(&self) -> ReplayConfig {
        ReplayConfig {
            default_max: self.default_max,
            payload_ceiling_bytes: self.payload_ceiling_bytes,
            preview_size: self.preview_size,
        }
    }

    pub fn executor_config(&self) -> ExecutorConfig {
        ExecutorConfig {
            backoff: BackoffPolicy::new(self.backoff_cap_minutes),
            breaker_failure_ratio: self.breaker_failure_ratio,
        }
    }

    pub(crate) fn validate(&self) -> Result<(), ServerError> {
        if !(1..=MAX_ITEMS_CEILING).contains(&self.default_max) {
            return Err(ServerError::Config(format!(
                "replay.default_max must be within 1..={MAX_ITEMS_CEILING}"
            )));
        }
        if !(0.0..=1.0).contains(&self.breaker_failure_ratio) {
            return Err(ServerError::Config(
                "replay.breaker_failure_ratio must be within [0, 1]".into(),
            ));
        }
        if self.backoff_cap_minutes == 0 {
            return Err(ServerError::Config(
                "replay.backoff_cap_minutes must be positive".into(),
            ));
        }
        Ok(())
    }
}

fn default_max() -> u32 {
    DEFAULT_MAX_ITEMS
}

fn default_payload_ceiling() -> usize {
    DEFAULT_PAYLOAD_CEILING_BYTES
}

fn default_breaker_ratio() -> f64 {
    0.2
}

fn default_backoff_cap() -> u32 {
    DEFAULT_BACKOFF_CAP_MINUTES
}

fn default_preview_size() -> usize {
    DEFAULT_PREVIEW_SIZE
}
