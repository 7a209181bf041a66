use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Terminal state of a single DLQ item within a replay run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    /// The execution engine accepted the retry.
    RetriedSuccessfully,
    /// The execution engine rejected the retry.
    RetryFailed,
    /// The retry could not be attempted (missing task, paused tenant,
    /// transport or storage failure).
    RetryError,
}

impl ItemStatus {
    /// Returns `true` for both failure classifications.
    pub fn is_failure(self) -> bool {
        !matches!(self, Self::RetriedSuccessfully)
    }
}

/// Per-item result reported back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ItemOutcome {
    pub dlq_id: String,
    pub original_task_id: String,
    pub status: ItemStatus,
    /// Human-readable detail (engine error text, pause reason, ...).
    pub message: String,
    /// When the item becomes eligible again, present only when backoff was scheduled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_retry_at: Option<DateTime<Utc>>,
}
