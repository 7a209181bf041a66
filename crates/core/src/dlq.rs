use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A failed unit of work parked in the dead-letter queue.
///
/// Items are created by the execution engine once a task exhausts its
/// in-process retries. The replay service only ever mutates `retry_count`
/// and `retry_after`; items are never deleted here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct DlqItem {
    /// Unique identifier of the DLQ entry.
    #[cfg_attr(feature = "openapi", schema(example = "dlq_01HZX3"))]
    pub id: String,
    /// Reference to the task that originally failed.
    pub original_task_id: String,
    /// Tenant that owns the task.
    #[cfg_attr(feature = "openapi", schema(example = "company-42"))]
    pub company_id: String,
    /// Agent / processor that was executing the task.
    pub agent_name: String,
    /// Error classification (e.g. `timeout`, `rate_limited`).
    #[cfg_attr(feature = "openapi", schema(example = "timeout"))]
    pub error_type: String,
    /// Last error message recorded for the task.
    pub error_message: String,
    /// Number of replay attempts made so far.
    pub retry_count: u32,
    /// Upper bound on replay attempts.
    pub max_retries: u32,
    /// Earliest instant at which a non-forced replay may pick this item up.
    pub retry_after: DateTime<Utc>,
    /// Processing priority; lower values are replayed first.
    pub priority: i32,
}

impl DlqItem {
    /// Returns `true` once the item has used up its retry budget.
    ///
    /// Exhausted items are never selected, even with `force`.
    pub fn is_exhausted(&self) -> bool {
        self.retry_count >= self.max_retries
    }

    /// Final eligibility predicate applied after filter selection.
    pub fn is_eligible(&self, now: DateTime<Utc>, force: bool) -> bool {
        !self.is_exhausted() && (force || self.retry_after <= now)
    }
}

/// Abbreviated view of a DLQ item returned by dry runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PreviewItem {
    pub id: String,
    pub company_id: String,
    pub error_type: String,
    pub retry_count: u32,
}

impl From<&DlqItem> for PreviewItem {
    fn from(item: &DlqItem) -> Self {
        Self {
            id: item.id.clone(),
            company_id: item.company_id.clone(),
            error_type: item.error_type.clone(),
            retry_count: item.retry_count,
        }
    }
}
