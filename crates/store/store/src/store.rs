use async_trait::async_trait;
use chrono::{DateTime, Utc};

use requeue_core::{DlqItem, RateLimitWindow, ReplayRun, TaskRecord};

use crate::error::StoreError;
use crate::selection::DlqSelection;

/// Trait for the transactional store behind the replay service.
///
/// Every method is a single row-level read or write; there are no
/// multi-statement transactions. Implementations must be `Send + Sync` and
/// safe for concurrent access from multiple replay runs.
#[async_trait]
pub trait ReplayStore: Send + Sync {
    // -- DLQ items ---------------------------------------------------------

    /// Return eligible DLQ items for the selection, ordered by ascending
    /// priority and capped at `selection.limit`.
    async fn select_dlq_items(&self, selection: &DlqSelection)
    -> Result<Vec<DlqItem>, StoreError>;

    /// Fetch a single DLQ item by id.
    async fn get_dlq_item(&self, id: &str) -> Result<Option<DlqItem>, StoreError>;

    /// Overwrite the retry counters of a DLQ item (last write wins).
    ///
    /// Returns [`StoreError::NotFound`] if the item does not exist.
    async fn update_dlq_retry_state(
        &self,
        id: &str,
        retry_count: u32,
        retry_after: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    // -- Tasks and tenants -------------------------------------------------

    /// Resolve the original task referenced by a DLQ item.
    async fn get_task(&self, task_id: &str) -> Result<Option<TaskRecord>, StoreError>;

    /// Whether processing is currently paused for the tenant.
    async fn is_tenant_paused(&self, company_id: &str) -> Result<bool, StoreError>;

    // -- Roles -------------------------------------------------------------

    /// Whether the user holds the global elevated role.
    async fn is_super_admin(&self, user_id: &str) -> Result<bool, StoreError>;

    /// Whether the user holds an administrative membership in the tenant.
    async fn is_company_admin(&self, user_id: &str, company_id: &str) -> Result<bool, StoreError>;

    // -- Rate limiting -----------------------------------------------------

    /// Read the stored window for a rate-limit key.
    async fn get_rate_limit_window(&self, key: &str)
    -> Result<Option<RateLimitWindow>, StoreError>;

    /// Insert or replace the window for `window.key`.
    async fn put_rate_limit_window(&self, window: &RateLimitWindow) -> Result<(), StoreError>;

    // -- Replay runs -------------------------------------------------------

    /// Look up a run by its idempotency pair.
    async fn find_run(
        &self,
        idempotency_key: &str,
        tenant_scope: &str,
    ) -> Result<Option<ReplayRun>, StoreError>;

    /// Fetch a run by id.
    async fn get_run(&self, id: &str) -> Result<Option<ReplayRun>, StoreError>;

    /// Insert a new run.
    ///
    /// Returns [`StoreError::Conflict`] if a run with the same
    /// `(idempotency_key, tenant_scope)` pair already exists.
    async fn create_run(&self, run: &ReplayRun) -> Result<(), StoreError>;

    /// Persist status, counts, and completion time of an existing run.
    async fn update_run(&self, run: &ReplayRun) -> Result<(), StoreError>;
}
