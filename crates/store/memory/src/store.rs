use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::{DashMap, DashSet};

use requeue_core::{DlqItem, RateLimitWindow, ReplayRun, TaskRecord};
use requeue_store::error::StoreError;
use requeue_store::selection::DlqSelection;
use requeue_store::store::ReplayStore;

/// Render the idempotency pair into the unique index key.
fn run_index_key(idempotency_key: &str, tenant_scope: &str) -> String {
    format!("{tenant_scope}\u{1f}{idempotency_key}")
}

/// In-memory [`ReplayStore`] backed by [`DashMap`]s, one per table.
///
/// Besides the trait, it exposes seeding helpers (`insert_dlq_item`,
/// `insert_task`, role grants) and snapshot accessors used by tests and
/// local development.
#[derive(Debug, Default)]
pub struct MemoryReplayStore {
    dlq_items: DashMap<String, DlqItem>,
    tasks: DashMap<String, TaskRecord>,
    paused_tenants: DashSet<String>,
    super_admins: DashSet<String>,
    company_admins: DashSet<(String, String)>,
    rate_limits: DashMap<String, RateLimitWindow>,
    runs: DashMap<String, ReplayRun>,
    /// `(idempotency_key, tenant_scope)` -> run id.
    run_index: DashMap<String, String>,
}

impl MemoryReplayStore {
    /// Create a new, empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a DLQ item.
    pub fn insert_dlq_item(&self, item: DlqItem) {
        self.dlq_items.insert(item.id.clone(), item);
    }

    /// Insert or replace a task record.
    pub fn insert_task(&self, task: TaskRecord) {
        self.tasks.insert(task.id.clone(), task);
    }

    /// Toggle the paused flag for a tenant.
    pub fn set_tenant_paused(&self, company_id: &str, paused: bool) {
        if paused {
            self.paused_tenants.insert(company_id.to_owned());
        } else {
            self.paused_tenants.remove(company_id);
        }
    }

    pub fn grant_super_admin(&self, user_id: &str) {
        self.super_admins.insert(user_id.to_owned());
    }

    pub fn grant_company_admin(&self, user_id: &str, company_id: &str) {
        self.company_admins
            .insert((user_id.to_owned(), company_id.to_owned()));
    }

    /// Snapshot of all DLQ items, sorted by id.
    pub fn dlq_items(&self) -> Vec<DlqItem> {
        let mut items: Vec<DlqItem> = self.dlq_items.iter().map(|e| e.value().clone()).collect();
        items.sort_by(|a, b| a.id.cmp(&b.id));
        items
    }

    /// Snapshot of all replay runs, oldest first.
    pub fn runs(&self) -> Vec<ReplayRun> {
        let mut runs: Vec<ReplayRun> = self.runs.iter().map(|e| e.value().clone()).collect();
        runs.sort_by(|a, b| a.requested_at.cmp(&b.requested_at));
        runs
    }

    /// Number of stored rate-limit windows.
    pub fn rate_limit_window_count(&self) -> usize {
        self.rate_limits.len()
    }
}

#[async_trait]
impl ReplayStore for MemoryReplayStore {
    async fn select_dlq_items(
        &self,
        selection: &DlqSelection,
    ) -> Result<Vec<DlqItem>, StoreError> {
        let mut items: Vec<DlqItem> = self
            .dlq_items
            .iter()
            .filter(|entry| selection.matches(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        selection.order_and_truncate(&mut items);
        Ok(items)
    }

    async fn get_dlq_item(&self, id: &str) -> Result<Option<DlqItem>, StoreError> {
        Ok(self.dlq_items.get(id).map(|e| e.value().clone()))
    }

    async fn update_dlq_retry_state(
        &self,
        id: &str,
        retry_count: u32,
        retry_after: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let Some(mut item) = self.dlq_items.get_mut(id) else {
            return Err(StoreError::NotFound(format!("dlq item {id}")));
        };
        item.retry_count = retry_count;
        item.retry_after = retry_after;
        Ok(())
    }

    async fn get_task(&self, task_id: &str) -> Result<Option<TaskRecord>, StoreError> {
        Ok(self.tasks.get(task_id).map(|e| e.value().clone()))
    }

    async fn is_tenant_paused(&self, company_id: &str) -> Result<bool, StoreError> {
        Ok(self.paused_tenants.contains(company_id))
    }

    async fn is_super_admin(&self, user_id: &str) -> Result<bool, StoreError> {
        Ok(self.super_admins.contains(user_id))
    }

    async fn is_company_admin(&self, user_id: &str, company_id: &str) -> Result<bool, StoreError> {
        Ok(self
            .company_admins
            .contains(&(user_id.to_owned(), company_id.to_owned())))
    }

    async fn get_rate_limit_window(
        &self,
        key: &str,
    ) -> Result<Option<RateLimitWindow>, StoreError> {
        Ok(self.rate_limits.get(key).map(|e| e.value().clone()))
    }

    async fn put_rate_limit_window(&self, window: &RateLimitWindow) -> Result<(), StoreError> {
        self.rate_limits.insert(window.key.clone(), window.clone());
        Ok(())
    }

    async fn find_run(
        &self,
        idempotency_key: &str,
        tenant_scope: &str,
    ) -> Result<Option<ReplayRun>, StoreError> {
        let index_key = run_index_key(idempotency_key, tenant_scope);
        let Some(run_id) = self.run_index.get(&index_key).map(|e| e.value().clone()) else {
            return Ok(None);
        };
        Ok(self.runs.get(&run_id).map(|e| e.value().clone()))
    }

    async fn get_run(&self, id: &str) -> Result<Option<ReplayRun>, StoreError> {
        Ok(self.runs.get(id).map(|e| e.value().clone()))
    }

    async fn create_run(&self, run: &ReplayRun) -> Result<(), StoreError> {
        let index_key = run_index_key(&run.idempotency_key, &run.tenant_scope);

        // The index entry is the uniqueness constraint: claim it first.
        match self.run_index.entry(index_key) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                return Err(StoreError::Conflict(format!(
                    "replay run already exists for key '{}' in scope '{}'",
                    run.idempotency_key, run.tenant_scope
                )));
            }
            dashmap::mapref::entry::Entry::Vacant(vacant) => {
                vacant.insert(run.id.clone());
            }
        }

        self.runs.insert(run.id.clone(), run.clone());
        Ok(())
    }

    async fn update_run(&self, run: &ReplayRun) -> Result<(), StoreError> {
        let Some(mut stored) = self.runs.get_mut(&run.id) else {
            return Err(StoreError::NotFound(format!("replay run {}", run.id)));
        };
        stored.status = run.status;
        stored.items_processed = run.items_processed;
        stored.items_succeeded = run.items_succeeded;
        stored.items_failed = run.items_failed;
        stored.completed_at = run.completed_at;
        Ok(())
    }
}
