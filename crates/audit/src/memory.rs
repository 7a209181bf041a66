use async_trait::async_trait;
use dashmap::DashMap;

use crate::error::AuditError;
use crate::record::{AuditQuery, AuditRecord};
use crate::store::AuditStore;

/// In-memory audit store using `DashMap`. Suitable for development and testing.
#[derive(Debug, Default)]
pub struct MemoryAuditStore {
    records: DashMap<String, AuditRecord>,
}

impl MemoryAuditStore {
    /// Create a new empty in-memory audit store.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl AuditStore for MemoryAuditStore {
    async fn record(&self, entry: AuditRecord) -> Result<(), AuditError> {
        self.records.insert(entry.id.clone(), entry);
        Ok(())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<AuditRecord>, AuditError> {
        Ok(self.records.get(id).map(|r| r.value().clone()))
    }

    async fn query(&self, query: &AuditQuery) -> Result<Vec<AuditRecord>, AuditError> {
        let mut matching: Vec<AuditRecord> = self
            .records
            .iter()
            .filter(|entry| query.matches(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();

        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        matching.truncate(query.effective_limit() as usize);
        Ok(matching)
    }
}
