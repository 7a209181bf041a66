use async_trait::async_trait;

use crate::error::AuditError;
use crate::record::{AuditQuery, AuditRecord};

/// Append-only storage for audit records.
///
/// Implementations must be `Send + Sync` to be shared across async tasks.
#[async_trait]
pub trait AuditStore: Send + Sync {
    /// Persist an audit record.
    async fn record(&self, entry: AuditRecord) -> Result<(), AuditError>;

    /// Retrieve an audit record by its unique ID.
    async fn get_by_id(&self, id: &str) -> Result<Option<AuditRecord>, AuditError>;

    /// Query records, newest first.
    async fn query(&self, query: &AuditQuery) -> Result<Vec<AuditRecord>, AuditError>;
}
