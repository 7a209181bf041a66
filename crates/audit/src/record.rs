use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use requeue_core::RunSummary;

/// Action name written for every finished replay run.
pub const REPLAY_ACTION: &str = "dlq_replay";

/// An immutable audit log entry describing one replay action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AuditRecord {
    /// Unique identifier for this audit record.
    pub id: String,
    /// Actor string produced by the credential validator.
    pub actor: String,
    pub action: String,
    /// Tenant identifier or `"all"`.
    pub scope: String,

    // -- Counts --
    /// Number of items selected for the run.
    pub target_count: u32,
    pub success_count: u32,
    pub failure_count: u32,

    /// Free-form metadata; always carries `replay_run_id` for replay entries.
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl AuditRecord {
    /// Build the entry for a finished replay run.
    pub fn replay(
        id: impl Into<String>,
        replay_run_id: &str,
        actor: impl Into<String>,
        scope: impl Into<String>,
        target_count: u32,
        summary: RunSummary,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            actor: actor.into(),
            action: REPLAY_ACTION.to_owned(),
            scope: scope.into(),
            target_count,
            success_count: summary.successful,
            failure_count: summary.failed,
            metadata: serde_json::json!({
                "replay_run_id": replay_run_id,
                "total_processed": summary.total_processed,
            }),
            created_at,
        }
    }

    /// The replay run this entry references, if any.
    pub fn replay_run_id(&self) -> Option<&str> {
        self.metadata.get("replay_run_id").and_then(|v| v.as_str())
    }
}

/// Filters for [`AuditStore::query`](crate::store::AuditStore::query).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditQuery {
    pub actor: Option<String>,
    pub scope: Option<String>,
    pub action: Option<String>,
    /// Maximum records returned (default 50, max 1000).
    pub limit: Option<u32>,
}

impl AuditQuery {
    /// Return the effective limit, clamped to `[1, 1000]`.
    pub fn effective_limit(&self) -> u32 {
        self.limit.unwrap_or(50).clamp(1, 1000)
    }

    /// Whether `record` passes every filter set on this query.
    pub fn matches(&self, record: &AuditRecord) -> bool {
        fn eq(filter: Option<&String>, value: &str) -> bool {
            filter.is_none_or(|f| f == value)
        }
        eq(self.actor.as_ref(), &record.actor)
            && eq(self.scope.as_ref(), &record.scope)
            && eq(self.action.as_ref(), &record.action)
    }
}
