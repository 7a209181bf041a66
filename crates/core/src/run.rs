use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a replay run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Pending,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Parse the lowercase representation used by storage backends.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregate counts for a finished batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RunSummary {
    pub total_processed: u32,
    pub successful: u32,
    pub failed: u32,
}

/// One invocation of the replay endpoint.
///
/// The pair `(idempotency_key, tenant_scope)` is unique across all runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ReplayRun {
    pub id: String,
    pub idempotency_key: String,
    /// Tenant identifier or `"all"`.
    pub tenant_scope: String,
    pub requested_at: DateTime<Utc>,
    /// Actor string produced by the credential validator.
    pub requested_by: String,
    /// Hex SHA-256 of the raw request body.
    pub payload_hash: String,
    pub status: RunStatus,
    pub items_processed: u32,
    pub items_succeeded: u32,
    pub items_failed: u32,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl ReplayRun {
    /// Build a new run in the `pending` state.
    pub fn pending(
        id: impl Into<String>,
        idempotency_key: impl Into<String>,
        tenant_scope: impl Into<String>,
        requested_by: impl Into<String>,
        payload_hash: impl Into<String>,
        requested_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            idempotency_key: idempotency_key.into(),
            tenant_scope: tenant_scope.into(),
            requested_at,
            requested_by: requested_by.into(),
            payload_hash: payload_hash.into(),
            status: RunStatus::Pending,
            items_processed: 0,
            items_succeeded: 0,
            items_failed: 0,
            completed_at: None,
        }
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            total_processed: self.items_processed,
            successful: self.items_succeeded,
            failed: self.items_failed,
        }
    }

    /// Move the run to a terminal status with the given counts.
    pub fn finalize(&mut self, status: RunStatus, summary: RunSummary, at: DateTime<Utc>) {
        self.status = status;
        self.items_processed = summary.total_processed;
        self.items_succeeded = summary.successful;
        self.items_failed = summary.failed;
        self.completed_at = Some(at);
    }
}
