use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use requeue_core::TaskRecord;

use crate::error::ProviderError;

/// The "dispatch retry" request sent to the execution engine.
///
/// Carries the original task payload plus the DLQ item id so the engine can
/// correlate the new attempt with the dead-lettered one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryDispatch {
    pub task_id: String,
    pub company_id: String,
    pub agent_name: String,
    pub task_type: String,
    pub payload: serde_json::Value,
    pub dlq_id: String,
    pub is_retry: bool,
}

impl RetryDispatch {
    /// Build a retry request for `task` on behalf of DLQ item `dlq_id`.
    pub fn for_task(task: &TaskRecord, dlq_id: impl Into<String>) -> Self {
        Self {
            task_id: task.id.clone(),
            company_id: task.company_id.clone(),
            agent_name: task.agent_name.clone(),
            task_type: task.task_type.clone(),
            payload: task.payload.clone(),
            dlq_id: dlq_id.into(),
            is_retry: true,
        }
    }
}

/// Acknowledgement of an accepted retry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchReceipt {
    /// Engine-side identifier of the new execution, when reported.
    #[serde(default)]
    pub execution_id: Option<String>,
}

/// The external execution engine that re-runs tasks.
///
/// Implementations return `Ok` only when the engine accepted the retry; an
/// engine-reported failure is [`ProviderError::Rejected`] carrying the
/// engine's error text.
#[async_trait]
pub trait TaskEngine: Send + Sync {
    async fn dispatch(&self, request: &RetryDispatch) -> Result<DispatchReceipt, ProviderError>;
}
