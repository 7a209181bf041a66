use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use requeue_core::RunSummary;

use crate::error::WebhookError;

/// Structured summary of a finished replay run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayNotification {
    pub replay_run_id: String,
    pub actor: String,
    pub tenant_scope: String,
    pub total: u32,
    pub successful: u32,
    pub failed: u32,
    /// Whether the circuit breaker stopped the batch early.
    pub aborted: bool,
    /// One-line rendering for chat-style receivers.
    pub text: String,
}

impl ReplayNotification {
    pub fn new(
        replay_run_id: impl Into<String>,
        actor: impl Into<String>,
        tenant_scope: impl Into<String>,
        summary: RunSummary,
        aborted: bool,
    ) -> Self {
        let replay_run_id = replay_run_id.into();
        let actor = actor.into();
        let tenant_scope = tenant_scope.into();
        let mut text = format!(
            "DLQ replay {replay_run_id} ({tenant_scope}) by {actor}: {} of {} succeeded, {} failed",
            summary.successful, summary.total_processed, summary.failed
        );
        if aborted {
            text.push_str(" [stopped by circuit breaker]");
        }
        Self {
            replay_run_id,
            actor,
            tenant_scope,
            total: summary.total_processed,
            successful: summary.successful,
            failed: summary.failed,
            aborted,
            text,
        }
    }
}

/// Outbound channel for replay summaries.
///
/// Delivery is best-effort from the caller's point of view; errors are
/// returned so they can be logged.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: &ReplayNotification) -> Result<(), WebhookError>;
}
