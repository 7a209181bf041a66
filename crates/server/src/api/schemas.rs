use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use requeue_core::{ItemOutcome, PreviewItem, ReplayRun, RunSummary};
use requeue_gateway::ReplayOutcome;

/// Health check response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    #[schema(example = "ok")]
    pub status: String,
}

/// Error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

/// Body of a 429 response. The same value is sent in `Retry-After`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RateLimitedResponse {
    pub error: String,
    /// Seconds until the window resets.
    #[schema(example = 240)]
    pub retry_after: u64,
}

/// Nothing matched the filters; the run completed with zero counts.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct NoItemsResponse {
    pub message: String,
    #[schema(example = 0)]
    pub count: u32,
    pub replay_run_id: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DryRunResponse {
    pub message: String,
    pub items_found: u32,
    pub replay_run_id: String,
    /// The first few selected items.
    pub preview: Vec<PreviewItem>,
}

/// A run with the same idempotency key and tenant already finished.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct IdempotentResponse {
    pub message: String,
    pub replay_run: ReplayRun,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReplayCompletedResponse {
    pub message: String,
    pub summary: RunSummary,
    pub replay_run_id: String,
    /// One entry per processed item, in processing order.
    pub results: Vec<ItemOutcome>,
    /// `true` when the circuit breaker stopped the batch early.
    pub aborted: bool,
}

/// Any 200 response of `POST /v1/replay`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum ReplayResponse {
    Completed(ReplayCompletedResponse),
    DryRun(DryRunResponse),
    Idempotent(IdempotentResponse),
    NoItems(NoItemsResponse),
}

impl From<ReplayOutcome> for ReplayResponse {
    fn from(outcome: ReplayOutcome) -> Self {
        match outcome {
            ReplayOutcome::Idempotent { run } => Self::Idempotent(IdempotentResponse {
                message: "Replay already processed for this idempotency key".to_owned(),
                replay_run: run,
            }),
            ReplayOutcome::NoItems { run_id } => Self::NoItems(NoItemsResponse {
                message: "No eligible DLQ items found".to_owned(),
                count: 0,
                replay_run_id: run_id,
            }),
            ReplayOutcome::DryRun {
                run_id,
                items_found,
                preview,
            } => Self::DryRun(DryRunResponse {
                message: format!("Dry run: {items_found} items would be replayed"),
                items_found,
                replay_run_id: run_id,
                preview,
            }),
            ReplayOutcome::Completed { run_id, report } => {
                let message = if report.tripped {
                    "Replay stopped early: failure rate exceeded the circuit breaker threshold"
                } else {
                    "Replay completed"
                };
                Self::Completed(ReplayCompletedResponse {
                    message: message.to_owned(),
                    summary: report.summary,
                    replay_run_id: run_id,
                    results: report.outcomes,
                    aborted: report.tripped,
                })
            }
        }
    }
}
