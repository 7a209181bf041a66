#![allow(clippy::needless_for_each)]

use axum::Json;
use utoipa::OpenApi;

use requeue_core::{
    DlqItem, ItemOutcome, ItemStatus, PreviewItem, ReplayRequest, ReplayRun, RunStatus, RunSummary,
};

use super::schemas::{
    DryRunResponse, ErrorResponse, HealthResponse, IdempotentResponse, NoItemsResponse,
    RateLimitedResponse, ReplayCompletedResponse, ReplayResponse,
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Requeue API",
        version = "0.1.0",
        description = "HTTP API for replaying dead-letter items of the task execution platform.",
        license(name = "Apache-2.0")
    ),
    paths(
        super::health::health,
        super::replay::replay,
        super::runs::get_replay_run,
    ),
    components(schemas(
        DlqItem,
        ItemOutcome,
        ItemStatus,
        PreviewItem,
        ReplayRequest,
        ReplayRun,
        RunStatus,
        RunSummary,
        HealthResponse,
        ErrorResponse,
        RateLimitedResponse,
        NoItemsResponse,
        DryRunResponse,
        IdempotentResponse,
        ReplayCompletedResponse,
        ReplayResponse,
    )),
    tags(
        (name = "Health", description = "Liveness"),
        (name = "Replay", description = "DLQ replay runs")
    )
)]
pub struct ApiDoc;

/// `GET /api-doc/openapi.json` -- the OpenAPI document.
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
