use axum::Json;
use axum::extract::{Path, State};
use axum::http::HeaderMap;

use requeue_core::{ReplayRun, TENANT_SCOPE_ALL};

use super::schemas::ErrorResponse;
use super::{AppState, authorize};
use crate::error::ServerError;

/// `GET /v1/replay-runs/{id}` -- inspect a stored run.
///
/// Authorization is scoped by the run's tenant, so company admins can only
/// read their own tenant's runs. Signatures cover the empty body.
#[utoipa::path(
    get,
    path = "/v1/replay-runs/{id}",
    tag = "Replay",
    summary = "Get replay run",
    params(
        ("id" = String, Path, description = "Replay run id")
    ),
    responses(
        (status = 200, description = "Stored run", body = ReplayRun),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Run not found", body = ErrorResponse),
        (status = 500, description = "Store failure", body = ErrorResponse)
    )
)]
pub async fn get_replay_run(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<ReplayRun>, ServerError> {
    let run = state.gateway.get_run(&id).await?;
    let scope = run
        .as_ref()
        .map(|r| r.tenant_scope.as_str())
        .filter(|s| *s != TENANT_SCOPE_ALL);

    authorize(&state, &headers, &[], scope).await?;

    run.map(Json)
        .ok_or_else(|| ServerError::NotFound(format!("replay run {id}")))
}
