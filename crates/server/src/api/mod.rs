pub mod health;
pub mod openapi;
pub mod replay;
pub mod runs;
pub mod schemas;

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::HeaderMap;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;
use tracing::warn;

use requeue_gateway::ReplayGateway;

use crate::auth::{AuthRequest, AuthVerdict, CredentialValidator};
use crate::error::ServerError;
use crate::ratelimit::RateLimiter;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<ReplayGateway>,
    pub validator: Arc<CredentialValidator>,
    pub rate_limiter: Arc<RateLimiter>,
    /// Bodies above this size are rejected before reaching a handler.
    pub max_body_bytes: usize,
}

/// Build the axum router with all API routes.
pub fn router(state: AppState) -> Router {
    let max_body_bytes = state.max_body_bytes;

    Router::new()
        .route("/health", get(health::health))
        .route("/api-doc/openapi.json", get(openapi::openapi_json))
        .route("/v1/replay", post(replay::replay))
        .route("/v1/replay-runs/{id}", get(runs::get_replay_run))
        .with_state(state)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TraceLayer::new_for_http())
}

/// Run the credential validator and return the actor, or 401.
pub(crate) async fn authorize(
    state: &AppState,
    headers: &HeaderMap,
    body: &[u8],
    tenant_scope: Option<&str>,
) -> Result<String, ServerError> {
    let request = AuthRequest {
        headers,
        body,
        tenant_scope,
    };
    match state.validator.validate(&request).await {
        AuthVerdict::Granted(actor) => Ok(actor),
        AuthVerdict::Denied(reason) => {
            warn!(reason = %reason, "unauthorized replay request");
            Err(ServerError::Unauthorized(
                "a valid signature or an admin session is required".into(),
            ))
        }
    }
}
