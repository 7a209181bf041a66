use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use sha2::{Digest, Sha256};
use tracing::instrument;

use requeue_core::{ReplayRequest, TENANT_SCOPE_ALL};
use requeue_gateway::ReplayCommand;

use super::schemas::{ErrorResponse, RateLimitedResponse, ReplayResponse};
use super::{AppState, authorize};
use crate::error::ServerError;
use crate::ratelimit::network_origin;

/// `POST /v1/replay` -- replay eligible DLQ items.
///
/// Order of checks: credentials, rate limit, body parsing, then the replay
/// itself. A rejected caller touches no counters and no run records.
#[utoipa::path(
    post,
    path = "/v1/replay",
    tag = "Replay",
    summary = "Replay DLQ items",
    description = "Re-dispatches eligible dead-letter items to the execution engine with backoff and a failure-rate circuit breaker. Authenticate with an HMAC signature of the raw body or an admin bearer session.",
    request_body(content = ReplayRequest, description = "Selection filters and replay options"),
    responses(
        (status = 200, description = "Replay completed, dry run, idempotent replay, or no eligible items", body = ReplayResponse),
        (status = 400, description = "Malformed request body", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 409, description = "A run with this idempotency key is still in progress", body = ErrorResponse),
        (status = 413, description = "Selected items exceed the payload ceiling", body = ErrorResponse),
        (status = 429, description = "Rate limit exceeded", body = RateLimitedResponse),
        (status = 500, description = "Store failure", body = ErrorResponse)
    )
)]
#[instrument(skip_all)]
pub async fn replay(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ReplayResponse>, ServerError> {
    let company_id = company_id_hint(&body);

    let actor = authorize(&state, &headers, &body, company_id.as_deref()).await?;

    let origin = network_origin(&headers);
    let tenant = company_id.as_deref().unwrap_or(TENANT_SCOPE_ALL);
    state
        .rate_limiter
        .check(tenant, &origin)
        .await
        .map_err(|e| ServerError::RateLimited {
            retry_after: e.retry_after,
        })?;

    let request = parse_request(&body)?;
    let payload_hash = hex::encode(Sha256::digest(&body));

    let outcome = state
        .gateway
        .replay(ReplayCommand {
            request,
            actor,
            payload_hash,
        })
        .await?;

    Ok(Json(ReplayResponse::from(outcome)))
}

/// Tenant named in the body, read leniently so that scoping works before
/// the body is validated.
fn company_id_hint(body: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(body).ok()?;
    value
        .get("company_id")?
        .as_str()
        .filter(|c| !c.is_empty())
        .map(str::to_owned)
}

fn parse_request(body: &[u8]) -> Result<ReplayRequest, ServerError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(ReplayRequest::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| ServerError::BadRequest(format!("invalid replay request: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn company_hint_reads_string_field_only() {
        assert_eq!(
            company_id_hint(br#"{"company_id":"c1","max":"oops"}"#).as_deref(),
            Some("c1")
        );
        assert_eq!(company_id_hint(br#"{"company_id":""}"#), None);
        assert_eq!(company_id_hint(br#"{"company_id":7}"#), None);
        assert_eq!(company_id_hint(b"not json"), None);
    }

    #[test]
    fn empty_body_is_default_request() {
        let req = parse_request(b"  ").unwrap();
        assert_eq!(req, ReplayRequest::default());
        assert!(matches!(
            parse_request(b"{\"force\":\"yes\"}"),
            Err(ServerError::BadRequest(_))
        ));
    }
}
