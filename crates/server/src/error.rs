use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use requeue_gateway::GatewayError;

/// Errors that can occur when running the Requeue server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// A configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// An I/O error (e.g. binding the listener).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// No valid signature and no sufficiently privileged session.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Rate limit exceeded.
    #[error("rate limit exceeded")]
    RateLimited {
        /// Seconds until the caller can retry.
        retry_after: u64,
    },

    /// Selection or persistence failed.
    #[error("store error: {0}")]
    Store(String),

    /// The selected batch exceeds the payload ceiling.
    #[error("{0}")]
    PayloadTooLarge(String),

    /// The request body could not be parsed.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// A run with the same idempotency pair is still executing.
    #[error("{0}")]
    Conflict(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<GatewayError> for ServerError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Store(e) => Self::Store(e.to_string()),
            e @ GatewayError::PayloadTooLarge { .. } => Self::PayloadTooLarge(e.to_string()),
            e @ GatewayError::InProgress { .. } => Self::Conflict(e.to_string()),
            e @ (GatewayError::Serialization(_) | GatewayError::Configuration(_)) => {
                Self::Internal(e.to_string())
            }
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, retry_after) = match &self {
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, None),
            Self::RateLimited { retry_after } => (StatusCode::TOO_MANY_REQUESTS, Some(*retry_after)),
            Self::PayloadTooLarge(_) => (StatusCode::PAYLOAD_TOO_LARGE, None),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, None),
            Self::Conflict(_) => (StatusCode::CONFLICT, None),
            Self::NotFound(_) => (StatusCode::NOT_FOUND, None),
            Self::Config(_) | Self::Io(_) | Self::Store(_) | Self::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, None)
            }
        };
        let message = self.to_string();

        let body = if let Some(retry) = retry_after {
            serde_json::json!({ "error": message, "retry_after": retry })
        } else {
            serde_json::json!({ "error": message })
        };

        let mut response = (status, axum::Json(body)).into_response();

        if let Some(retry) = retry_after {
            response
                .headers_mut()
                .insert(axum::http::header::RETRY_AFTER, retry.into());
        }

        response
    }
}

#[cfg(test)]
mod tests {
    use requeue_store::StoreError;

    use super::*;

    #[test]
    fn gateway_errors_map_to_status_codes() {
        let cases = [
            (
                ServerError::from(GatewayError::Store(StoreError::Connection("down".into()))),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                ServerError::from(GatewayError::PayloadTooLarge { size: 3, limit: 2 }),
                StatusCode::PAYLOAD_TOO_LARGE,
            ),
            (
                ServerError::from(GatewayError::InProgress { run_id: "r".into() }),
                StatusCode::CONFLICT,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[test]
    fn rate_limited_sets_retry_after_header() {
        let response = ServerError::RateLimited { retry_after: 42 }.into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            response.headers().get(axum::http::header::RETRY_AFTER).unwrap(),
            "42"
        );
    }
}
