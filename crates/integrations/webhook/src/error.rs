use thiserror::Error;

/// Why a replay notification was not delivered.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// The request never completed (DNS, connect, TLS, timeout).
    #[error("webhook request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The receiver answered with a non-2xx status.
    #[error("webhook receiver answered {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("failed to encode notification: {0}")]
    Encoding(#[from] serde_json::Error),

    /// The configured signing secret cannot key an HMAC.
    #[error("invalid signing secret: {0}")]
    InvalidSecret(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_carries_status_and_body() {
        let err = WebhookError::Rejected {
            status: 503,
            body: "unavailable".into(),
        };
        assert_eq!(err.to_string(), "webhook receiver answered 503: unavailable");
    }
}
