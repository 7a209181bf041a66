use std::time::Duration;

/// Header carrying the hex HMAC-SHA256 signature of the body.
pub const DEFAULT_SIGNATURE_HEADER: &str = "X-Requeue-Signature";

/// Configuration for a [`WebhookNotifier`](crate::WebhookNotifier).
#[derive(Clone)]
pub struct WebhookConfig {
    /// Endpoint receiving the POSTed notification.
    pub url: String,
    /// When set, the body is signed and the signature sent in
    /// `signature_header` as `sha256=<hex>`.
    pub signing_secret: Option<String>,
    pub signature_header: String,
    pub timeout: Duration,
}

impl std::fmt::Debug for WebhookConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookConfig")
            .field("url", &self.url)
            .field(
                "signing_secret",
                &self.signing_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .field("signature_header", &self.signature_header)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl WebhookConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            signing_secret: None,
            signature_header: DEFAULT_SIGNATURE_HEADER.to_owned(),
            timeout: Duration::from_secs(10),
        }
    }

    #[must_use]
    pub fn with_signing_secret(mut self, secret: impl Into<String>) -> Self {
        self.signing_secret = Some(secret.into());
        self
    }

    #[must_use]
    pub fn with_signature_header(mut self, header: impl Into<String>) -> Self {
        self.signature_header = header.into();
        self
    }

    #[must_use]
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = WebhookConfig::new("https://hooks.example.com");
        assert_eq!(cfg.signature_header, DEFAULT_SIGNATURE_HEADER);
        assert_eq!(cfg.timeout, Duration::from_secs(10));
        assert!(cfg.signing_secret.is_none());
    }

    #[test]
    fn debug_redacts_secret() {
        let cfg = WebhookConfig::new("https://hooks.example.com").with_signing_secret("hunter2");
        let debug = format!("{cfg:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("[REDACTED]"));
    }
}
