use async_trait::async_trait;
use hmac::{Hmac, Mac};
use reqwest::Client;
use sha2::Sha256;
use tracing::{debug, instrument};

use crate::config::WebhookConfig;
use crate::error::WebhookError;
use crate::notifier::{Notifier, ReplayNotification};

type HmacSha256 = Hmac<Sha256>;

/// Posts replay summaries as JSON to an HTTP endpoint.
pub struct WebhookNotifier {
    config: WebhookConfig,
    client: Client,
}

impl WebhookNotifier {
    /// Build a notifier with a client using the configured timeout.
    pub fn new(config: WebhookConfig) -> Result<Self, WebhookError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }

    /// Create a notifier with a custom HTTP client.
    pub fn with_client(config: WebhookConfig, client: Client) -> Self {
        Self { config, client }
    }

    /// Hex HMAC-SHA256 of `body` under `secret`.
    pub fn compute_hmac(secret: &str, body: &[u8]) -> Result<String, WebhookError> {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|e| WebhookError::InvalidSecret(e.to_string()))?;
        mac.update(body);
        Ok(hex::encode(mac.finalize().into_bytes()))
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    #[instrument(skip(self, notification), fields(replay_run_id = %notification.replay_run_id))]
    async fn notify(&self, notification: &ReplayNotification) -> Result<(), WebhookError> {
        let body = serde_json::to_vec(notification)?;

        let mut request = self
            .client
            .post(&self.config.url)
            .header("Content-Type", "application/json");

        if let Some(secret) = &self.config.signing_secret {
            let signature = Self::compute_hmac(secret, &body)?;
            request = request.header(
                self.config.signature_header.as_str(),
                format!("sha256={signature}"),
            );
        }

        debug!(url = %self.config.url, "sending replay notification");
        let response = request.body(body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(WebhookError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use requeue_core::RunSummary;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    use super::*;

    /// Read one full HTTP/1.1 request (headers plus `Content-Length` body).
    async fn read_request(stream: &mut tokio::net::TcpStream) -> Vec<u8> {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = stream.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                let head = String::from_utf8_lossy(&buf[..end]).to_ascii_lowercase();
                let body_len = head
                    .lines()
                    .find_map(|l| l.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= end + 4 + body_len {
                    break;
                }
            }
        }
        buf
    }

    /// A minimal mock HTTP server built on tokio that returns canned responses.
    struct MockWebhookServer {
        listener: tokio::net::TcpListener,
        url: String,
    }

    impl MockWebhookServer {
        async fn start() -> Self {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                .await
                .expect("failed to bind mock server");
            let port = listener.local_addr().unwrap().port();
            Self {
                listener,
                url: format!("http://127.0.0.1:{port}/hook"),
            }
        }

        /// Accept one connection, answer with `status_code`, return the raw request.
        async fn respond_once(self, status_code: u16) -> String {
            let (mut stream, _) = self.listener.accept().await.unwrap();
            let buf = read_request(&mut stream).await;

            let response = format!(
                "HTTP/1.1 {status_code} OK\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.shutdown().await.unwrap();
            String::from_utf8(buf).unwrap()
        }
    }

    fn notification() -> ReplayNotification {
        ReplayNotification::new(
            "run-1",
            "signature-authenticated",
            "c1",
            RunSummary {
                total_processed: 2,
                successful: 2,
                failed: 0,
            },
            false,
        )
    }

    #[test]
    fn hmac_matches_known_vector() {
        // RFC 4231 test case 2.
        let sig = WebhookNotifier::compute_hmac("Jefe", b"what do ya want for nothing?").unwrap();
        assert_eq!(
            sig,
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[tokio::test]
    async fn posts_signed_json() {
        let server = MockWebhookServer::start().await;
        let notifier =
            WebhookNotifier::new(WebhookConfig::new(&server.url).with_signing_secret("s3cret"))
                .unwrap();
        let handle = tokio::spawn(server.respond_once(200));

        notifier.notify(&notification()).await.unwrap();
        let raw = handle.await.unwrap();

        let body = serde_json::to_vec(&notification()).unwrap();
        let expected = WebhookNotifier::compute_hmac("s3cret", &body).unwrap();
        assert!(raw.to_ascii_lowercase().contains("x-requeue-signature: sha256="));
        assert!(raw.contains(&expected));
        assert!(raw.contains("\"replay_run_id\":\"run-1\""));
    }

    #[tokio::test]
    async fn unsigned_without_secret() {
        let server = MockWebhookServer::start().await;
        let notifier = WebhookNotifier::new(WebhookConfig::new(&server.url)).unwrap();
        let handle = tokio::spawn(server.respond_once(204));

        notifier.notify(&notification()).await.unwrap();
        let raw = handle.await.unwrap();
        assert!(!raw.to_ascii_lowercase().contains("x-requeue-signature"));
    }

    #[tokio::test]
    async fn non_success_status_is_error() {
        let server = MockWebhookServer::start().await;
        let notifier = WebhookNotifier::new(WebhookConfig::new(&server.url)).unwrap();
        let handle = tokio::spawn(server.respond_once(500));

        let err = notifier.notify(&notification()).await.unwrap_err();
        handle.await.unwrap();
        assert!(matches!(err, WebhookError::Rejected { status: 500, .. }));
    }
}
