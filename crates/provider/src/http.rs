use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::engine::{DispatchReceipt, RetryDispatch, TaskEngine};
use crate::error::ProviderError;

/// Connection settings for [`HttpTaskEngine`].
#[derive(Debug, Clone)]
pub struct HttpTaskEngineConfig {
    /// Endpoint receiving retry dispatches (POST, JSON body).
    pub url: String,
    /// Sent as a bearer token when set.
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl HttpTaskEngineConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            api_key: None,
            timeout: Duration::from_secs(30),
        }
    }

    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Body the engine answers with. Every field is optional; a 2xx with no body
/// counts as acceptance.
#[derive(Debug, Default, Deserialize)]
struct EngineReply {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    execution_id: Option<String>,
}

/// [`TaskEngine`] that POSTs retry dispatches to an HTTP endpoint.
pub struct HttpTaskEngine {
    config: HttpTaskEngineConfig,
    client: Client,
}

impl HttpTaskEngine {
    /// Build an engine client with the configured timeout.
    pub fn new(config: HttpTaskEngineConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ProviderError::Configuration(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { config, client })
    }

    /// Create an engine client with a custom HTTP client.
    pub fn with_client(config: HttpTaskEngineConfig, client: Client) -> Self {
        Self { config, client }
    }

    fn map_transport(&self, e: &reqwest::Error) -> ProviderError {
        if e.is_timeout() {
            warn!("engine request timed out");
            ProviderError::Timeout(self.config.timeout)
        } else {
            ProviderError::Connection(e.to_string())
        }
    }
}

#[async_trait]
impl TaskEngine for HttpTaskEngine {
    #[instrument(skip(self, request), fields(dlq_id = %request.dlq_id, task_id = %request.task_id))]
    async fn dispatch(&self, request: &RetryDispatch) -> Result<DispatchReceipt, ProviderError> {
        debug!(url = %self.config.url, "dispatching retry to engine");

        let mut builder = self.client.post(&self.config.url).json(request);
        if let Some(key) = &self.config.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(|e| self.map_transport(&e))?;
        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| self.map_transport(&e))?;

        let reply: EngineReply = if text.trim().is_empty() {
            EngineReply::default()
        } else {
            serde_json::from_str(&text).unwrap_or_default()
        };

        // Any status the engine actually answered with is its verdict.
        if !(200..300).contains(&status) {
            let message = reply.error.unwrap_or_else(|| format!("HTTP {status}: {text}"));
            return Err(ProviderError::Rejected(message));
        }
        if reply.success == Some(false) {
            return Err(ProviderError::Rejected(
                reply.error.unwrap_or_else(|| "engine reported failure".to_owned()),
            ));
        }

        Ok(DispatchReceipt {
            execution_id: reply.execution_id,
        })
    }
}
