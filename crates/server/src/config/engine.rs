use std::time::Duration;

use serde::Deserialize;

use requeue_provider::HttpTaskEngineConfig;

/// Execution engine endpoint.
#[derive(Deserialize)]
pub struct EngineConfig {
    /// URL receiving retry dispatches.
    pub url: Option<String>,
    /// Bearer token sent with each dispatch.
    pub api_key: Option<String>,
    #[serde(default = "default_engine_timeout")]
    pub timeout_seconds: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            url: None,
            api_key: None,
            timeout_seconds: default_engine_timeout(),
        }
    }
}

impl std::fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineConfig")
            .field("url", &self.url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

impl EngineConfig {
    /// Client settings, or `None` when no URL is configured.
    pub fn to_http_config(&self) -> Option<HttpTaskEngineConfig> {
        let url = self.url.as_ref()?;
        let mut config = HttpTaskEngineConfig::new(url)
            .with_timeout(Duration::from_secs(self.timeout_seconds));
        if let Some(key) = &self.api_key {
            config = config.with_api_key(key);
        }
        Some(config)
    }
}

fn default_engine_timeout() -> u64 {
    30
}
