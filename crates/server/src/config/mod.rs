mod auth;
mod engine;
mod notifications;
mod replay;
mod server;
mod store;
mod telemetry;


pub use auth::*;
pub use engine::*;
pub use notifications::*;
pub use replay::*;
pub use server::*;
pub use store::*;
pub use telemetry::*;

use std::path::Path;

use serde::Deserialize;

use crate::error::ServerError;
use crate::ratelimit::RateLimitConfig;

/// Environment variables that override values from the TOML file.
pub const ENV_STORE_URL: &str = "REQUEUE_STORE_URL";
pub const ENV_ENGINE_URL: &str = "REQUEUE_ENGINE_URL";
pub const ENV_ENGINE_KEY: &str = "REQUEUE_ENGINE_KEY";
pub const ENV_HMAC_SECRET: &str = "REQUEUE_HMAC_SECRET";
pub const ENV_JWT_SECRET: &str = "REQUEUE_JWT_SECRET";
pub const ENV_NOTIFY_WEBHOOK_URL: &str = "REQUEUE_NOTIFY_WEBHOOK_URL";

/// Top-level configuration for the Requeue server, loaded from a TOML file.
#[derive(Debug, Default, Deserialize)]
pub struct RequeueConfig {
    /// HTTP server bind configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Replay store backend configuration.
    #[serde(default)]
    pub store: StoreConfig,
    /// Execution engine receiving retry dispatches.
    #[serde(default)]
    pub engine: EngineConfig,
    /// Credential validation configuration.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Per tenant and origin rate limiting.
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    /// Selection limits, safety rails, backoff and breaker settings.
    #[serde(default)]
    pub replay: ReplaySettings,
    /// Outbound replay summaries.
    #[serde(default)]
    pub notifications: NotificationConfig,
    /// Log output configuration.
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl RequeueConfig {
    /// Parse a configuration document.
    pub fn from_toml(contents: &str) -> Result<Self, ServerError> {
        toml::from_str(contents).map_err(|e| ServerError::Config(format!("invalid config: {e}")))
    }

    /// Load the configuration file at `path`, or defaults if it does not exist.
    pub fn load(path: &Path) -> Result<Self, ServerError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Apply the `REQUEUE_*` environment overrides.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    /// Apply overrides from an arbitrary variable lookup. Empty values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(url) = get(ENV_STORE_URL) {
            self.store.url = Some(url);
        }
        if let Some(url) = get(ENV_ENGINE_URL) {
            self.engine.url = Some(url);
        }
        if let Some(key) = get(ENV_ENGINE_KEY) {
            self.engine.api_key = Some(key);
        }
        if let Some(secret) = get(ENV_HMAC_SECRET) {
            self.auth.hmac_secret = Some(secret);
        }
        if let Some(secret) = get(ENV_JWT_SECRET) {
            self.auth.jwt_secret = Some(secret);
        }
        if let Some(url) = get(ENV_NOTIFY_WEBHOOK_URL) {
            self.notifications.webhook_url = Some(url);
        }
    }

    /// Reject configurations the server cannot run with.
    pub fn validate(&self) -> Result<(), ServerError> {
        if self.auth.hmac_secret.is_none() && self.auth.jwt_secret.is_none() {
            return Err(ServerError::Config(
                "at least one of auth.hmac_secret or auth.jwt_secret must be set".into(),
            ));
        }
        self.store.validate()?;
        if self.engine.url.is_none() {
            return Err(ServerError::Config(format!(
                "engine.url is required (or set {ENV_ENGINE_URL})"
            )));
        }
        self.replay.validate()?;
        self.rate_limit
            .validate()
            .map_err(ServerError::Config)?;
        Ok(())
    }
}
