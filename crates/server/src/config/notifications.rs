use serde::Deserialize;

use requeue_webhook::WebhookConfig;

/// `[notifications]` section. Notifications are disabled without a URL.
#[derive(Deserialize)]
pub struct NotificationConfig {
    pub webhook_url: Option<String>,
    /// Signs the notification body with HMAC-SHA256 when set.
    pub signing_secret: Option<String>,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            signing_secret: None,
            timeout_seconds: default_timeout(),
        }
    }
}

impl std::fmt::Debug for NotificationConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationConfig")
            .field("webhook_url", &self.webhook_url)
            .field("signing_secret", &self.signing_secret.as_ref().map(|_| "[REDACTED]"))
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

impl NotificationConfig {
    pub fn webhook_config(&self) -> Option<WebhookConfig> {
        let url = self.webhook_url.as_ref()?;
        let mut config = WebhookConfig::new(url).with_timeout_secs(self.timeout_seconds);
        if let Some(secret) = &self.signing_secret {
            config = config.with_signing_secret(secret);
        }
        Some(config)
    }
}

fn default_timeout() -> u64 {
    10
}
