use serde::{Deserialize, Serialize};

/// Behavior when the store backing the rate limiter is unreachable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RateLimitErrorBehavior {
    /// Fail open: let the request through.
    #[default]
    Allow,
    /// Fail closed: reject with a fixed retry-after.
    Deny,
}

/// `[rate_limit]` section.
///
/// # Example
///
/// ```toml
/// [rate_limit]
/// enabled = true
/// max_requests = 3
/// window_seconds = 300
/// on_error = "allow"
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Requests allowed per key within one window.
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,
    /// Window length in seconds.
    #[serde(default = "default_window_seconds")]
    pub window_seconds: u64,
    #[serde(default)]
    pub on_error: RateLimitErrorBehavior,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            max_requests: default_max_requests(),
            window_seconds: default_window_seconds(),
            on_error: RateLimitErrorBehavior::default(),
        }
    }
}

impl RateLimitConfig {
    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.enabled && self.max_requests == 0 {
            return Err("rate_limit.max_requests must be positive".to_owned());
        }
        if self.enabled && self.window_seconds == 0 {
            return Err("rate_limit.window_seconds must be positive".to_owned());
        }
        Ok(())
    }
}

fn default_enabled() -> bool {
    true
}

fn default_max_requests() -> u32 {
    3
}

fn default_window_seconds() -> u64 {
    300
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_three_per_five_minutes() {
        let config: RateLimitConfig = toml::from_str("").unwrap();
        assert!(config.enabled);
        assert_eq!(config.max_requests, 3);
        assert_eq!(config.window_seconds, 300);
        assert_eq!(config.on_error, RateLimitErrorBehavior::Allow);
    }

    #[test]
    fn deny_on_error_parses() {
        let config: RateLimitConfig = toml::from_str(r#"on_error = "deny""#).unwrap();
        assert_eq!(config.on_error, RateLimitErrorBehavior::Deny);
    }

    #[test]
    fn zero_window_is_rejected_when_enabled() {
        let config = RateLimitConfig {
            window_seconds: 0,
            ..RateLimitConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
