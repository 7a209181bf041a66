pub mod config;
pub mod limiter;

pub use config::{RateLimitConfig, RateLimitErrorBehavior};
pub use limiter::{RateLimitExceeded, RateLimitResult, RateLimiter, UNKNOWN_ORIGIN, network_origin};
