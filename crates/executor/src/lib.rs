pub mod breaker;
pub mod config;
pub mod executor;
pub mod retry;

pub use breaker::BreakerTally;
pub use config::ExecutorConfig;
pub use executor::{BatchReport, RetryExecutor};
pub use retry::{BackoffPolicy, DEFAULT_BACKOFF_CAP_MINUTES, backoff_minutes};
