use std::time::Duration;

use thiserror::Error;

/// Errors returned by a [`TaskEngine`](crate::TaskEngine).
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The engine answered and reported failure, with its error text.
    #[error("rejected by engine: {0}")]
    Rejected(String),

    /// The engine did not respond within the allowed duration.
    #[error("timeout after {0:?}")]
    Timeout(Duration),

    /// The request never reached the engine or the reply was lost.
    #[error("connection error: {0}")]
    Connection(String),

    /// The engine client was given invalid configuration.
    #[error("invalid configuration: {0}")]
    Configuration(String),
}
