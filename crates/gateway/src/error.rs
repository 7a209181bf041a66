use thiserror::Error;

/// Terminal errors of a replay run.
///
/// Per-item failures never surface here; they are reported as item outcomes.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Selection or persistence failed.
    #[error("store error: {0}")]
    Store(#[from] requeue_store::StoreError),

    /// The selected batch serializes to more than the configured ceiling.
    #[error("selected items serialize to {size} bytes, exceeding the {limit} byte limit")]
    PayloadTooLarge { size: usize, limit: usize },

    /// A run with the same idempotency pair has not finished yet.
    #[error("replay run {run_id} with this idempotency key is still in progress")]
    InProgress { run_id: String },

    #[error("serialization error: {0}")]
    Serialization(String),

    /// The gateway was misconfigured (e.g. missing required components).
    #[error("configuration error: {0}")]
    Configuration(String),
}
