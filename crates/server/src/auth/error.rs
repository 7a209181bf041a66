use thiserror::Error;

/// Errors raised while checking credentials.
///
/// A refusal is not an error; it is reported as
/// [`AuthVerdict::Denied`](super::AuthVerdict::Denied).
#[derive(Debug, Error)]
pub enum AuthError {
    /// Role or membership lookup failed.
    #[error("store error: {0}")]
    Store(#[from] requeue_store::StoreError),

    #[error("configuration error: {0}")]
    Configuration(String),
}
