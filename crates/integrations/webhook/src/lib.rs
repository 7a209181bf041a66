//! Replay summary notifications for Requeue.
//!
//! The gateway talks to a [`Notifier`]; [`WebhookNotifier`] is the shipped
//! implementation and POSTs a JSON [`ReplayNotification`] to a configured
//! URL, optionally signed with HMAC-SHA256.
//!
//! ```rust,no_run
//! use requeue_webhook::{WebhookConfig, WebhookNotifier};
//!
//! let config = WebhookConfig::new("https://hooks.example.com/requeue")
//!     .with_signing_secret("s3cret")
//!     .with_timeout_secs(5);
//! let notifier = WebhookNotifier::new(config).unwrap();
//! ```

pub mod config;
pub mod error;
pub mod notifier;
pub mod webhook;

pub use config::{DEFAULT_SIGNATURE_HEADER, WebhookConfig};
pub use error::WebhookError;
pub use notifier::{Notifier, ReplayNotification};
pub use webhook::WebhookNotifier;
