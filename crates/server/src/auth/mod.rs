//! Credential validation for the replay endpoints.
//!
//! Two independent proofs are accepted, tried in order: an HMAC-SHA256
//! signature of the raw body ([`SignatureAuthenticator`]) and a bearer
//! session token resolved to a user with an elevated role
//! ([`SessionAuthenticator`]). Acceptance by either is sufficient.

pub mod error;
pub mod jwt;
pub mod session;
pub mod signature;

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::HeaderMap;
use tracing::{debug, warn};

use requeue_store::ReplayStore;

pub use self::error::AuthError;
pub use self::jwt::{JwtClaims, JwtIdentityResolver};
pub use self::session::{IdentityResolver, SessionAuthenticator};
pub use self::signature::{SIGNATURE_ACTOR, SignatureAuthenticator};

use crate::config::AuthConfig;

/// What an authenticator sees of an inbound request.
#[derive(Debug, Clone, Copy)]
pub struct AuthRequest<'a> {
    pub headers: &'a HeaderMap,
    /// Raw, unparsed request body.
    pub body: &'a [u8],
    /// Tenant the request is scoped to, if any.
    pub tenant_scope: Option<&'a str>,
}

/// Outcome of a credential check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthVerdict {
    /// Access granted; carries the actor string recorded on the run.
    Granted(String),
    /// Access refused; carries the reason for logs.
    Denied(String),
}

impl AuthVerdict {
    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted(_))
    }
}

/// One proof mechanism.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    async fn authenticate(&self, request: &AuthRequest<'_>) -> Result<AuthVerdict, AuthError>;
}

/// Tries each configured [`Authenticator`] in order and grants on the first
/// acceptance. Authenticator errors are logged and count as a refusal.
pub struct CredentialValidator {
    authenticators: Vec<Arc<dyn Authenticator>>,
}

impl CredentialValidator {
    pub fn new(authenticators: Vec<Arc<dyn Authenticator>>) -> Self {
        Self { authenticators }
    }

    /// Build the validator from `[auth]`: the signature path when an HMAC
    /// secret is set, then the session path when a JWT secret is set.
    pub fn from_config(config: &AuthConfig, store: Arc<dyn ReplayStore>) -> Result<Self, AuthError> {
        let mut authenticators: Vec<Arc<dyn Authenticator>> = Vec::new();
        if let Some(secret) = &config.hmac_secret {
            authenticators.push(Arc::new(SignatureAuthenticator::new(
                secret,
                &config.signature_header,
            )?));
        }
        if let Some(secret) = &config.jwt_secret {
            let resolver = Arc::new(JwtIdentityResolver::new(secret));
            authenticators.push(Arc::new(SessionAuthenticator::new(resolver, store)));
        }
        if authenticators.is_empty() {
            return Err(AuthError::Configuration(
                "no authentication mechanism configured".into(),
            ));
        }
        Ok(Self::new(authenticators))
    }

    pub async fn validate(&self, request: &AuthRequest<'_>) -> AuthVerdict {
        let mut reasons = Vec::with_capacity(self.authenticators.len());
        for authenticator in &self.authenticators {
            match authenticator.authenticate(request).await {
                Ok(AuthVerdict::Granted(actor)) => {
                    debug!(mechanism = authenticator.name(), actor = %actor, "caller authenticated");
                    return AuthVerdict::Granted(actor);
                }
                Ok(AuthVerdict::Denied(reason)) => {
                    reasons.push(format!("{}: {reason}", authenticator.name()));
                }
                Err(e) => {
                    warn!(mechanism = authenticator.name(), error = %e, "authenticator failed");
                    reasons.push(format!("{}: {e}", authenticator.name()));
                }
            }
        }
        AuthVerdict::Denied(reasons.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use requeue_store_memory::MemoryReplayStore;

    use super::*;

    struct Fixed(Result<AuthVerdict, ()>);

    #[async_trait]
    impl Authenticator for Fixed {
        fn name(&self) -> &'static str {
            "fixed"
        }

        async fn authenticate(&self, _: &AuthRequest<'_>) -> Result<AuthVerdict, AuthError> {
            self.0
                .clone()
                .map_err(|()| AuthError::Configuration("boom".into()))
        }
    }

    fn request(headers: &HeaderMap) -> AuthRequest<'_> {
        AuthRequest {
            headers,
            body: b"{}",
            tenant_scope: None,
        }
    }

    #[tokio::test]
    async fn first_grant_wins() {
        let validator = CredentialValidator::new(vec![
            Arc::new(Fixed(Ok(AuthVerdict::Denied("nope".into())))),
            Arc::new(Fixed(Ok(AuthVerdict::Granted("a".into())))),
            Arc::new(Fixed(Ok(AuthVerdict::Granted("b".into())))),
        ]);
        let headers = HeaderMap::new();
        assert_eq!(
            validator.validate(&request(&headers)).await,
            AuthVerdict::Granted("a".into())
        );
    }

    #[tokio::test]
    async fn errors_count_as_refusal() {
        let validator = CredentialValidator::new(vec![Arc::new(Fixed(Err(())))]);
        let headers = HeaderMap::new();
        let verdict = validator.validate(&request(&headers)).await;
        assert!(!verdict.is_granted());
    }

    #[test]
    fn config_without_secrets_is_rejected() {
        let result = CredentialValidator::from_config(
            &AuthConfig::default(),
            Arc::new(MemoryReplayStore::new()),
        );
        assert!(matches!(result, Err(AuthError::Configuration(_))));
    }
}
