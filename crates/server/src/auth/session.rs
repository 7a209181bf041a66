use std::sync::Arc;

use async_trait::async_trait;
use axum::http::header::AUTHORIZATION;

use requeue_store::ReplayStore;

use super::{AuthError, AuthRequest, AuthVerdict, Authenticator};

/// Resolves a bearer token to a user id.
///
/// Returns `Ok(None)` for tokens that are invalid or expired.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn resolve(&self, token: &str) -> Result<Option<String>, AuthError>;
}

/// Grants access to sessions whose user is a super admin, or an admin of
/// the tenant the request is scoped to.
pub struct SessionAuthenticator {
    resolver: Arc<dyn IdentityResolver>,
    store: Arc<dyn ReplayStore>,
}

impl SessionAuthenticator {
    pub fn new(resolver: Arc<dyn IdentityResolver>, store: Arc<dyn ReplayStore>) -> Self {
        Self { resolver, store }
    }
}

#[async_trait]
impl Authenticator for SessionAuthenticator {
    fn name(&self) -> &'static str {
        "session"
    }

    async fn authenticate(&self, request: &AuthRequest<'_>) -> Result<AuthVerdict, AuthError> {
        let Some(token) = request
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
        else {
            return Ok(AuthVerdict::Denied("missing bearer token".into()));
        };

        let Some(user_id) = self.resolver.resolve(token).await? else {
            return Ok(AuthVerdict::Denied("invalid session".into()));
        };

        if self.store.is_super_admin(&user_id).await? {
            return Ok(AuthVerdict::Granted(format!("super_admin:{user_id}")));
        }

        if let Some(company_id) = request.tenant_scope
            && self.store.is_company_admin(&user_id, company_id).await?
        {
            return Ok(AuthVerdict::Granted(format!("company_admin:{user_id}")));
        }

        Ok(AuthVerdict::Denied(format!(
            "user {user_id} lacks an elevated role for this scope"
        )))
    }
}
