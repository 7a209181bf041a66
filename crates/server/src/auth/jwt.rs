use async_trait::async_trait;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::AuthError;
use super::session::IdentityResolver;

/// Claims read from session tokens.
#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject (user id).
    pub sub: String,
    /// Expiry (seconds since epoch).
    pub exp: usize,
}

/// [`IdentityResolver`] validating HS256 tokens issued by the identity
/// service. The `sub` claim is the user id.
pub struct JwtIdentityResolver {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtIdentityResolver {
    pub fn new(secret: &str) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }
}

#[async_trait]
impl IdentityResolver for JwtIdentityResolver {
    async fn resolve(&self, token: &str) -> Result<Option<String>, AuthError> {
        match decode::<JwtClaims>(token, &self.decoding_key, &self.validation) {
            Ok(data) if !data.claims.sub.is_empty() => Ok(Some(data.claims.sub)),
            Ok(_) => Ok(None),
            Err(e) => {
                debug!(error = %e, "rejected session token");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use jsonwebtoken::{EncodingKey, Header, encode};

    use super::*;

    fn token(secret: &str, sub: &str, exp_offset: i64) -> String {
        let now = i64::try_from(jsonwebtoken::get_current_timestamp()).unwrap();
        let claims = JwtClaims {
            sub: sub.to_owned(),
            exp: usize::try_from(now + exp_offset).unwrap(),
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn valid_token_resolves_subject() {
        let resolver = JwtIdentityResolver::new("jwt-secret");
        let user = resolver.resolve(&token("jwt-secret", "u-1", 600)).await.unwrap();
        assert_eq!(user.as_deref(), Some("u-1"));
    }

    #[tokio::test]
    async fn wrong_secret_or_expired_token_resolves_nothing() {
        let resolver = JwtIdentityResolver::new("jwt-secret");
        assert!(resolver.resolve(&token("other", "u-1", 600)).await.unwrap().is_none());
        assert!(resolver.resolve(&token("jwt-secret", "u-1", -600)).await.unwrap().is_none());
        assert!(resolver.resolve("garbage").await.unwrap().is_none());
    }
}
