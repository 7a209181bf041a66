use async_trait::async_trait;
use axum::http::HeaderName;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::{AuthError, AuthRequest, AuthVerdict, Authenticator};

type HmacSha256 = Hmac<Sha256>;

/// Actor recorded for signature-authenticated requests. The shared secret
/// identifies no individual caller.
pub const SIGNATURE_ACTOR: &str = "signature-authenticated";

/// Accepts requests whose signature header carries the hex HMAC-SHA256 of
/// the raw body under the shared secret. A `sha256=` prefix is accepted.
pub struct SignatureAuthenticator {
    mac: HmacSha256,
    header: HeaderName,
}

impl SignatureAuthenticator {
    pub fn new(secret: &str, header: &str) -> Result<Self, AuthError> {
        if secret.is_empty() {
            return Err(AuthError::Configuration("HMAC secret must not be empty".into()));
        }
        let header = HeaderName::try_from(header)
            .map_err(|e| AuthError::Configuration(format!("invalid signature header: {e}")))?;
        let mac = <HmacSha256 as Mac>::new_from_slice(secret.as_bytes())
            .map_err(|e| AuthError::Configuration(format!("invalid HMAC key: {e}")))?;
        Ok(Self { mac, header })
    }

    /// Hex HMAC-SHA256 of `body`.
    pub fn sign(&self, body: &[u8]) -> String {
        hex::encode(self.mac(body))
    }

    fn mac(&self, body: &[u8]) -> Vec<u8> {
        let mut mac = self.mac.clone();
        mac.update(body);
        mac.finalize().into_bytes().to_vec()
    }
}

#[async_trait]
impl Authenticator for SignatureAuthenticator {
    fn name(&self) -> &'static str {
        "signature"
    }

    async fn authenticate(&self, request: &AuthRequest<'_>) -> Result<AuthVerdict, AuthError> {
        let Some(value) = request.headers.get(&self.header) else {
            return Ok(AuthVerdict::Denied("missing signature header".into()));
        };
        let Ok(value) = value.to_str() else {
            return Ok(AuthVerdict::Denied("signature header is not ASCII".into()));
        };
        let value = value.trim();
        let hex_sig = value.strip_prefix("sha256=").unwrap_or(value);
        let Ok(provided) = hex::decode(hex_sig) else {
            return Ok(AuthVerdict::Denied("signature is not hex".into()));
        };

        let expected = self.mac(request.body);
        if bool::from(expected.ct_eq(&provided)) {
            Ok(AuthVerdict::Granted(SIGNATURE_ACTOR.to_owned()))
        } else {
            Ok(AuthVerdict::Denied("signature mismatch".into()))
        }
    }
}
