use serde::Deserialize;

/// Default header carrying the HMAC signature of the request body.
pub const DEFAULT_AUTH_SIGNATURE_HEADER: &str = "x-signature";

/// Credential validation configuration.
///
/// The signature path is enabled when `hmac_secret` is set, the session
/// path when `jwt_secret` is set. At least one must be configured.
#[derive(Deserialize)]
pub struct AuthConfig {
    /// Shared secret for HMAC-SHA256 request signatures.
    pub hmac_secret: Option<String>,
    /// HS256 secret used to validate session tokens.
    pub jwt_secret: Option<String>,
    #[serde(default = "default_signature_header")]
    pub signature_header: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            hmac_secret: None,
            jwt_secret: None,
            signature_header: default_signature_header(),
        }
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("hmac_secret", &self.hmac_secret.as_ref().map(|_| "[REDACTED]"))
            .field("jwt_secret", &self.jwt_secret.as_ref().map(|_| "[REDACTED]"))
            .field("signature_header", &self.signature_header)
            .finish()
    }
}

fn default_signature_header() -> String {
    DEFAULT_AUTH_SIGNATURE_HEADER.to_owned()
}
