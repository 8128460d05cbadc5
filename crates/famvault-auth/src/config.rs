//! Authentication configuration.

use std::fmt;

/// Configuration for the authentication service.
#[derive(Clone)]
pub struct AuthConfig {
    /// Shared secret for HS256 token signing and verification.
    pub jwt_secret: String,
    /// JWT issuer (`iss` claim).
    pub jwt_issuer: String,
    /// Access token lifetime in seconds (default: 3600 = 1 hour).
    pub access_token_lifetime_secs: u64,
    /// Optional pepper prepended to passwords before Argon2id hashing
    /// and verification.
    pub pepper: Option<String>,
    /// Minimum password length for newly set passwords.
    pub min_password_length: usize,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            jwt_issuer: "famvault".into(),
            access_token_lifetime_secs: 3600,
            pepper: None,
            min_password_length: 8,
        }
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .field("jwt_issuer", &self.jwt_issuer)
            .field("access_token_lifetime_secs", &self.access_token_lifetime_secs)
            .field("pepper", &self.pepper.as_ref().map(|_| "<redacted>"))
            .field("min_password_length", &self.min_password_length)
            .finish()
    }
}
