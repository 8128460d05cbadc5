//! JWT access token issuance and verification.
//!
//! Every token carries a common envelope (subject, tenant, issuer,
//! validity window, permission snapshot) plus a principal section
//! discriminated by the `role` claim: `admin` tokens add username,
//! email and roles; `member` tokens add name, email and relation.
//! The permission snapshot is taken at login and is not refreshed for
//! the lifetime of the token.

use chrono::Utc;
use famvault_core::models::role::ModulePermission;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::AuthError;

/// Role-specific identity carried in a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum PrincipalClaims {
    Admin {
        username: String,
        email: String,
        roles: Vec<String>,
    },
    Member {
        name: String,
        email: String,
        relation: Option<String>,
    },
}

impl PrincipalClaims {
    /// Name of the role the principal resolved to.
    pub fn role(&self) -> &'static str {
        match self {
            PrincipalClaims::Admin { .. } => "admin",
            PrincipalClaims::Member { .. } => "member",
        }
    }
}

/// JWT claims embedded in every access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// Subject: admin user or family member id.
    pub sub: String,
    pub tenant_id: String,
    /// Issuer.
    pub iss: String,
    /// Issued-at (Unix timestamp).
    pub iat: i64,
    /// Expiration (Unix timestamp).
    pub exp: i64,
    /// Unique token ID (UUID string).
    pub jti: String,
    /// Permission snapshot taken at login.
    #[serde(default)]
    pub permissions: Vec<ModulePermission>,
    #[serde(flatten)]
    pub principal: PrincipalClaims,
}

impl AccessTokenClaims {
    pub fn role(&self) -> &'static str {
        self.principal.role()
    }

    pub fn is_admin(&self) -> bool {
        matches!(self.principal, PrincipalClaims::Admin { .. })
    }
}

fn encoding_key(config: &AuthConfig) -> Result<EncodingKey, AuthError> {
    if config.jwt_secret.is_empty() {
        return Err(AuthError::Crypto("JWT signing secret is empty".into()));
    }
    Ok(EncodingKey::from_secret(config.jwt_secret.as_bytes()))
}

/// Issue a signed HS256 JWT access token.
pub fn issue_access_token(
    subject: Uuid,
    tenant_id: &str,
    principal: PrincipalClaims,
    permissions: Vec<ModulePermission>,
    config: &AuthConfig,
) -> Result<String, AuthError> {
    let now = Utc::now().timestamp();
    let claims = AccessTokenClaims {
        sub: subject.to_string(),
        tenant_id: tenant_id.to_string(),
        iss: config.jwt_issuer.clone(),
        iat: now,
        exp: now + config.access_token_lifetime_secs as i64,
        jti: Uuid::new_v4().to_string(),
        permissions,
        principal,
    };

    encode_claims(&claims, config)
}

pub(crate) fn encode_claims(
    claims: &AccessTokenClaims,
    config: &AuthConfig,
) -> Result<String, AuthError> {
    let key = encoding_key(config)?;
    jsonwebtoken::encode(&Header::new(Algorithm::HS256), claims, &key)
        .map_err(|e| AuthError::Crypto(format!("JWT encode: {e}")))
}

/// Decode and verify an HS256 JWT access token.
pub fn decode_access_token(
    token: &str,
    config: &AuthConfig,
) -> Result<AccessTokenClaims, AuthError> {
    if config.jwt_secret.is_empty() {
        return Err(AuthError::Crypto("JWT signing secret is empty".into()));
    }
    let key = DecodingKey::from_secret(config.jwt_secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[&config.jwt_issuer]);
    validation.set_required_spec_claims(&["sub", "exp", "iat", "iss"]);

    jsonwebtoken::decode::<AccessTokenClaims>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::TokenInvalid(e.to_string()),
        })
}

/// Validated JWT claims: a newtype proving the token was verified.
#[derive(Debug, Clone)]
pub struct ValidatedClaims(pub AccessTokenClaims);

impl ValidatedClaims {
    pub fn claims(&self) -> &AccessTokenClaims {
        &self.0
    }
}

/// Validate a JWT access token (signature, expiry, issuer) and return
/// the verified claims. Purely stateless: no store is consulted.
pub fn validate_access_token(
    token: &str,
    config: &AuthConfig,
) -> Result<ValidatedClaims, AuthError> {
    decode_access_token(token, config).map(ValidatedClaims)
}
