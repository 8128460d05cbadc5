//! Authentication error types.

use famvault_core::error::VaultError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid tenant")]
    InvalidTenant,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("no permissions assigned to role")]
    NoPermissions,

    #[error("permission denied")]
    PermissionDenied,

    #[error("token has expired")]
    TokenExpired,

    #[error("invalid token: {0}")]
    TokenInvalid(String),

    #[error("cryptography error: {0}")]
    Crypto(String),
}

impl From<AuthError> for VaultError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidTenant => VaultError::InvalidTenant,
            AuthError::InvalidCredentials
            | AuthError::TokenExpired
            | AuthError::TokenInvalid(_) => VaultError::InvalidCredentials,
            AuthError::NoPermissions => VaultError::NoPermissions,
            AuthError::PermissionDenied => VaultError::PermissionDenied,
            AuthError::Crypto(msg) => VaultError::Crypto(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_failures_collapse_to_invalid_credentials() {
        for err in [
            AuthError::InvalidCredentials,
            AuthError::TokenExpired,
            AuthError::TokenInvalid("bad signature".into()),
        ] {
            assert!(matches!(
                VaultError::from(err),
                VaultError::InvalidCredentials
            ));
        }
    }
}
