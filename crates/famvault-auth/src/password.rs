//! Password verification using Argon2id.

use argon2::{Argon2, PasswordVerifier};
use famvault_core::error::{VaultError, VaultResult};

use crate::config::AuthConfig;
use crate::error::AuthError;

/// Verify a plaintext password against an Argon2id PHC-format hash.
///
/// If `pepper` is provided it is prepended to the password before
/// verification. It must match the pepper used during hashing.
///
/// Returns `Ok(true)` on match, `Ok(false)` on mismatch, or
/// `Err(AuthError::Crypto)` if the stored hash is malformed.
pub fn verify_password(
    password: &str,
    hash: &str,
    pepper: Option<&str>,
) -> Result<bool, AuthError> {
    let peppered: String;
    let input = match pepper {
        Some(p) => {
            peppered = format!("{p}{password}");
            peppered.as_bytes()
        }
        None => password.as_bytes(),
    };

    let parsed_hash = argon2::PasswordHash::new(hash)
        .map_err(|e| AuthError::Crypto(format!("invalid hash format: {e}")))?;

    // Parameters are read back from the PHC string.
    let argon2 = Argon2::default();
    match argon2.verify_password(input, &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AuthError::Crypto(format!("verify error: {e}"))),
    }
}

/// Reject passwords shorter than the configured minimum.
pub fn check_password_policy(password: &str, config: &AuthConfig) -> VaultResult<()> {
    if password.chars().count() < config.min_password_length {
        return Err(VaultError::Validation {
            message: format!(
                "password must be at least {} characters",
                config.min_password_length
            ),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use famvault_db::hash_password;

    #[test]
    fn correct_password_matches() {
        let hash = hash_password("hunter2", None).unwrap();
        assert!(verify_password("hunter2", &hash, None).unwrap());
    }

    #[test]
    fn wrong_password_does_not_match() {
        let hash = hash_password("hunter2", None).unwrap();
        assert!(!verify_password("wrong", &hash, None).unwrap());
    }

    #[test]
    fn pepper_is_applied() {
        let hash = hash_password("hunter2", Some("pepper!")).unwrap();
        assert!(verify_password("hunter2", &hash, Some("pepper!")).unwrap());
        assert!(!verify_password("hunter2", &hash, None).unwrap());
    }

    #[test]
    fn malformed_hash_returns_error() {
        assert!(verify_password("pw", "not-a-hash", None).is_err());
        assert!(verify_password("pw", "", None).is_err());
    }

    #[test]
    fn policy_enforces_minimum_length() {
        let config = AuthConfig {
            min_password_length: 8,
            ..Default::default()
        };
        assert!(check_password_policy("short", &config).is_err());
        assert!(check_password_policy("long-enough", &config).is_ok());
    }
}
