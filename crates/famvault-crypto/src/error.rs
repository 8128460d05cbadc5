//! Cryptography error types.

use famvault_core::error::VaultError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("invalid master key: {0}")]
    InvalidMasterKey(String),

    #[error("AES-GCM encrypt: {0}")]
    Encrypt(String),

    #[error("tenant key derivation: {0}")]
    KeyDerivation(String),
}

impl From<CryptoError> for VaultError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::InvalidMasterKey(_) => VaultError::Config(err.to_string()),
            CryptoError::Encrypt(_) | CryptoError::KeyDerivation(_) => {
                VaultError::Crypto(err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derivation_failures_are_crypto_errors() {
        let err: VaultError = CryptoError::KeyDerivation("bad key length".into()).into();
        assert!(matches!(err, VaultError::Crypto(msg) if msg.contains("bad key length")));
    }

    #[test]
    fn bad_master_key_is_a_config_error() {
        let err: VaultError = CryptoError::InvalidMasterKey("not hex".into()).into();
        assert!(matches!(err, VaultError::Config(_)));
    }
}
