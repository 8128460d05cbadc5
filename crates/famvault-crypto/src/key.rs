//! Master key handling and per-tenant key derivation.
//!
//! A tenant key is `HMAC-SHA256(master_key, tenant_id)`. Rotating the
//! master key therefore changes every tenant key, and data encrypted
//! under the old keys can no longer be decrypted.

use std::fmt;

use hmac::{Hmac, Mac};
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::CryptoError;

/// Key length in bytes for both master and tenant keys (256 bits).
pub const KEY_LEN: usize = 32;

/// Process-wide secret from which every tenant key is derived.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct MasterKey([u8; KEY_LEN]);

impl MasterKey {
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Parse a 64-character hex string.
    pub fn from_hex(encoded: &str) -> Result<Self, CryptoError> {
        let mut bytes = hex::decode(encoded.trim())
            .map_err(|e| CryptoError::InvalidMasterKey(format!("not hex: {e}")))?;
        if bytes.len() != KEY_LEN {
            let len = bytes.len();
            bytes.zeroize();
            return Err(CryptoError::InvalidMasterKey(format!(
                "expected {KEY_LEN} bytes, got {len}"
            )));
        }
        let mut key = [0u8; KEY_LEN];
        key.copy_from_slice(&bytes);
        bytes.zeroize();
        Ok(Self(key))
    }
}

impl fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MasterKey(..)")
    }
}

/// AES-256 key for one tenant.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct TenantKey([u8; KEY_LEN]);

impl TenantKey {
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl fmt::Debug for TenantKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TenantKey(..)")
    }
}

/// Derive the field-encryption key for `tenant_id`.
pub fn derive_tenant_key(tenant_id: &str, master: &MasterKey) -> Result<TenantKey, CryptoError> {
    let mut mac = Hmac::<Sha256>::new_from_slice(&master.0)
        .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;
    mac.update(tenant_id.as_bytes());
    Ok(TenantKey(mac.finalize().into_bytes().into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const MASTER_HEX: &str = "000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f";

    #[test]
    fn derivation_is_deterministic() {
        let master = MasterKey::from_hex(MASTER_HEX).unwrap();
        for tenant in ["100000", "482913", "999999", ""] {
            let a = derive_tenant_key(tenant, &master).unwrap();
            let b = derive_tenant_key(tenant, &master).unwrap();
            assert_eq!(a.as_bytes(), b.as_bytes());
        }
    }

    #[test]
    fn tenants_get_distinct_keys() {
        let master = MasterKey::from_hex(MASTER_HEX).unwrap();
        let a = derive_tenant_key("100001", &master).unwrap();
        let b = derive_tenant_key("100002", &master).unwrap();
        assert_ne!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn master_rotation_changes_tenant_key() {
        let old = MasterKey::from_hex(MASTER_HEX).unwrap();
        let new = MasterKey::from_bytes([7u8; KEY_LEN]);
        assert_ne!(
            derive_tenant_key("482913", &old).unwrap().as_bytes(),
            derive_tenant_key("482913", &new).unwrap().as_bytes()
        );
    }

    #[test]
    fn matches_direct_hmac_sha256() {
        let master = MasterKey::from_bytes([0x0b; KEY_LEN]);
        let mut mac = Hmac::<Sha256>::new_from_slice(&[0x0b; KEY_LEN]).unwrap();
        mac.update(b"tenant");
        let expected: [u8; KEY_LEN] = mac.finalize().into_bytes().into();
        assert_eq!(derive_tenant_key("tenant", &master).unwrap().as_bytes(), &expected);
    }

    #[test]
    fn rejects_short_or_non_hex_master() {
        assert!(MasterKey::from_hex("abcd").is_err());
        assert!(MasterKey::from_hex(&"zz".repeat(32)).is_err());
    }

    #[test]
    fn debug_does_not_leak_key() {
        let master = MasterKey::from_hex(MASTER_HEX).unwrap();
        assert_eq!(format!("{master:?}"), "MasterKey(..)");
    }
}
