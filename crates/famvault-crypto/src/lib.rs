//! FamVault Crypto: per-tenant key derivation, AES-256-GCM field
//! envelopes, and the [`FieldGuard`] hook that encrypts declared entity
//! fields on persist and decrypts them on load.

pub mod envelope;
pub mod error;
pub mod guard;
pub mod key;

pub use envelope::{decrypt_field, encrypt_field, is_envelope};
pub use error::CryptoError;
pub use guard::FieldGuard;
pub use key::{MasterKey, TenantKey, derive_tenant_key};
