//! AES-256-GCM field envelopes.
//!
//! An encrypted field is stored as `nonce_hex:tag_hex:ciphertext_hex`
//! with a fresh 96-bit nonce per value and a 128-bit tag.
//!
//! Decryption never fails: anything that does not parse as an envelope
//! or does not authenticate under the given key is returned unchanged.
//! Legacy plaintext survives reads, and decrypting an already decrypted
//! value is a no-op.

use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};

use crate::error::CryptoError;
use crate::key::TenantKey;

const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

struct Envelope {
    nonce: Vec<u8>,
    tag: Vec<u8>,
    ciphertext: Vec<u8>,
}

fn parse_envelope(value: &str) -> Option<Envelope> {
    let mut parts = value.split(':');
    let (nonce, tag, ciphertext) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }

    let nonce = hex::decode(nonce).ok()?;
    let tag = hex::decode(tag).ok()?;
    let ciphertext = hex::decode(ciphertext).ok()?;
    if nonce.len() != NONCE_LEN || tag.len() != TAG_LEN {
        return None;
    }

    Some(Envelope {
        nonce,
        tag,
        ciphertext,
    })
}

/// Whether `value` has the shape of an envelope. Says nothing about
/// whether it authenticates under any particular key.
pub fn is_envelope(value: &str) -> bool {
    parse_envelope(value).is_some()
}

/// Encrypt one field value. Empty input is returned unchanged.
pub fn encrypt_field(plaintext: &str, key: &TenantKey) -> Result<String, CryptoError> {
    if plaintext.is_empty() {
        return Ok(String::new());
    }

    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()));
    let mut nonce_bytes = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    // aes-gcm appends the tag to the ciphertext.
    let sealed = cipher
        .encrypt(nonce, plaintext.as_bytes())
        .map_err(|e| CryptoError::Encrypt(e.to_string()))?;
    let (ciphertext, tag) = sealed.split_at(sealed.len() - TAG_LEN);

    Ok(format!(
        "{}:{}:{}",
        hex::encode(nonce_bytes),
        hex::encode(tag),
        hex::encode(ciphertext)
    ))
}

/// Decrypt one field value, passing through anything that is not a
/// valid envelope for `key`.
pub fn decrypt_field(value: &str, key: &TenantKey) -> String {
    open_envelope(value, key).unwrap_or_else(|| value.to_owned())
}

fn open_envelope(value: &str, key: &TenantKey) -> Option<String> {
    let envelope = parse_envelope(value)?;

    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()));
    let mut sealed = envelope.ciphertext;
    sealed.extend_from_slice(&envelope.tag);

    let plaintext = cipher
        .decrypt(Nonce::from_slice(&envelope.nonce), sealed.as_slice())
        .ok()?;
    String::from_utf8(plaintext).ok()
}
