//! AES-256-GCM authenticated encryption of record payloads.
//!
//! Every payload in the vault is persisted as a `SealedBlob`: a fresh
//! random 12-byte nonce plus the ciphertext (which carries the 16-byte
//! auth tag).  The plaintext side is any serde-serializable value,
//! encoded as JSON bytes before sealing.
//!
//! `open` collapses every failure — bad tag, truncated input, garbage
//! plaintext — into the single `DecryptionFailed` error so callers can
//! never distinguish "wrong key" from "corrupted data".

use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{AeadCore, Aes256Gcm, Nonce};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::errors::{Result, VaultError};

use super::keys::VaultKey;

/// Size of the AES-256-GCM nonce in bytes.
pub const NONCE_LEN: usize = 12;

/// An authenticated-encryption envelope over a JSON-serializable payload.
///
/// Both fields serialize as base64 strings in JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SealedBlob {
    /// The 12-byte nonce generated for this encryption.
    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub iv: Vec<u8>,

    /// Ciphertext plus the 16-byte auth tag.
    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub ciphertext: Vec<u8>,
}

/// Encrypt a serializable payload under `key`.
///
/// Generates a fresh random nonce on every call; nonces are never
/// reused for a given key.
pub fn seal<T: Serialize>(key: &VaultKey, payload: &T) -> Result<SealedBlob> {
    let plaintext = serde_json::to_vec(payload)
        .map_err(|e| VaultError::Serialization(format!("payload: {e}")))?;

    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| VaultError::EncryptionFailed(format!("invalid key length: {e}")))?;

    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

    let ciphertext = cipher
        .encrypt(&nonce, plaintext.as_slice())
        .map_err(|e| VaultError::EncryptionFailed(format!("encryption error: {e}")))?;

    Ok(SealedBlob {
        iv: nonce.to_vec(),
        ciphertext,
    })
}

/// Decrypt a `SealedBlob` produced by `seal` and deserialize the payload.
///
/// This is the sole mechanism for verifying that a candidate key is
/// correct: decryption succeeds only under the key that sealed the blob.
pub fn open<T: DeserializeOwned>(key: &VaultKey, blob: &SealedBlob) -> Result<T> {
    if blob.iv.len() != NONCE_LEN {
        return Err(VaultError::DecryptionFailed);
    }

    let cipher =
        Aes256Gcm::new_from_slice(key.as_bytes()).map_err(|_| VaultError::DecryptionFailed)?;

    let nonce = Nonce::from_slice(&blob.iv);

    let plaintext = cipher
        .decrypt(nonce, blob.ciphertext.as_slice())
        .map_err(|_| VaultError::DecryptionFailed)?;

    serde_json::from_slice(&plaintext).map_err(|_| VaultError::DecryptionFailed)
}

// ---------------------------------------------------------------------------
// Serde helpers for base64-encoded Vec<u8> fields
// ---------------------------------------------------------------------------

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

pub(crate) fn base64_encode<S>(data: &[u8], serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    let encoded = BASE64.encode(data);
    serializer.serialize_str(&encoded)
}

pub(crate) fn base64_decode<'de, D>(deserializer: D) -> std::result::Result<Vec<u8>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    BASE64.decode(&s).map_err(serde::de::Error::custom)
}
