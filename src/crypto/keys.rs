//! The in-memory vault key and its portable representation.
//!
//! A `VaultKey` wraps the 32 bytes produced by Argon2id and zeroes its
//! memory when dropped, so a key cannot linger after the session that
//! owned it is gone.
//!
//! `ExportedKey` is the JWK-style octet form used for session export:
//! it is the only representation in which a key ever leaves the
//! process, and only into a short-lived session-scoped store owned by
//! the caller.

use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::errors::{Result, VaultError};

use super::kdf::KEY_LEN;

/// A 32-byte symmetric vault key, zeroed on drop.
#[derive(Zeroize)]
#[zeroize(drop)]
pub struct VaultKey {
    bytes: [u8; KEY_LEN],
}

impl VaultKey {
    /// Create a new `VaultKey` from raw bytes.
    pub fn new(bytes: [u8; KEY_LEN]) -> Self {
        Self { bytes }
    }

    /// Access the raw key bytes (e.g. to build an AES cipher).
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }

    /// Serialize the key into its portable interchange form.
    pub fn export(&self) -> ExportedKey {
        ExportedKey {
            kty: KEY_TYPE.to_string(),
            alg: KEY_ALG.to_string(),
            k: BASE64_URL.encode(self.bytes),
        }
    }

    /// Rebuild a key from its portable form, validating shape and length.
    pub fn import(exported: &ExportedKey) -> Result<Self> {
        if exported.kty != KEY_TYPE || exported.alg != KEY_ALG {
            return Err(VaultError::SessionRestore(format!(
                "unsupported key type {}/{}",
                exported.kty, exported.alg
            )));
        }

        let mut raw = BASE64_URL
            .decode(&exported.k)
            .map_err(|e| VaultError::SessionRestore(format!("key material: {e}")))?;

        if raw.len() != KEY_LEN {
            let got = raw.len();
            raw.zeroize();
            return Err(VaultError::SessionRestore(format!(
                "key must be {KEY_LEN} bytes, got {got}"
            )));
        }

        let mut bytes = [0u8; KEY_LEN];
        bytes.copy_from_slice(&raw);
        raw.zeroize();
        Ok(Self { bytes })
    }
}

/// Octet key type per the JWK registry.
const KEY_TYPE: &str = "oct";

/// Algorithm tag for a 256-bit AES-GCM key.
const KEY_ALG: &str = "A256GCM";

use base64::engine::general_purpose::URL_SAFE_NO_PAD as BASE64_URL;
use base64::Engine;

/// JWK-style portable key representation.
///
/// Deliberately no `Debug`: the `k` field is live key material.
#[derive(Clone, Serialize, Deserialize)]
pub struct ExportedKey {
    /// Key type — always `"oct"`.
    pub kty: String,
    /// Intended algorithm — always `"A256GCM"`.
    pub alg: String,
    /// The raw key bytes, base64url without padding.
    pub k: String,
}

impl Drop for ExportedKey {
    fn drop(&mut self) {
        self.k.zeroize();
    }
}
