//! Record types persisted by the vault store.
//!
//! The store holds three collections: a single `VaultConfig`,
//! `CredentialEntry` records keyed by id, and free-form settings keyed
//! by name.  Sealed payloads are opaque here — the store never touches
//! key material.  Byte fields use the shared serde helpers so they
//! appear as base64 strings in JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::crypto::encryption::{base64_decode, base64_encode, SealedBlob};

/// KDF parameters captured at vault creation.
///
/// Stored so that unlocking always derives with the exact settings the
/// vault was created under, even if the defaults change later.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StoredKdfParams {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for StoredKdfParams {
    fn default() -> Self {
        Self {
            memory_kib: 65_536,
            iterations: 3,
            parallelism: 4,
        }
    }
}

/// Per-vault configuration, created once at initialization.
///
/// Immutable except that the recovery fields may be written when a
/// recovery key is (re)issued.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultConfig {
    /// Config schema version.
    pub version: u8,

    /// The salt used for master-key derivation (base64 in JSON).
    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub salt: Vec<u8>,

    /// KDF parameters used at vault creation.
    pub kdf: StoredKdfParams,

    /// When this vault was created.
    pub created: DateTime<Utc>,

    /// Salt for deriving the recovery-unlock key, if recovery is issued.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "base64_encode_opt",
        deserialize_with = "base64_decode_opt"
    )]
    pub recovery_salt: Option<Vec<u8>>,

    /// The master key's portable form, sealed under the recovery-derived key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recovery_wrap: Option<SealedBlob>,
}

/// Current `VaultConfig` schema version.
pub const CONFIG_VERSION: u8 = 1;

/// A stored credential record.
///
/// The sealed payload holds the full `EntryFields`; only the URL is
/// kept in plaintext alongside it, for domain indexing without a key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialEntry {
    /// Unique id within the store.
    pub id: String,

    /// The encrypted entry body.
    pub sealed: SealedBlob,

    /// Plaintext copy of the entry URL, used for domain lookups.
    pub url: String,

    /// When this entry was first saved.
    pub created: DateTime<Utc>,

    /// When this entry was last re-sealed.
    pub modified: DateTime<Utc>,
}

/// The plaintext body of a credential entry, sealed under the vault key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryFields {
    pub title: String,
    pub url: String,
    pub username: String,
    pub password: String,
    pub notes: String,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Serde helpers for Option<Vec<u8>> base64 fields
// ---------------------------------------------------------------------------

fn base64_encode_opt<S>(
    data: &Option<Vec<u8>>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match data {
        // skip_serializing_if means None never reaches here.
        Some(bytes) => base64_encode(bytes, serializer),
        None => serializer.serialize_none(),
    }
}

fn base64_decode_opt<'de, D>(deserializer: D) -> std::result::Result<Option<Vec<u8>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    base64_decode(deserializer).map(Some)
}
