//! Cryptographic primitives for the SecurePass engine.
//!
//! This module provides:
//! - AES-256-GCM sealing and opening of record payloads (`encryption`)
//! - Argon2id password-based key derivation (`kdf`)
//! - The zeroizing `VaultKey` and its portable form (`keys`)
//! - Password generation and strength scoring (`password`)

pub mod encryption;
pub mod kdf;
pub mod keys;
pub mod password;

// Re-export the most commonly used items so callers can write:
//   use crate::crypto::{seal, open, derive_master_key, ...};
pub use encryption::{open, seal, SealedBlob};
pub use kdf::{derive_master_key, generate_salt, KdfParams};
pub use keys::{ExportedKey, VaultKey};
pub use password::{generate_password, score_password_strength, CharsetOptions, StrengthReport};
