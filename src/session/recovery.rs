//! Recovery-key generation and normalization.
//!
//! A recovery key is an independent random secret — never derived from
//! the master password — formatted for humans as four dash-separated
//! segments of five characters, e.g. `K7MPX-2QWRT-9HNCF-D4VUB`.  The
//! alphabet omits `0`, `1`, `I`, `L` and `O` so a key read off paper
//! cannot be mistyped into a lookalike.
//!
//! Twenty characters over a 30-symbol alphabet is ~98 bits of entropy,
//! comfortably beyond the master key's brute-force margin.

use rand::rngs::OsRng;
use rand::TryRngCore;

use crate::errors::{Result, VaultError};

/// Characters a recovery key is drawn from.
const ALPHABET: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";

/// Number of segments in a formatted key.
const SEGMENTS: usize = 4;

/// Characters per segment.
const SEGMENT_LEN: usize = 5;

/// Generate a fresh recovery key in display form.
pub fn generate() -> Result<String> {
    let mut bytes = [0u8; SEGMENTS * SEGMENT_LEN];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| VaultError::RandomFailed(format!("OS RNG unavailable: {e}")))?;

    let mut key = String::with_capacity(SEGMENTS * SEGMENT_LEN + SEGMENTS - 1);
    for (i, byte) in bytes.iter().enumerate() {
        if i > 0 && i % SEGMENT_LEN == 0 {
            key.push('-');
        }
        key.push(ALPHABET[*byte as usize % ALPHABET.len()] as char);
    }

    Ok(key)
}

/// Normalize user input before deriving the recovery-unlock key.
///
/// Uppercases and strips whitespace and dashes, so a key typed in
/// lowercase or without its separators still derives the same key.
/// Anything else a user mistypes stays in and simply fails to unwrap.
pub fn normalize(input: &str) -> String {
    input
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .map(|c| c.to_ascii_uppercase())
        .collect()
}
