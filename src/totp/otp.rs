//! RFC 4226/6238 one-time code computation and verification.
//!
//! Codes are 6 digits over a 30-second time step: the counter is
//! `floor(unix_seconds / 30)`, HMAC-SHA1 is taken over the big-endian
//! 8-byte counter, and the code is extracted by dynamic truncation
//! (low nibble of the last HMAC byte selects a 31-bit window, taken
//! mod 10^6).

use hmac::{Hmac, Mac};
use rand::rngs::OsRng;
use rand::TryRngCore;
use sha1::Sha1;
use subtle::ConstantTimeEq;

use crate::errors::{Result, VaultError};

use super::base32;

/// Length of a freshly generated shared secret in bytes.
const SECRET_LEN: usize = 20;

/// Time step in seconds.
const TIME_STEP: u64 = 30;

/// Number of code digits.
const CODE_DIGITS: u32 = 6;

/// Issuer label embedded in provisioning URIs.
const ISSUER: &str = "SecurePass";

/// A newly generated shared secret plus its authenticator-app URI.
#[derive(Debug, Clone, serde::Serialize)]
pub struct TotpEnrollment {
    /// The shared secret, base32-encoded without padding.
    pub secret: String,
    /// `otpauth://` URI for QR-code provisioning.
    pub provisioning_uri: String,
}

/// Generate a fresh 20-byte shared secret.
pub fn generate_secret() -> Result<TotpEnrollment> {
    let mut bytes = [0u8; SECRET_LEN];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| VaultError::RandomFailed(format!("OS RNG unavailable: {e}")))?;

    let secret = base32::encode(&bytes);
    let provisioning_uri = format!("otpauth://totp/{ISSUER}?secret={secret}&issuer={ISSUER}");

    Ok(TotpEnrollment {
        secret,
        provisioning_uri,
    })
}

/// Compute the 6-digit code for a secret at the given unix time.
pub fn compute_code(secret: &str, unix_seconds: u64) -> Result<String> {
    let key = base32::decode(secret);
    if key.is_empty() {
        return Err(VaultError::InvalidTotp);
    }

    let counter = unix_seconds / TIME_STEP;

    let mut mac = Hmac::<Sha1>::new_from_slice(&key)
        .map_err(|_| VaultError::InvalidTotp)?;
    mac.update(&counter.to_be_bytes());
    let digest = mac.finalize().into_bytes();

    // Dynamic truncation: the low nibble of the last byte picks the
    // offset of a 4-byte window, masked to 31 bits.
    let offset = (digest[digest.len() - 1] & 0x0f) as usize;
    let binary = (u32::from(digest[offset] & 0x7f) << 24)
        | (u32::from(digest[offset + 1]) << 16)
        | (u32::from(digest[offset + 2]) << 8)
        | u32::from(digest[offset + 3]);

    let code = binary % 10u32.pow(CODE_DIGITS);
    Ok(format!("{code:0width$}", width = CODE_DIGITS as usize))
}

/// Verify a candidate code at the given unix time.
///
/// Accepts the code for the current step or the immediately preceding
/// or following step (±30 s clock skew), checking the current step
/// first.  Comparison is constant-time.
pub fn verify_code(secret: &str, candidate: &str, unix_seconds: u64) -> Result<bool> {
    for step_offset in [0i64, -1, 1] {
        let shifted = unix_seconds as i64 + step_offset * TIME_STEP as i64;
        if shifted < 0 {
            continue;
        }

        let expected = compute_code(secret, shifted as u64)?;
        if expected.as_bytes().ct_eq(candidate.as_bytes()).into() {
            return Ok(true);
        }
    }

    Ok(false)
}
