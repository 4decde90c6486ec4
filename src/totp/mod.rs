//! Time-based one-time-password engine.
//!
//! This module provides:
//! - A self-contained RFC 4648 base32 codec (`base32`)
//! - Secret generation, code computation and skew-tolerant
//!   verification per RFC 4226/6238 (`otp`)

pub mod base32;
pub mod otp;

// Re-export the most commonly used items.
pub use otp::{compute_code, generate_secret, verify_code, TotpEnrollment};
