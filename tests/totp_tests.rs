//! Integration tests for the TOTP engine.

use securepass::errors::VaultError;
use securepass::totp::{base32, compute_code, generate_secret, verify_code};

/// The RFC 6238 reference secret: ASCII "12345678901234567890" in base32.
const RFC_SECRET: &str = "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ";

// ---------------------------------------------------------------------------
// RFC 6238 test vectors (SHA-1, 6 digits)
// ---------------------------------------------------------------------------

#[test]
fn rfc_6238_vectors() {
    let vectors = [
        (59u64, "287082"),
        (1_111_111_109, "081804"),
        (1_111_111_111, "050471"),
        (1_234_567_890, "005924"),
        (2_000_000_000, "279037"),
        (20_000_000_000, "353130"),
    ];

    for (time, expected) in vectors {
        let code = compute_code(RFC_SECRET, time).expect("compute");
        assert_eq!(code, expected, "wrong code at t={time}");
    }
}

#[test]
fn code_is_stable_within_a_time_step() {
    let at_start = compute_code(RFC_SECRET, 30).expect("t=30");
    let at_end = compute_code(RFC_SECRET, 59).expect("t=59");
    assert_eq!(at_start, at_end, "codes within one 30 s step must match");
}

#[test]
fn code_changes_across_time_steps() {
    let step1 = compute_code(RFC_SECRET, 59).expect("t=59");
    let step2 = compute_code(RFC_SECRET, 60).expect("t=60");
    assert_ne!(step1, step2);
}

#[test]
fn secret_decode_ignores_case() {
    let upper = compute_code(RFC_SECRET, 59).expect("upper");
    let lower = compute_code(&RFC_SECRET.to_lowercase(), 59).expect("lower");
    assert_eq!(upper, lower);
}

// ---------------------------------------------------------------------------
// Verification window
// ---------------------------------------------------------------------------

#[test]
fn verify_accepts_current_and_adjacent_steps() {
    let now = 1_111_111_111u64;

    for skew in [0i64, -30, 30] {
        let code = compute_code(RFC_SECRET, (now as i64 + skew) as u64).expect("compute");
        assert!(
            verify_code(RFC_SECRET, &code, now).expect("verify"),
            "code from skew {skew} s must verify"
        );
    }
}

#[test]
fn verify_rejects_codes_two_steps_away() {
    let now = 1_111_111_111u64;

    for skew in [-90i64, 90] {
        let code = compute_code(RFC_SECRET, (now as i64 + skew) as u64).expect("compute");
        assert!(
            !verify_code(RFC_SECRET, &code, now).expect("verify"),
            "code from skew {skew} s must be rejected"
        );
    }
}

#[test]
fn verify_rejects_a_perturbed_code() {
    let now = 1_234_567_890u64;

    // Collect the codes of all three accepted windows, then build a
    // candidate guaranteed to match none of them.
    let accepted: Vec<String> = [-30i64, 0, 30]
        .iter()
        .map(|skew| compute_code(RFC_SECRET, (now as i64 + skew) as u64).expect("compute"))
        .collect();

    let candidate = (0..10)
        .map(|d| format!("{d}{}", &accepted[1][1..]))
        .find(|c| !accepted.contains(c))
        .expect("at most three of ten candidates can collide");

    assert!(!verify_code(RFC_SECRET, &candidate, now).expect("verify"));
}

#[test]
fn verify_rejects_garbage_input() {
    assert!(!verify_code(RFC_SECRET, "", 59).expect("empty"));
    assert!(!verify_code(RFC_SECRET, "abcdef", 59).expect("letters"));
    assert!(!verify_code(RFC_SECRET, "28708", 59).expect("too short"));
}

#[test]
fn empty_secret_is_an_error() {
    let result = compute_code("", 59);
    assert!(matches!(result, Err(VaultError::InvalidTotp)));
}

// ---------------------------------------------------------------------------
// Secret generation
// ---------------------------------------------------------------------------

#[test]
fn generated_secret_is_20_bytes_of_base32() {
    let enrollment = generate_secret().expect("generate");

    let raw = base32::decode(&enrollment.secret);
    assert_eq!(raw.len(), 20, "secret must decode to 20 bytes");

    // A fresh secret must produce verifiable codes.
    let code = compute_code(&enrollment.secret, 1_000_000).expect("compute");
    assert!(verify_code(&enrollment.secret, &code, 1_000_000).expect("verify"));
}

#[test]
fn provisioning_uri_embeds_the_secret() {
    let enrollment = generate_secret().expect("generate");

    assert!(enrollment.provisioning_uri.starts_with("otpauth://totp/"));
    assert!(enrollment
        .provisioning_uri
        .contains(&format!("secret={}", enrollment.secret)));
    assert!(enrollment.provisioning_uri.contains("issuer=SecurePass"));
}

#[test]
fn generated_secrets_differ() {
    let a = generate_secret().expect("a");
    let b = generate_secret().expect("b");
    assert_ne!(a.secret, b.secret);
}
