//! Integration tests for the SecurePass crypto module.

use securepass::crypto::kdf::{self, KdfParams};
use securepass::crypto::keys::{ExportedKey, VaultKey};
use securepass::crypto::password::{generate_password, score_password_strength, CharsetOptions};
use securepass::crypto::{open, seal};
use securepass::errors::VaultError;
use serde::{Deserialize, Serialize};

/// Fast-but-valid KDF params so tests do not burn 64 MB per derivation.
fn test_params() -> KdfParams {
    KdfParams {
        memory_kib: 8_192,
        iterations: 1,
        parallelism: 1,
    }
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Payload {
    title: String,
    secret: String,
}

fn payload() -> Payload {
    Payload {
        title: "example.com".to_string(),
        secret: "hunter2".to_string(),
    }
}

// ---------------------------------------------------------------------------
// Seal / open round-trip
// ---------------------------------------------------------------------------

#[test]
fn seal_open_roundtrip() {
    let key = VaultKey::new([0xABu8; 32]);

    let blob = seal(&key, &payload()).expect("seal should succeed");

    // 12-byte nonce, ciphertext longer than plaintext by the 16-byte tag.
    assert_eq!(blob.iv.len(), 12);
    assert!(blob.ciphertext.len() > 16);

    let recovered: Payload = open(&key, &blob).expect("open should succeed");
    assert_eq!(recovered, payload());
}

#[test]
fn seal_produces_different_blobs_each_time() {
    let key = VaultKey::new([0xCDu8; 32]);

    let blob1 = seal(&key, &payload()).expect("seal 1");
    let blob2 = seal(&key, &payload()).expect("seal 2");

    // Fresh nonce per call means both halves must differ.
    assert_ne!(blob1.iv, blob2.iv, "nonces must never repeat");
    assert_ne!(blob1.ciphertext, blob2.ciphertext);
}

#[test]
fn open_with_wrong_key_fails() {
    let key = VaultKey::new([0x11u8; 32]);
    let wrong_key = VaultKey::new([0x22u8; 32]);

    let blob = seal(&key, &payload()).expect("seal");
    let result: Result<Payload, _> = open(&wrong_key, &blob);

    assert!(
        matches!(result, Err(VaultError::DecryptionFailed)),
        "decryption with the wrong key must fail with DecryptionFailed"
    );
}

#[test]
fn flipping_any_ciphertext_bit_is_detected() {
    let key = VaultKey::new([0xBBu8; 32]);
    let blob = seal(&key, &payload()).expect("seal");

    for index in [0, blob.ciphertext.len() / 2, blob.ciphertext.len() - 1] {
        let mut tampered = blob.clone();
        tampered.ciphertext[index] ^= 0x01;

        let result: Result<Payload, _> = open(&key, &tampered);
        assert!(
            matches!(result, Err(VaultError::DecryptionFailed)),
            "bit flip at ciphertext byte {index} must fail the auth check"
        );
    }
}

#[test]
fn flipping_an_iv_bit_is_detected() {
    let key = VaultKey::new([0xEEu8; 32]);
    let mut blob = seal(&key, &payload()).expect("seal");
    blob.iv[0] ^= 0x01;

    let result: Result<Payload, _> = open(&key, &blob);
    assert!(matches!(result, Err(VaultError::DecryptionFailed)));
}

#[test]
fn open_with_malformed_iv_fails() {
    let key = VaultKey::new([0xAAu8; 32]);
    let mut blob = seal(&key, &payload()).expect("seal");
    blob.iv.truncate(5);

    let result: Result<Payload, _> = open(&key, &blob);
    assert!(matches!(result, Err(VaultError::DecryptionFailed)));
}

// ---------------------------------------------------------------------------
// Key derivation (Argon2id)
// ---------------------------------------------------------------------------

#[test]
fn derive_master_key_same_inputs_same_output() {
    let salt = kdf::generate_salt().expect("salt");

    let key1 = kdf::derive_master_key(b"my-secure-passphrase", &salt, &test_params()).expect("1");
    let key2 = kdf::derive_master_key(b"my-secure-passphrase", &salt, &test_params()).expect("2");

    assert_eq!(key1, key2, "same password + salt must produce the same key");
}

#[test]
fn derive_master_key_different_salts_different_keys() {
    let salt1 = kdf::generate_salt().expect("salt 1");
    let salt2 = kdf::generate_salt().expect("salt 2");

    let key1 = kdf::derive_master_key(b"same-password", &salt1, &test_params()).expect("1");
    let key2 = kdf::derive_master_key(b"same-password", &salt2, &test_params()).expect("2");

    assert_ne!(key1, key2, "different salts must produce different keys");
}

#[test]
fn derive_master_key_different_passwords_different_keys() {
    let salt = kdf::generate_salt().expect("salt");

    let key1 = kdf::derive_master_key(b"password-one", &salt, &test_params()).expect("1");
    let key2 = kdf::derive_master_key(b"password-two", &salt, &test_params()).expect("2");

    assert_ne!(key1, key2);
}

#[test]
fn derive_rejects_dangerously_weak_params() {
    let salt = kdf::generate_salt().expect("salt");
    let weak = KdfParams {
        memory_kib: 1_024,
        iterations: 1,
        parallelism: 1,
    };

    let result = kdf::derive_master_key(b"pw", &salt, &weak);
    assert!(matches!(result, Err(VaultError::KeyDerivationFailed(_))));
}

#[test]
fn generate_salt_is_16_bytes_and_random() {
    let salt1 = kdf::generate_salt().expect("salt 1");
    let salt2 = kdf::generate_salt().expect("salt 2");

    assert_eq!(salt1.len(), 16);
    assert_ne!(salt1, salt2, "two salts must differ");
}

// ---------------------------------------------------------------------------
// Key export / import
// ---------------------------------------------------------------------------

#[test]
fn export_import_roundtrip() {
    let key = VaultKey::new([0x42u8; 32]);
    let exported = key.export();

    assert_eq!(exported.kty, "oct");
    assert_eq!(exported.alg, "A256GCM");

    let imported = VaultKey::import(&exported).expect("import");
    assert_eq!(imported.as_bytes(), key.as_bytes());
}

#[test]
fn imported_key_opens_blobs_sealed_by_original() {
    let key = VaultKey::new([0x77u8; 32]);
    let blob = seal(&key, &payload()).expect("seal");

    let imported = VaultKey::import(&key.export()).expect("import");
    let recovered: Payload = open(&imported, &blob).expect("open");
    assert_eq!(recovered, payload());
}

#[test]
fn import_rejects_unknown_algorithm() {
    let mut exported = VaultKey::new([0x01u8; 32]).export();
    exported.alg = "A128GCM".to_string();

    let result = VaultKey::import(&exported);
    assert!(matches!(result, Err(VaultError::SessionRestore(_))));
}

#[test]
fn import_rejects_wrong_key_length() {
    let exported = ExportedKey {
        kty: "oct".to_string(),
        alg: "A256GCM".to_string(),
        k: "AAAA".to_string(),
    };

    let result = VaultKey::import(&exported);
    assert!(matches!(result, Err(VaultError::SessionRestore(_))));
}

// ---------------------------------------------------------------------------
// Password generation
// ---------------------------------------------------------------------------

#[test]
fn generated_password_has_requested_length() {
    let options = CharsetOptions::default();
    for length in [1, 8, 16, 64] {
        let password = generate_password(length, &options).expect("generate");
        assert_eq!(password.len(), length);
    }
}

#[test]
fn generated_password_stays_within_selected_classes() {
    let options = CharsetOptions {
        lowercase: false,
        uppercase: false,
        numbers: true,
        symbols: false,
    };

    let password = generate_password(64, &options).expect("generate");
    assert!(
        password.chars().all(|c| c.is_ascii_digit()),
        "numbers-only password contained a non-digit: {password}"
    );
}

#[test]
fn empty_charset_selection_falls_back_to_three_classes() {
    let options = CharsetOptions {
        lowercase: false,
        uppercase: false,
        numbers: false,
        symbols: false,
    };

    let password = generate_password(64, &options).expect("generate");
    assert!(
        password.chars().all(|c| c.is_ascii_alphanumeric()),
        "fallback charset must be alphanumeric only: {password}"
    );
}

#[test]
fn generated_passwords_differ() {
    let options = CharsetOptions::default();
    let a = generate_password(32, &options).expect("a");
    let b = generate_password(32, &options).expect("b");
    assert_ne!(a, b);
}

// ---------------------------------------------------------------------------
// Password strength scoring
// ---------------------------------------------------------------------------

#[test]
fn strong_password_scores_five() {
    let report = score_password_strength("Correct-Horse-42!");
    assert_eq!(report.score, 5);
    assert!(report.missing.is_empty());
}

#[test]
fn empty_password_scores_zero() {
    let report = score_password_strength("");
    assert_eq!(report.score, 0);
    assert_eq!(report.missing.len(), 5);
}

#[test]
fn each_check_scores_independently() {
    // Lowercase only, too short: one point.
    let report = score_password_strength("abc");
    assert_eq!(report.score, 1);
    assert!(report.missing.contains(&"length"));
    assert!(report.missing.contains(&"uppercase"));
    assert!(report.missing.contains(&"number"));
    assert!(report.missing.contains(&"symbol"));

    // Long with lower + digits, no upper/symbol: three points.
    let report = score_password_strength("abcdef123");
    assert_eq!(report.score, 3);
    assert_eq!(report.missing, vec!["uppercase", "symbol"]);
}
