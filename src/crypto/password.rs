//! Password generation and strength scoring.
//!
//! Generation samples secure-random bytes and maps each onto the union
//! of the requested character classes by modulo.  A byte therefore has
//! a slight bias toward the start of the charset, and the output is not
//! guaranteed to contain a character from every selected class — both
//! are accepted properties of the scheme, kept so generated password
//! distributions stay stable across versions.

use rand::rngs::OsRng;
use rand::TryRngCore;

use crate::errors::{Result, VaultError};

const LOWERCASE: &str = "abcdefghijklmnopqrstuvwxyz";
const UPPERCASE: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const NUMBERS: &str = "0123456789";
const SYMBOLS: &str = "!@#$%^&*()-_=+[]{};:,.<>/?";

/// Which character classes to draw generated passwords from.
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
pub struct CharsetOptions {
    #[serde(default)]
    pub lowercase: bool,
    #[serde(default)]
    pub uppercase: bool,
    #[serde(default)]
    pub numbers: bool,
    #[serde(default)]
    pub symbols: bool,
}

impl Default for CharsetOptions {
    fn default() -> Self {
        Self {
            lowercase: true,
            uppercase: true,
            numbers: true,
            symbols: false,
        }
    }
}

/// Generate a random password of `length` characters.
///
/// The charset is the union of the selected classes.  If no class is
/// selected, falls back to lowercase + uppercase + numbers rather than
/// failing on an empty charset.
pub fn generate_password(length: usize, options: &CharsetOptions) -> Result<String> {
    let mut charset = String::new();
    if options.lowercase {
        charset.push_str(LOWERCASE);
    }
    if options.uppercase {
        charset.push_str(UPPERCASE);
    }
    if options.numbers {
        charset.push_str(NUMBERS);
    }
    if options.symbols {
        charset.push_str(SYMBOLS);
    }
    if charset.is_empty() {
        charset.push_str(LOWERCASE);
        charset.push_str(UPPERCASE);
        charset.push_str(NUMBERS);
    }

    let chars: Vec<char> = charset.chars().collect();

    let mut bytes = vec![0u8; length];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| VaultError::RandomFailed(format!("OS RNG unavailable: {e}")))?;

    let password = bytes
        .iter()
        .map(|b| chars[*b as usize % chars.len()])
        .collect();

    Ok(password)
}

/// Result of scoring a password: 0–5 plus the names of failed checks.
#[derive(Debug, Clone, serde::Serialize)]
pub struct StrengthReport {
    pub score: u8,
    pub missing: Vec<&'static str>,
}

/// Score a password against five independent checks.
///
/// One point each for: length >= 8, a lowercase letter, an uppercase
/// letter, a digit, and a symbol (any non-alphanumeric character).
pub fn score_password_strength(password: &str) -> StrengthReport {
    let mut score = 0u8;
    let mut missing = Vec::new();

    if password.len() >= 8 {
        score += 1;
    } else {
        missing.push("length");
    }

    if password.chars().any(|c| c.is_ascii_lowercase()) {
        score += 1;
    } else {
        missing.push("lowercase");
    }

    if password.chars().any(|c| c.is_ascii_uppercase()) {
        score += 1;
    } else {
        missing.push("uppercase");
    }

    if password.chars().any(|c| c.is_ascii_digit()) {
        score += 1;
    } else {
        missing.push("number");
    }

    if password.chars().any(|c| !c.is_ascii_alphanumeric()) {
        score += 1;
    } else {
        missing.push("symbol");
    }

    StrengthReport { score, missing }
}
