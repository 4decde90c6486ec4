use thiserror::Error;

/// All errors that can occur in the SecurePass engine.
#[derive(Debug, Error)]
pub enum VaultError {
    // --- Vault lifecycle errors ---
    #[error("No vault exists — initialize one first")]
    VaultNotFound,

    #[error("A vault already exists — reset it before initializing again")]
    VaultAlreadyExists,

    #[error("Invalid master password")]
    InvalidCredentials,

    #[error("Invalid recovery key")]
    InvalidRecoveryKey,

    #[error("No recovery key has been issued for this vault")]
    RecoveryUnavailable,

    #[error("A one-time code is required to unlock this vault")]
    TotpRequired,

    #[error("Invalid one-time code")]
    InvalidTotp,

    #[error("Vault is locked")]
    VaultLocked,

    #[error("Session restore failed: {0}")]
    SessionRestore(String),

    // --- Crypto errors ---
    #[error("Decryption failed — wrong key or corrupted data")]
    DecryptionFailed,

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Key derivation failed: {0}")]
    KeyDerivationFailed(String),

    #[error("Random generator failure: {0}")]
    RandomFailed(String),

    // --- Storage errors ---
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl VaultError {
    /// Stable error kind reported through the request/response contract.
    ///
    /// UI callers branch on these strings, so they must never change
    /// even if the display messages above are reworded.
    pub fn kind(&self) -> &'static str {
        match self {
            VaultError::VaultNotFound => "VaultNotFound",
            VaultError::VaultAlreadyExists => "VaultAlreadyExists",
            VaultError::InvalidCredentials => "InvalidCredentials",
            VaultError::InvalidRecoveryKey => "InvalidRecoveryKey",
            VaultError::RecoveryUnavailable => "RecoveryUnavailable",
            VaultError::TotpRequired => "TotpRequired",
            VaultError::InvalidTotp => "InvalidTotp",
            VaultError::VaultLocked => "VaultLocked",
            VaultError::SessionRestore(_) => "SessionRestoreError",
            VaultError::DecryptionFailed => "DecryptionError",
            VaultError::EncryptionFailed(_)
            | VaultError::KeyDerivationFailed(_)
            | VaultError::RandomFailed(_) => "CryptoError",
            VaultError::Storage(_) | VaultError::Serialization(_) => "StorageError",
        }
    }
}

impl From<std::io::Error> for VaultError {
    fn from(err: std::io::Error) -> Self {
        VaultError::Storage(err.to_string())
    }
}

/// Convenience type alias for SecurePass results.
pub type Result<T> = std::result::Result<T, VaultError>;
