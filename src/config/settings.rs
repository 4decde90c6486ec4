use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::crypto::kdf::KdfParams;
use crate::errors::{Result, VaultError};

/// Engine configuration, loaded from `.securepass.toml`.
///
/// Every field has a sensible default so the engine works out-of-the-box
/// without any config file at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Directory (relative to the profile root) where the store file lives.
    #[serde(default = "default_store_dir")]
    pub store_dir: String,

    /// Argon2 memory cost in KiB (default: 64 MB).
    #[serde(default = "default_argon2_memory_kib")]
    pub argon2_memory_kib: u32,

    /// Argon2 iteration count (default: 3).
    #[serde(default = "default_argon2_iterations")]
    pub argon2_iterations: u32,

    /// Argon2 parallelism degree (default: 4).
    #[serde(default = "default_argon2_parallelism")]
    pub argon2_parallelism: u32,

    /// Seconds of inactivity before an unlocked vault locks itself.
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_store_dir() -> String {
    ".securepass".to_string()
}

fn default_argon2_memory_kib() -> u32 {
    65_536 // 64 MB
}

fn default_argon2_iterations() -> u32 {
    3
}

fn default_argon2_parallelism() -> u32 {
    4
}

fn default_idle_timeout_secs() -> u64 {
    900 // 15 minutes
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for Settings {
    fn default() -> Self {
        Self {
            store_dir: default_store_dir(),
            argon2_memory_kib: default_argon2_memory_kib(),
            argon2_iterations: default_argon2_iterations(),
            argon2_parallelism: default_argon2_parallelism(),
            idle_timeout_secs: default_idle_timeout_secs(),
        }
    }
}

impl Settings {
    /// Name of the config file we look for in the profile root.
    const FILE_NAME: &'static str = ".securepass.toml";

    /// Load settings from `<profile_dir>/.securepass.toml`.
    ///
    /// If the file does not exist, sensible defaults are returned.
    /// If the file exists but cannot be parsed, an error is returned.
    pub fn load(profile_dir: &Path) -> Result<Self> {
        let config_path = profile_dir.join(Self::FILE_NAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)?;

        let settings: Settings = toml::from_str(&contents).map_err(|e| {
            VaultError::Storage(format!("Failed to parse {}: {e}", config_path.display()))
        })?;

        Ok(settings)
    }

    /// Build the full path to the store file under a profile directory.
    ///
    /// Example: `profile_dir/.securepass/securepass.vault`
    pub fn store_path(&self, profile_dir: &Path) -> PathBuf {
        profile_dir.join(&self.store_dir).join("securepass.vault")
    }

    /// Convert the Argon2 settings into crypto-layer params.
    pub fn kdf_params(&self) -> KdfParams {
        KdfParams {
            memory_kib: self.argon2_memory_kib,
            iterations: self.argon2_iterations,
            parallelism: self.argon2_parallelism,
        }
    }

    /// The idle window as a `Duration`.
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}

// ── Tests ────────────────────────────────────────────────────────────
