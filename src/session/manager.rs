//! The vault session state machine.
//!
//! A vault is in one of three states:
//!
//! - **Uninitialized** — no vault config exists in the store.
//! - **Locked** — a config exists but no key is held in memory.
//! - **Unlocked** — a validated key is in memory and an idle deadline
//!   is running.
//!
//! `SessionManager` orchestrates the crypto layer and the store to move
//! between them: initialize, unlock (password or recovery key), lock,
//! idle timeout, reset, session export/restore, and the entry and TOTP
//! operations that require an unlocked session.  Every operation checks
//! the idle deadline first, so an expired session fails closed before
//! any work happens.
//!
//! State transitions are serialized by construction: all methods take
//! `&mut self`, and the `api` layer wraps one manager in a mutex for
//! concurrent callers.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use url::Url;
use zeroize::Zeroize;

use crate::config::Settings;
use crate::crypto::encryption::{self, SealedBlob};
use crate::crypto::kdf::{self, KdfParams};
use crate::crypto::keys::{ExportedKey, VaultKey};
use crate::errors::{Result, VaultError};
use crate::store::records::{
    CredentialEntry, EntryFields, StoredKdfParams, VaultConfig, CONFIG_VERSION,
};
use crate::store::VaultStore;
use crate::totp::{self, TotpEnrollment};

use super::recovery;

/// Fixed id of the sentinel entry used to validate candidate keys.
/// Filtered out of every listing; callers never see it.
const TEST_ENTRY_ID: &str = "entry_key_check";

/// Setting slot holding the recovery key sealed under the master key.
const SETTING_RECOVERY_KEY: &str = "recovery_key";

/// Setting slot holding the TOTP secret sealed under the master key.
const SETTING_TOTP: &str = "totp";

/// Why a session left the Unlocked state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockReason {
    /// `lock()` was called.
    Explicit,
    /// The idle deadline passed with no activity.
    IdleTimeout,
    /// The vault was reset.
    Reset,
}

/// Callback invoked on every transition out of Unlocked.
pub type LockObserver = Box<dyn Fn(LockReason) + Send + Sync>;

/// Sentinel payload sealed into the test entry at vault creation.
/// Successful decryption is the key-correctness oracle.
#[derive(Serialize, Deserialize)]
struct KeyCheck {
    check: String,
}

const KEY_CHECK_VALUE: &str = "securepass";

/// An unlocked session: the key plus its idle deadline.
struct Session {
    key: VaultKey,
    unlocked_at: DateTime<Utc>,
    deadline: Instant,
}

/// Caller-supplied fields for saving an entry; timestamps are assigned
/// by the engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntryDraft {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub notes: String,
}

/// A decrypted entry returned by listing operations.
#[derive(Debug, Clone, Serialize)]
pub struct DecryptedEntry {
    pub id: String,
    #[serde(flatten)]
    pub fields: EntryFields,
}

/// Subset of entry fields returned for domain-scoped lookups.
#[derive(Debug, Clone, Serialize)]
pub struct DomainMatch {
    pub id: String,
    pub title: String,
    pub username: String,
    pub password: String,
}

/// Exportable session state for continuity across a process restart.
///
/// Contains live key material — callers must keep it only in a
/// session-scoped store that is cleared when the OS session ends.
#[derive(Clone, Serialize, Deserialize)]
pub struct SessionExport {
    pub key: ExportedKey,
    pub config: VaultConfig,
    pub timestamp: DateTime<Utc>,
}

/// The vault lifecycle coordinator.  One instance per vault; owns the
/// store handle and at most one in-memory key.
pub struct SessionManager {
    store: VaultStore,
    kdf_params: KdfParams,
    idle_timeout: Duration,
    session: Option<Session>,
    lock_observer: Option<LockObserver>,
}

impl SessionManager {
    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    /// Create a manager over `store` using KDF and timeout settings.
    pub fn new(store: VaultStore, settings: &Settings) -> Self {
        Self {
            store,
            kdf_params: settings.kdf_params(),
            idle_timeout: settings.idle_timeout(),
            session: None,
            lock_observer: None,
        }
    }

    /// Override the idle window (e.g. from a user preference).
    pub fn set_idle_timeout(&mut self, timeout: Duration) {
        self.idle_timeout = timeout;
    }

    /// Register a callback fired on every transition out of Unlocked.
    pub fn set_lock_observer(&mut self, observer: LockObserver) {
        self.lock_observer = Some(observer);
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Returns `true` if a vault config exists in the store.
    pub fn vault_exists(&mut self) -> Result<bool> {
        Ok(self.store.config()?.is_some())
    }

    /// Create a new vault and unlock it.
    ///
    /// Returns the plaintext recovery key.  This is the only time it is
    /// handed out unprompted — the caller must display it to the user,
    /// who can later re-read it via `reveal_recovery_key` while
    /// unlocked.
    pub fn initialize(&mut self, master_password: &str) -> Result<String> {
        // 1. Refuse if a vault already exists.
        if self.store.config()?.is_some() {
            return Err(VaultError::VaultAlreadyExists);
        }

        // 2. Derive the master key under a fresh salt.
        let salt = kdf::generate_salt()?;
        let mut key_bytes =
            kdf::derive_master_key(master_password.as_bytes(), &salt, &self.kdf_params)?;
        let key = VaultKey::new(key_bytes);
        key_bytes.zeroize();

        // 3. Issue an independent recovery key and wrap the master key
        //    under a second derivation from it.
        let recovery_key = recovery::generate()?;
        let recovery_salt = kdf::generate_salt()?;
        let mut recovery_bytes = kdf::derive_master_key(
            recovery::normalize(&recovery_key).as_bytes(),
            &recovery_salt,
            &self.kdf_params,
        )?;
        let recovery_derived = VaultKey::new(recovery_bytes);
        recovery_bytes.zeroize();
        let recovery_wrap = encryption::seal(&recovery_derived, &key.export())?;

        // 4. Persist the vault config with both salt sets and the wrap.
        self.store.put_config(VaultConfig {
            version: CONFIG_VERSION,
            salt: salt.to_vec(),
            kdf: StoredKdfParams {
                memory_kib: self.kdf_params.memory_kib,
                iterations: self.kdf_params.iterations,
                parallelism: self.kdf_params.parallelism,
            },
            created: Utc::now(),
            recovery_salt: Some(recovery_salt.to_vec()),
            recovery_wrap: Some(recovery_wrap),
        })?;

        // 5. Write the sentinel future unlocks will be validated against.
        let sealed_check = encryption::seal(
            &key,
            &KeyCheck {
                check: KEY_CHECK_VALUE.to_string(),
            },
        )?;
        let now = Utc::now();
        self.store.put_entry(CredentialEntry {
            id: TEST_ENTRY_ID.to_string(),
            sealed: sealed_check,
            url: String::new(),
            created: now,
            modified: now,
        })?;

        // 6. Keep a copy of the recovery key readable from an unlocked
        //    session.
        let sealed_recovery = encryption::seal(&key, &recovery_key)?;
        self.store.put_setting(
            SETTING_RECOVERY_KEY,
            serde_json::to_value(sealed_recovery)
                .map_err(|e| VaultError::Serialization(format!("recovery setting: {e}")))?,
        )?;

        // 7. The fresh vault starts unlocked.
        self.commit_session(key);
        info!("vault initialized");
        Ok(recovery_key)
    }

    /// Unlock with the master password, plus a one-time code if TOTP is
    /// enabled.  Commits the key only after every check passes.
    pub fn unlock(&mut self, master_password: &str, totp_code: Option<&str>) -> Result<()> {
        // 1. A vault must exist — its absence is not a credential error.
        let config = self.store.config()?.ok_or(VaultError::VaultNotFound)?;

        // 2. Derive a candidate key with the creation-time KDF settings.
        let params = kdf_params_from(&config.kdf);
        let mut candidate_bytes =
            kdf::derive_master_key(master_password.as_bytes(), &config.salt, &params)?;
        let candidate = VaultKey::new(candidate_bytes);
        candidate_bytes.zeroize();

        // 3. The sentinel decides whether the candidate is correct.
        match self.check_key(&candidate) {
            Ok(()) => {}
            Err(VaultError::DecryptionFailed) => return Err(VaultError::InvalidCredentials),
            Err(e) => return Err(e),
        }

        // 4. TOTP gate, verified with the now-validated key.
        self.verify_totp_gate(&candidate, totp_code)?;

        // 5. Only on full success: commit and start the idle window.
        self.commit_session(candidate);
        debug!("vault unlocked");
        Ok(())
    }

    /// Unlock with the recovery key issued at initialization.
    ///
    /// The recovery-derived key unwraps a copy of the master key; the
    /// unwrapped key is still validated against the sentinel before it
    /// is trusted.  No TOTP gate applies on this path — the recovery
    /// key is treated as its own second factor.
    pub fn unlock_with_recovery_key(&mut self, recovery_key: &str) -> Result<()> {
        let config = self.store.config()?.ok_or(VaultError::VaultNotFound)?;

        let (Some(recovery_salt), Some(recovery_wrap)) =
            (config.recovery_salt.clone(), config.recovery_wrap.clone())
        else {
            return Err(VaultError::RecoveryUnavailable);
        };

        let params = kdf_params_from(&config.kdf);
        let mut recovery_bytes = kdf::derive_master_key(
            recovery::normalize(recovery_key).as_bytes(),
            &recovery_salt,
            &params,
        )?;
        let recovery_derived = VaultKey::new(recovery_bytes);
        recovery_bytes.zeroize();

        let exported: ExportedKey = encryption::open(&recovery_derived, &recovery_wrap)
            .map_err(|_| VaultError::InvalidRecoveryKey)?;
        let key = VaultKey::import(&exported).map_err(|_| VaultError::InvalidRecoveryKey)?;

        if self.check_key(&key).is_err() {
            return Err(VaultError::InvalidRecoveryKey);
        }

        self.commit_session(key);
        debug!("vault unlocked via recovery key");
        Ok(())
    }

    /// Lock the vault.  Idempotent; zeroes the in-memory key.
    pub fn lock(&mut self) {
        self.transition_locked(LockReason::Explicit);
    }

    /// Restart the idle window.  No-op unless Unlocked.
    pub fn reset_lock_timer(&mut self) {
        self.expire_if_idle();
        self.touch();
    }

    /// Returns `true` if a session is active and not past its deadline.
    pub fn is_unlocked(&mut self) -> bool {
        self.expire_if_idle();
        self.session.is_some()
    }

    /// Access the session key.  Fails closed when locked or expired.
    pub fn current_key(&mut self) -> Result<&VaultKey> {
        self.expire_if_idle();
        self.session_key()
    }

    /// Destroy the vault: clears all collections and locks.
    ///
    /// The store clear is atomic — on failure prior state is unchanged
    /// and the session is kept.
    pub fn reset(&mut self) -> Result<()> {
        self.store.clear_all()?;
        self.transition_locked(LockReason::Reset);
        info!("vault reset, all collections cleared");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Session export / restore
    // ------------------------------------------------------------------

    /// Export the live session for continuity across a process restart.
    ///
    /// Returns `None` when locked.  The caller owns the obligation to
    /// keep the export in an ephemeral, OS-session-scoped store.
    pub fn export_session_state(&mut self) -> Result<Option<SessionExport>> {
        self.expire_if_idle();
        if self.session.is_none() {
            return Ok(None);
        }

        let config = self.store.config()?.ok_or(VaultError::VaultNotFound)?;
        let Some(session) = self.session.as_ref() else {
            return Ok(None);
        };

        Ok(Some(SessionExport {
            key: session.key.export(),
            config,
            timestamp: Utc::now(),
        }))
    }

    /// Restore a previously exported session.
    ///
    /// Imported key material is never trusted blindly: the key is
    /// re-validated against the sentinel before the session commits.
    pub fn restore_session_state(&mut self, state: &SessionExport) -> Result<()> {
        let key = VaultKey::import(&state.key)?;

        if self.store.config()?.is_none() {
            return Err(VaultError::SessionRestore("no vault exists".into()));
        }

        match self.check_key(&key) {
            Ok(()) => {}
            Err(VaultError::DecryptionFailed) => {
                return Err(VaultError::SessionRestore(
                    "restored key failed validation".into(),
                ));
            }
            Err(e) => return Err(e),
        }

        self.commit_session(key);
        debug!("session restored");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Recovery key and TOTP management
    // ------------------------------------------------------------------

    /// Decrypt and return the recovery key stored at initialization.
    /// Requires an unlocked session.
    pub fn reveal_recovery_key(&mut self) -> Result<String> {
        self.require_unlocked()?;

        let value = self
            .store
            .setting(SETTING_RECOVERY_KEY)?
            .ok_or(VaultError::RecoveryUnavailable)?;
        let blob: SealedBlob = serde_json::from_value(value)
            .map_err(|e| VaultError::Storage(format!("recovery setting: {e}")))?;

        let recovery_key: String = encryption::open(self.session_key()?, &blob)?;
        self.touch();
        Ok(recovery_key)
    }

    /// Returns `true` if a TOTP secret is enrolled.
    ///
    /// Deliberately callable while locked — the unlock screen needs to
    /// know whether to ask for a code.
    pub fn totp_enabled(&mut self) -> Result<bool> {
        Ok(self.store.setting(SETTING_TOTP)?.is_some())
    }

    /// Generate and enroll a TOTP secret, sealed under the session key.
    pub fn enable_totp(&mut self) -> Result<TotpEnrollment> {
        self.require_unlocked()?;

        let enrollment = totp::generate_secret()?;
        let blob = encryption::seal(self.session_key()?, &enrollment.secret)?;
        self.store.put_setting(
            SETTING_TOTP,
            serde_json::to_value(blob)
                .map_err(|e| VaultError::Serialization(format!("totp setting: {e}")))?,
        )?;

        self.touch();
        info!("TOTP second factor enabled");
        Ok(enrollment)
    }

    /// Remove the enrolled TOTP secret.
    pub fn disable_totp(&mut self) -> Result<()> {
        self.require_unlocked()?;
        self.store.delete_setting(SETTING_TOTP)?;
        self.touch();
        info!("TOTP second factor disabled");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Entry operations (all require Unlocked, all extend the session)
    // ------------------------------------------------------------------

    /// Seal and store an entry.  A caller-supplied id updates that
    /// entry in place (preserving its creation time); otherwise a fresh
    /// id is generated.  Returns the entry id.
    pub fn save_entry(&mut self, draft: EntryDraft, id: Option<String>) -> Result<String> {
        self.require_unlocked()?;

        let now = Utc::now();
        let (id, created) = match id {
            Some(id) => {
                let created = self.store.entry(&id)?.map_or(now, |e| e.created);
                (id, created)
            }
            None => (fresh_entry_id()?, now),
        };

        let body = EntryFields {
            title: draft.title,
            url: draft.url,
            username: draft.username,
            password: draft.password,
            notes: draft.notes,
            created,
            modified: now,
        };
        let sealed = encryption::seal(self.session_key()?, &body)?;

        self.store.put_entry(CredentialEntry {
            id: id.clone(),
            sealed,
            url: body.url.clone(),
            created,
            modified: now,
        })?;

        self.touch();
        Ok(id)
    }

    /// Decrypt and return every entry.
    ///
    /// A record that fails to decrypt is logged and skipped rather than
    /// failing the whole listing — one corrupt entry must not block
    /// access to the rest of the vault.
    pub fn entries(&mut self) -> Result<Vec<DecryptedEntry>> {
        self.require_unlocked()?;

        let stored = self.store.all_entries()?;
        let mut out = Vec::with_capacity(stored.len());

        for entry in stored {
            if entry.id == TEST_ENTRY_ID {
                continue;
            }
            match encryption::open::<EntryFields>(self.session_key()?, &entry.sealed) {
                Ok(fields) => out.push(DecryptedEntry {
                    id: entry.id,
                    fields,
                }),
                Err(_) => warn!(id = %entry.id, "skipping entry that failed to decrypt"),
            }
        }

        self.touch();
        Ok(out)
    }

    /// Delete an entry by id.  Unknown ids are a no-op.
    pub fn delete_entry(&mut self, id: &str) -> Result<()> {
        self.require_unlocked()?;

        // The sentinel is not caller-visible and must never be deleted.
        if id != TEST_ENTRY_ID {
            self.store.delete_entry(id)?;
        }

        self.touch();
        Ok(())
    }

    /// Return the entries whose stored URL has exactly the same
    /// hostname as `raw_url`.  No subdomain matching: `a.example.com`
    /// does not match `example.com`.  Stored entries whose URL fails to
    /// parse are skipped.
    pub fn entries_for_url(&mut self, raw_url: &str) -> Result<Vec<DomainMatch>> {
        self.require_unlocked()?;

        let host = host_of(raw_url)
            .ok_or_else(|| VaultError::Serialization(format!("not a valid URL: {raw_url}")))?;

        let stored = self.store.all_entries()?;
        let mut out = Vec::new();

        for entry in stored {
            if entry.id == TEST_ENTRY_ID || entry.url.is_empty() {
                continue;
            }
            let Some(entry_host) = host_of(&entry.url) else {
                continue;
            };
            if entry_host != host {
                continue;
            }
            match encryption::open::<EntryFields>(self.session_key()?, &entry.sealed) {
                Ok(fields) => out.push(DomainMatch {
                    id: entry.id,
                    title: fields.title,
                    username: fields.username,
                    password: fields.password,
                }),
                Err(_) => warn!(id = %entry.id, "skipping entry that failed to decrypt"),
            }
        }

        self.touch();
        Ok(out)
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// Validate a candidate key by opening the sentinel entry.
    fn check_key(&mut self, key: &VaultKey) -> Result<()> {
        let entry = self
            .store
            .entry(TEST_ENTRY_ID)?
            .ok_or_else(|| VaultError::Storage("key-check entry missing".into()))?;

        let check: KeyCheck = encryption::open(key, &entry.sealed)?;
        if check.check != KEY_CHECK_VALUE {
            return Err(VaultError::DecryptionFailed);
        }
        Ok(())
    }

    /// Enforce the TOTP gate when a secret is enrolled.
    fn verify_totp_gate(&mut self, key: &VaultKey, totp_code: Option<&str>) -> Result<()> {
        let Some(value) = self.store.setting(SETTING_TOTP)? else {
            return Ok(());
        };

        let code = totp_code.ok_or(VaultError::TotpRequired)?;

        let blob: SealedBlob = serde_json::from_value(value)
            .map_err(|e| VaultError::Storage(format!("totp setting: {e}")))?;
        let secret: String = encryption::open(key, &blob)?;

        if totp::verify_code(&secret, code.trim(), unix_now())? {
            Ok(())
        } else {
            Err(VaultError::InvalidTotp)
        }
    }

    /// Commit a validated key and start the idle window.
    fn commit_session(&mut self, key: VaultKey) {
        self.session = Some(Session {
            key,
            unlocked_at: Utc::now(),
            deadline: Instant::now() + self.idle_timeout,
        });
    }

    /// Lock if the idle deadline has passed.
    fn expire_if_idle(&mut self) {
        let expired = self
            .session
            .as_ref()
            .is_some_and(|s| Instant::now() >= s.deadline);
        if expired {
            self.transition_locked(LockReason::IdleTimeout);
        }
    }

    /// Drop the session (zeroing the key) and notify the observer.
    /// Does nothing if already locked, keeping `lock()` idempotent.
    fn transition_locked(&mut self, reason: LockReason) {
        if let Some(session) = self.session.take() {
            debug!(?reason, unlocked_at = %session.unlocked_at, "vault locked");
            drop(session);
            if let Some(observer) = &self.lock_observer {
                observer(reason);
            }
        }
    }

    /// Fail closed unless a live session exists.
    fn require_unlocked(&mut self) -> Result<()> {
        self.expire_if_idle();
        if self.session.is_some() {
            Ok(())
        } else {
            Err(VaultError::VaultLocked)
        }
    }

    /// Borrow the session key (call after `require_unlocked`).
    fn session_key(&self) -> Result<&VaultKey> {
        self.session
            .as_ref()
            .map(|s| &s.key)
            .ok_or(VaultError::VaultLocked)
    }

    /// Extend the idle window from now.  No-op when locked.
    fn touch(&mut self) {
        let timeout = self.idle_timeout;
        if let Some(session) = self.session.as_mut() {
            session.deadline = Instant::now() + timeout;
        }
    }
}

/// Convert stored KDF params back into derivation params.
fn kdf_params_from(stored: &StoredKdfParams) -> KdfParams {
    KdfParams {
        memory_kib: stored.memory_kib,
        iterations: stored.iterations,
        parallelism: stored.parallelism,
    }
}

/// Extract the hostname of a URL, if it has one.
fn host_of(raw: &str) -> Option<String> {
    Url::parse(raw)
        .ok()
        .and_then(|u| u.host_str().map(str::to_owned))
}

/// Current unix time in whole seconds.
fn unix_now() -> u64 {
    Utc::now().timestamp().max(0) as u64
}

/// Generate a unique entry id: `entry_<unix_millis>_<random hex>`.
fn fresh_entry_id() -> Result<String> {
    use rand::rngs::OsRng;
    use rand::TryRngCore;

    let mut suffix = [0u8; 4];
    OsRng
        .try_fill_bytes(&mut suffix)
        .map_err(|e| VaultError::RandomFailed(format!("OS RNG unavailable: {e}")))?;

    Ok(format!(
        "entry_{}_{:08x}",
        Utc::now().timestamp_millis(),
        u32::from_be_bytes(suffix)
    ))
}
