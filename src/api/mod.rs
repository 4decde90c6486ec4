//! The request/response contract consumed by UI callers.
//!
//! Each operation the popup or content layer can invoke is one variant
//! of `VaultRequest`; each success payload is one variant of
//! `VaultReply`.  `VaultService` owns the session manager behind a
//! mutex so concurrent callers are serialized through every state
//! transition, and `response_json` renders the wire shape:
//! `{ "ok": true, ...payload }` on success, or
//! `{ "ok": false, "errorKind": ..., "message": ... }` on failure.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::crypto::password::{self, CharsetOptions};
use crate::errors::Result;
use crate::session::{
    DecryptedEntry, DomainMatch, EntryDraft, LockObserver, SessionManager,
};
use crate::totp::TotpEnrollment;

/// Every operation a caller can request.
#[derive(Debug, Clone, Deserialize)]
pub enum VaultRequest {
    VaultExists,
    Initialize {
        password: String,
    },
    Unlock {
        password: String,
        #[serde(default)]
        totp_code: Option<String>,
    },
    UnlockWithRecovery {
        recovery_key: String,
    },
    Lock,
    IsUnlocked,
    SaveEntry {
        #[serde(flatten)]
        entry: EntryDraft,
        #[serde(default)]
        id: Option<String>,
    },
    GetAllEntries,
    DeleteEntry {
        id: String,
    },
    GenerateEntropyPassword {
        #[serde(default = "default_password_length")]
        length: usize,
        #[serde(default)]
        options: CharsetOptions,
    },
    ResetIdleTimer,
    ResetVault,
    GetEntriesForDomain {
        url: String,
    },
    GetRecoveryKey,
    GetTotpStatus,
    EnableTotp,
    DisableTotp,
}

fn default_password_length() -> usize {
    16
}

/// Success payloads, one variant per operation family.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum VaultReply {
    Exists {
        exists: bool,
    },
    RecoveryKey {
        recovery_key: String,
    },
    Unlocked {
        is_unlocked: bool,
    },
    EntrySaved {
        id: String,
    },
    Entries {
        entries: Vec<DecryptedEntry>,
    },
    DomainEntries {
        entries: Vec<DomainMatch>,
    },
    Password {
        password: String,
    },
    TotpStatus {
        enabled: bool,
    },
    Totp {
        #[serde(flatten)]
        enrollment: TotpEnrollment,
    },
    Done,
}

/// The engine facade handed to the UI host.
///
/// Wraps one `SessionManager` in a mutex: state transitions are
/// serialized, so concurrent unlock attempts cannot race the timer or
/// key state.
pub struct VaultService {
    manager: Mutex<SessionManager>,
}

impl VaultService {
    /// Wrap a session manager for concurrent callers.
    pub fn new(manager: SessionManager) -> Self {
        Self {
            manager: Mutex::new(manager),
        }
    }

    /// Register the observer notified when the vault locks (explicitly
    /// or by idle timeout).
    pub fn set_lock_observer(&self, observer: LockObserver) {
        self.lock_manager().set_lock_observer(observer);
    }

    /// Dispatch one request to the engine.
    pub fn handle(&self, request: VaultRequest) -> Result<VaultReply> {
        let mut manager = self.lock_manager();

        match request {
            VaultRequest::VaultExists => Ok(VaultReply::Exists {
                exists: manager.vault_exists()?,
            }),
            VaultRequest::Initialize { password } => Ok(VaultReply::RecoveryKey {
                recovery_key: manager.initialize(&password)?,
            }),
            VaultRequest::Unlock {
                password,
                totp_code,
            } => {
                manager.unlock(&password, totp_code.as_deref())?;
                Ok(VaultReply::Done)
            }
            VaultRequest::UnlockWithRecovery { recovery_key } => {
                manager.unlock_with_recovery_key(&recovery_key)?;
                Ok(VaultReply::Done)
            }
            VaultRequest::Lock => {
                manager.lock();
                Ok(VaultReply::Done)
            }
            VaultRequest::IsUnlocked => Ok(VaultReply::Unlocked {
                is_unlocked: manager.is_unlocked(),
            }),
            VaultRequest::SaveEntry { entry, id } => Ok(VaultReply::EntrySaved {
                id: manager.save_entry(entry, id)?,
            }),
            VaultRequest::GetAllEntries => Ok(VaultReply::Entries {
                entries: manager.entries()?,
            }),
            VaultRequest::DeleteEntry { id } => {
                manager.delete_entry(&id)?;
                Ok(VaultReply::Done)
            }
            VaultRequest::GenerateEntropyPassword { length, options } => {
                Ok(VaultReply::Password {
                    password: password::generate_password(length, &options)?,
                })
            }
            VaultRequest::ResetIdleTimer => {
                manager.reset_lock_timer();
                Ok(VaultReply::Done)
            }
            VaultRequest::ResetVault => {
                manager.reset()?;
                Ok(VaultReply::Done)
            }
            VaultRequest::GetEntriesForDomain { url } => Ok(VaultReply::DomainEntries {
                entries: manager.entries_for_url(&url)?,
            }),
            VaultRequest::GetRecoveryKey => Ok(VaultReply::RecoveryKey {
                recovery_key: manager.reveal_recovery_key()?,
            }),
            VaultRequest::GetTotpStatus => Ok(VaultReply::TotpStatus {
                enabled: manager.totp_enabled()?,
            }),
            VaultRequest::EnableTotp => Ok(VaultReply::Totp {
                enrollment: manager.enable_totp()?,
            }),
            VaultRequest::DisableTotp => {
                manager.disable_totp()?;
                Ok(VaultReply::Done)
            }
        }
    }

    /// Dispatch one request and render the JSON wire shape.
    pub fn handle_json(&self, request: VaultRequest) -> Value {
        response_json(&self.handle(request))
    }

    /// Acquire the manager, recovering from mutex poisoning.  Store
    /// writes are atomic, so a panicked caller leaves no partial state.
    fn lock_manager(&self) -> std::sync::MutexGuard<'_, SessionManager> {
        self.manager
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

/// Render a handler result as the JSON wire envelope.
pub fn response_json(result: &Result<VaultReply>) -> Value {
    match result {
        Ok(reply) => match serde_json::to_value(reply) {
            Ok(Value::Object(mut map)) => {
                map.insert("ok".to_string(), Value::Bool(true));
                Value::Object(map)
            }
            // Unit replies and serialization oddities still acknowledge.
            _ => json!({ "ok": true }),
        },
        Err(e) => json!({
            "ok": false,
            "errorKind": e.kind(),
            "message": e.to_string(),
        }),
    }
}
