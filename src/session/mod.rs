//! Session module — vault lifecycle orchestration.
//!
//! This module provides:
//! - Recovery-key generation and normalization (`recovery`)
//! - The `SessionManager` state machine: initialize, unlock, lock,
//!   idle timeout, session export/restore, TOTP gating and entry
//!   operations (`manager`)

pub mod manager;
pub mod recovery;

// Re-export the most commonly used items.
pub use manager::{
    DecryptedEntry, DomainMatch, EntryDraft, LockObserver, LockReason, SessionExport,
    SessionManager,
};
