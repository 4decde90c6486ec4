//! Store module — persistence for vault records.
//!
//! This module provides:
//! - Persisted record types (`records`)
//! - The on-disk envelope and atomic file IO (`format`)
//! - The crypto-unaware `VaultStore` handle over the three
//!   collections: config, entries, settings (`store`)

pub mod format;
pub mod records;
pub mod store;

// Re-export the most commonly used items.
pub use records::{CredentialEntry, EntryFields, StoredKdfParams, VaultConfig, CONFIG_VERSION};
pub use store::VaultStore;
