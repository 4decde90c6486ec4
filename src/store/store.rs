//! The `VaultStore` persistence handle.
//!
//! Pure storage over three collections: the vault-config singleton,
//! credential entries by id, and settings by name.  It stores exactly
//! what it is given and knows nothing about encryption — every
//! confidential payload arrives already sealed.
//!
//! The backing file is loaded lazily on first access; querying a store
//! that has never been written returns "not found" rather than an
//! error.  Every mutation is persisted immediately with an atomic
//! write, so a crash between calls never loses acknowledged data.

use std::path::{Path, PathBuf};

use super::format::{self, StoreDocument};
use super::records::{CredentialEntry, VaultConfig};
use crate::errors::Result;

/// File-backed store handle.
pub struct VaultStore {
    /// Path to the store file on disk.
    path: PathBuf,

    /// Lazily loaded document cache.
    document: Option<StoreDocument>,
}

impl VaultStore {
    /// Create a handle for the store file at `path`.
    ///
    /// Does not touch the filesystem; the file is read on first access
    /// and created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            document: None,
        }
    }

    /// Returns the path to the store file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    // ------------------------------------------------------------------
    // Vault config
    // ------------------------------------------------------------------

    /// Fetch the vault-config singleton, if one has been written.
    pub fn config(&mut self) -> Result<Option<VaultConfig>> {
        Ok(self.document()?.config.clone())
    }

    /// Write the vault-config singleton.
    pub fn put_config(&mut self, config: VaultConfig) -> Result<()> {
        self.document()?.config = Some(config);
        self.persist()
    }

    /// Remove the vault-config singleton.
    pub fn delete_config(&mut self) -> Result<()> {
        self.document()?.config = None;
        self.persist()
    }

    // ------------------------------------------------------------------
    // Credential entries
    // ------------------------------------------------------------------

    /// Fetch a single entry by id.
    pub fn entry(&mut self, id: &str) -> Result<Option<CredentialEntry>> {
        Ok(self.document()?.entries.get(id).cloned())
    }

    /// Insert or replace an entry, keyed by its id.
    pub fn put_entry(&mut self, entry: CredentialEntry) -> Result<()> {
        self.document()?.entries.insert(entry.id.clone(), entry);
        self.persist()
    }

    /// Delete an entry by id.  Deleting an unknown id is a no-op.
    pub fn delete_entry(&mut self, id: &str) -> Result<()> {
        self.document()?.entries.remove(id);
        self.persist()
    }

    /// Fetch every stored entry.
    pub fn all_entries(&mut self) -> Result<Vec<CredentialEntry>> {
        Ok(self.document()?.entries.values().cloned().collect())
    }

    // ------------------------------------------------------------------
    // Settings
    // ------------------------------------------------------------------

    /// Fetch a named setting.
    pub fn setting(&mut self, name: &str) -> Result<Option<serde_json::Value>> {
        Ok(self.document()?.settings.get(name).cloned())
    }

    /// Write a named setting.  Writing `null` deletes the value.
    pub fn put_setting(&mut self, name: &str, value: serde_json::Value) -> Result<()> {
        if value.is_null() {
            self.document()?.settings.remove(name);
        } else {
            self.document()?.settings.insert(name.to_string(), value);
        }
        self.persist()
    }

    /// Remove a named setting.  Removing an unknown name is a no-op.
    pub fn delete_setting(&mut self, name: &str) -> Result<()> {
        self.document()?.settings.remove(name);
        self.persist()
    }

    // ------------------------------------------------------------------
    // Bulk clear
    // ------------------------------------------------------------------

    /// Clear all three collections in one atomic step.
    ///
    /// The store is a single file, so removing it clears everything or
    /// fails leaving prior state untouched.
    pub fn clear_all(&mut self) -> Result<()> {
        format::remove_document(&self.path)?;
        self.document = Some(StoreDocument::default());
        Ok(())
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// Lazily load the backing file into the cache.
    fn document(&mut self) -> Result<&mut StoreDocument> {
        if self.document.is_none() {
            self.document = Some(format::read_document(&self.path)?.unwrap_or_default());
        }
        // The line above guarantees the cache is populated.
        Ok(self.document.get_or_insert_with(StoreDocument::default))
    }

    /// Write the cached document to disk atomically.
    fn persist(&mut self) -> Result<()> {
        if let Some(document) = &self.document {
            format::write_document(&self.path, document)?;
        }
        Ok(())
    }
}
