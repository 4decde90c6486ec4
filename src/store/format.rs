//! On-disk store format and atomic file IO.
//!
//! A store file has this layout:
//!
//! ```text
//! [SPVT: 4 bytes][version: 1 byte][document JSON]
//! ```
//!
//! - **Magic** (`SPVT`): identifies the file as a SecurePass store.
//! - **Version**: format version (currently `1`).
//! - **Document JSON**: the serialized `StoreDocument` holding all
//!   three collections.
//!
//! The whole store is one document, so writes and clears are atomic at
//! the filesystem level: writes go to a same-directory temp file that
//! is renamed over the target, and a clear removes the file outright.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{Result, VaultError};

use super::records::{CredentialEntry, VaultConfig};

/// Magic bytes at the start of every store file.
const MAGIC: &[u8; 4] = b"SPVT";

/// Current on-disk format version.
pub const CURRENT_VERSION: u8 = 1;

/// Fixed-size prefix: 4 (magic) + 1 (version).
const PREFIX_LEN: usize = 5;

/// The three persisted collections, serialized as one JSON document.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct StoreDocument {
    /// The vault-config singleton.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<VaultConfig>,

    /// Credential entries keyed by id.
    #[serde(default)]
    pub entries: BTreeMap<String, CredentialEntry>,

    /// Free-form settings keyed by name.
    #[serde(default)]
    pub settings: BTreeMap<String, serde_json::Value>,
}

/// Read the store document from disk.
///
/// A missing file is not an error — it is simply an empty store that
/// has never been written.
pub fn read_document(path: &Path) -> Result<Option<StoreDocument>> {
    if !path.exists() {
        return Ok(None);
    }

    let data = fs::read(path)?;

    if data.len() < PREFIX_LEN {
        return Err(VaultError::Storage(
            "file too small to be a valid store".into(),
        ));
    }

    if &data[0..4] != MAGIC {
        return Err(VaultError::Storage("missing SPVT magic bytes".into()));
    }

    let version = data[4];
    if version != CURRENT_VERSION {
        return Err(VaultError::Storage(format!(
            "unsupported store version {version}, expected {CURRENT_VERSION}"
        )));
    }

    let document: StoreDocument = serde_json::from_slice(&data[PREFIX_LEN..])
        .map_err(|e| VaultError::Storage(format!("store JSON: {e}")))?;

    Ok(Some(document))
}

/// Write the store document to disk **atomically**.
///
/// 1. Serialize the document to JSON.
/// 2. Write magic + version + JSON to a temp file in the same directory.
/// 3. Rename the temp file over the target path.
///
/// The rename ensures readers never see a half-written file.
pub fn write_document(path: &Path, document: &StoreDocument) -> Result<()> {
    let body = serde_json::to_vec(document)
        .map_err(|e| VaultError::Serialization(format!("store document: {e}")))?;

    let mut buf = Vec::with_capacity(PREFIX_LEN + body.len());
    buf.extend_from_slice(MAGIC);
    buf.push(CURRENT_VERSION);
    buf.extend_from_slice(&body);

    let parent = path.parent().unwrap_or(Path::new("."));
    if !parent.as_os_str().is_empty() && !parent.exists() {
        fs::create_dir_all(parent)?;
    }

    let tmp_path = parent.join(format!(
        ".{}.tmp",
        path.file_name().unwrap_or_default().to_string_lossy()
    ));

    fs::write(&tmp_path, &buf)?;
    fs::rename(&tmp_path, path)?;

    Ok(())
}

/// Remove the store file, clearing every collection in one step.
///
/// Idempotent: a store that was never written is already clear.
pub fn remove_document(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
