//! Atomic JSON document storage.
//!
//! # Design Notes
//!
//! - **Atomic writes**: Write to temp file, then rename (prevents corruption)
//! - **Default init**: Missing or unparsable documents are replaced with a
//!   caller-supplied default and repaired on disk
//! - **No caching**: Every load reads the file, every save rewrites it

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// Error type for document store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// IO error (permission denied, disk full, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Save a document to disk.
///
/// # Atomic Write Strategy
///
/// 1. Write to `{file}.tmp` in the same directory
/// 2. Rename to `{file}`
///
/// A concurrent reader never observes a partially written file.
pub fn save_document<T: Serialize>(path: &Path, doc: &T) -> Result<(), StoreError> {
    // Ensure the parent directory exists before writing
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }

    let temp_path = temp_path_for(path);

    // Serialize to pretty JSON for readability (users may inspect these files)
    let json = serde_json::to_string_pretty(doc)?;

    // Write to temp file first
    fs::write(&temp_path, json)?;

    // Atomic rename
    fs::rename(&temp_path, path)?;

    Ok(())
}

/// Load a document from disk, falling back to `default`.
///
/// If the file is absent or its content fails to parse, `default` is
/// written in its place and returned. Corrupt content is repaired, not
/// surfaced as an error; only I/O failures propagate.
pub fn load_or_init<T>(path: &Path, default: T) -> Result<T, StoreError>
where
    T: Serialize + DeserializeOwned,
{
    if path.exists() {
        let contents = fs::read_to_string(path)?;
        match serde_json::from_str(&contents) {
            Ok(doc) => return Ok(doc),
            Err(e) => {
                log::warn!(
                    "replacing unparsable document {}: {e}",
                    path.display()
                );
            }
        }
    }

    save_document(path, &default)?;
    Ok(default)
}

fn temp_path_for(path: &Path) -> std::path::PathBuf {
    let mut os = path.as_os_str().to_os_string();
    os.push(".tmp");
    std::path::PathBuf::from(os)
}

// ============================================================================
// TESTS
// ============================================================================
