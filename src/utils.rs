//! Shared helpers for locating and preparing the local store file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::store::SqliteStore;

/// Directory name under the platform data directory.
pub const APP_DIR: &str = "notekeeper";

/// Gets the cross-platform store path.
///
/// Returns the path as `{data_dir}/notekeeper/notes.db` where `data_dir` is:
/// - Linux: `~/.local/share`
/// - macOS: `~/Library/Application Support`
/// - Windows: `C:\Users\<user>\AppData\Roaming`
///
/// # Errors
///
/// Returns an error if the data directory cannot be determined.
pub fn get_store_path() -> Result<PathBuf> {
    let data_dir =
        dirs::data_dir().ok_or_else(|| anyhow::anyhow!("Failed to determine data directory"))?;

    Ok(data_dir.join(APP_DIR).join("notes.db"))
}

/// Ensures the parent directory of the store file exists.
///
/// Creates the directory structure if it doesn't exist using `create_dir_all`.
///
/// # Errors
///
/// Returns an error if directory creation fails.
pub fn ensure_store_directory(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create store directory: {}", parent.display()))?;
    }
    Ok(())
}

/// Opens the SQLite store at `path`, or at the default location when `None`.
///
/// # Errors
///
/// Returns an error if the path cannot be resolved or the file cannot be opened.
pub fn open_store(path: Option<&Path>) -> Result<SqliteStore> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => get_store_path()?,
    };
    ensure_store_directory(&path)?;
    SqliteStore::open(&path)
        .with_context(|| format!("Failed to open local store: {}", path.display()))
}
