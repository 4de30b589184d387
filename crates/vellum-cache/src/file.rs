//! File-based blob cache implementation.
//!
//! [`FileBlobCache`] stores each blob as a single file named after its key
//! under a root directory. On construction it validates a `FORMAT` marker
//! file in the root; if the marker mismatches or is missing, the entire
//! directory is wiped and recreated, so blobs written by an incompatible
//! build are never replayed into the current one.

use std::fs;
use std::path::{Path, PathBuf};

use crate::BlobCache;

/// File-based [`BlobCache`] rooted at a directory on disk.
///
/// Directory layout:
/// ```text
/// {root}/
/// +-- FORMAT             # contains the cache format string
/// +-- database           # blob for key "database"
/// +-- ...                # one file per key
/// ```
pub struct FileBlobCache {
    root: PathBuf,
}

impl FileBlobCache {
    /// Create a file-based cache at `root`, validating the cache format.
    ///
    /// If the `FORMAT` file inside `root` does not match `format`, the whole
    /// cache directory is removed and recreated with the new marker. Errors
    /// during validation are logged but never fatal.
    #[must_use]
    pub fn new(root: PathBuf, format: &str) -> Self {
        validate_format(&root, format);
        Self { root }
    }
}

impl BlobCache for FileBlobCache {
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        fs::read(self.root.join(key)).ok()
    }

    fn set(&self, key: &str, value: &[u8]) {
        if let Err(e) = fs::create_dir_all(&self.root) {
            tracing::warn!("failed to create cache directory: {e}");
            return;
        }
        if let Err(e) = fs::write(self.root.join(key), value) {
            tracing::warn!("failed to write cache entry {key}: {e}");
        }
    }

    fn remove(&self, key: &str) {
        let path = self.root.join(key);
        if path.exists()
            && let Err(e) = fs::remove_file(&path)
        {
            tracing::warn!("failed to remove cache entry {key}: {e}");
        }
    }
}

/// Validate the cache format marker, wiping the directory on mismatch.
fn validate_format(root: &Path, format: &str) {
    let marker = root.join("FORMAT");

    match fs::read_to_string(&marker) {
        Ok(stored) if stored == format => {
            tracing::debug!("cache format matches: {format}");
            return;
        }
        Ok(stored) => {
            tracing::info!("cache format mismatch (stored={stored}, current={format}), wiping cache");
        }
        Err(_) => {
            tracing::info!("no cache FORMAT file found, initializing cache");
        }
    }

    if root.exists()
        && let Err(e) = fs::remove_dir_all(root)
    {
        tracing::warn!("failed to remove cache directory: {e}");
    }
    if let Err(e) = fs::create_dir_all(root) {
        tracing::warn!("failed to create cache directory: {e}");
        return;
    }
    if let Err(e) = fs::write(&marker, format) {
        tracing::warn!("failed to write cache FORMAT file: {e}");
    }
}
