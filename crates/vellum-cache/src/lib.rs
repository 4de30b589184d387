//! Persistent blob cache for Vellum.
//!
//! The cache stores opaque binary blobs (most importantly the serialized
//! database image) between sessions. Consumers depend on the [`BlobCache`]
//! trait rather than a concrete store, so the cache can be disabled without
//! touching call sites.
//!
//! # Implementations
//!
//! - [`FileBlobCache`]: one file per key under a root directory, with a
//!   format-version marker that wipes stale entries on mismatch
//! - [`NullBlobCache`]: no-op implementation (always misses)
//!
//! # Example
//!
//! ```
//! use vellum_cache::{BlobCache, NullBlobCache};
//!
//! let cache = NullBlobCache;
//! cache.set("database", b"\x00\x01");
//! assert_eq!(cache.get("database"), None); // NullBlobCache always misses
//! ```

mod file;
pub use file::FileBlobCache;

/// Key-value store for binary blobs.
///
/// All operations are best-effort: a failed `set` or `remove` is silently
/// dropped and a failed `get` reads as a miss. Callers must always be able to
/// recover from a miss (for the database image that means re-fetching it from
/// the remote endpoint).
pub trait BlobCache: Send + Sync {
    /// Retrieve a cached blob, or `None` on miss.
    fn get(&self, key: &str) -> Option<Vec<u8>>;

    /// Store a blob, overwriting any existing entry for the same key.
    fn set(&self, key: &str, value: &[u8]);

    /// Remove a cached blob. Removing an absent key is a no-op.
    fn remove(&self, key: &str);
}

/// No-op [`BlobCache`] that never stores or retrieves data.
///
/// Used when caching is disabled: every `get` misses, so the session loader
/// falls through to the remote fetch on each load.
pub struct NullBlobCache;

impl BlobCache for NullBlobCache {
    fn get(&self, _key: &str) -> Option<Vec<u8>> {
        None
    }

    fn set(&self, _key: &str, _value: &[u8]) {}

    fn remove(&self, _key: &str) {}
}
