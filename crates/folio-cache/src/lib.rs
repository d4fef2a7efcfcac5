//! Build cache for Folio.
//!
//! Consumers (currently the remote file fetcher) talk to the cache through two
//! object-safe traits:
//!
//! - [`Cache`]: hands out named buckets
//! - [`CacheBucket`]: byte values keyed by string, validated by an etag
//!
//! A cache is an optimization only. Every implementation swallows its own I/O
//! failures and reports them as misses, so a broken cache directory can slow a
//! build down but never fail it.
//!
//! # Implementations
//!
//! - [`NullCache`]: caching disabled, every lookup misses
//! - [`MemoryCache`]: process-local maps, used by tests and one-shot builds
//! - [`FileCache`]: on-disk buckets under a versioned root directory
//!
//! # Example
//!
//! ```
//! use folio_cache::{Cache, MemoryCache};
//!
//! let cache = MemoryCache::new();
//! let bucket = cache.bucket("remote-files");
//! bucket.set("https://example.com/a.png", "", b"{\"path\":\"a.png\"}");
//! assert!(bucket.get("https://example.com/a.png", "").is_some());
//! ```

mod ext;
mod file;
mod memory;

pub use ext::CacheBucketExt;
pub use file::FileCache;
pub use memory::MemoryCache;

/// A named partition of a [`Cache`].
///
/// A hit requires the key to exist **and** the stored etag to equal the
/// requested one. An empty requested etag accepts whatever etag was stored.
pub trait CacheBucket: Send + Sync {
    /// Look up `key`, returning its bytes on a hit.
    fn get(&self, key: &str, etag: &str) -> Option<Vec<u8>>;

    /// Store `value` under `key`, replacing any previous entry.
    fn set(&self, key: &str, etag: &str, value: &[u8]);

    /// Drop the entry for `key` if present.
    fn remove(&self, key: &str);
}

/// Factory for isolated [`CacheBucket`]s.
pub trait Cache: Send + Sync {
    /// Open (or create) the bucket called `name`.
    ///
    /// Handles returned for the same name share storage.
    fn bucket(&self, name: &str) -> Box<dyn CacheBucket>;
}

/// Bucket that forgets everything it is given.
pub struct NullCacheBucket;

impl CacheBucket for NullCacheBucket {
    fn get(&self, _key: &str, _etag: &str) -> Option<Vec<u8>> {
        None
    }

    fn set(&self, _key: &str, _etag: &str, _value: &[u8]) {}

    fn remove(&self, _key: &str) {}
}

/// [`Cache`] used when caching is turned off (`--no-cache`).
pub struct NullCache;

impl Cache for NullCache {
    fn bucket(&self, _name: &str) -> Box<dyn CacheBucket> {
        Box::new(NullCacheBucket)
    }
}
