//! In-memory cache implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::{Cache, CacheBucket};

type Entries = HashMap<String, (String, Vec<u8>)>;

/// Process-local [`Cache`].
///
/// Buckets with the same name share one map, so a value written through one
/// handle is visible through every other handle for that bucket.
#[derive(Default)]
pub struct MemoryCache {
    buckets: RwLock<HashMap<String, Arc<RwLock<Entries>>>>,
}

impl MemoryCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Cache for MemoryCache {
    fn bucket(&self, name: &str) -> Box<dyn CacheBucket> {
        let mut buckets = self
            .buckets
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let entries = buckets.entry(name.to_owned()).or_default();
        Box::new(MemoryCacheBucket {
            entries: Arc::clone(entries),
        })
    }
}

struct MemoryCacheBucket {
    entries: Arc<RwLock<Entries>>,
}

impl CacheBucket for MemoryCacheBucket {
    fn get(&self, key: &str, etag: &str) -> Option<Vec<u8>> {
        let entries = self.entries.read().ok()?;
        let (stored_etag, value) = entries.get(key)?;
        if !etag.is_empty() && stored_etag != etag {
            return None;
        }
        Some(value.clone())
    }

    fn set(&self, key: &str, etag: &str, value: &[u8]) {
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(key.to_owned(), (etag.to_owned(), value.to_vec()));
        }
    }

    fn remove(&self, key: &str) {
        if let Ok(mut entries) = self.entries.write() {
            entries.remove(key);
        }
    }
}
