//! Typed helpers layered over [`CacheBucket`].

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::CacheBucket;

/// JSON convenience methods for any [`CacheBucket`].
///
/// Kept out of [`CacheBucket`] itself so the base trait stays object-safe and
/// implementors only deal in bytes.
pub trait CacheBucketExt: CacheBucket {
    /// Read and decode a JSON value. Decoding failures count as a miss.
    fn get_json<T: DeserializeOwned>(&self, key: &str, etag: &str) -> Option<T> {
        let bytes = self.get(key, etag)?;
        match serde_json::from_slice(&bytes) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::debug!(key, error = %e, "discarding undecodable cache entry");
                None
            }
        }
    }

    /// Encode `value` as JSON and store it.
    fn set_json<T: Serialize>(&self, key: &str, etag: &str, value: &T) {
        if let Ok(bytes) = serde_json::to_vec(value) {
            self.set(key, etag, &bytes);
        }
    }
}

impl<B: CacheBucket + ?Sized> CacheBucketExt for B {}
