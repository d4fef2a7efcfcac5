//! On-disk cache implementation.
//!
//! Each bucket is a subdirectory of the cache root and each entry a single
//! file laid out as:
//!
//! ```text
//! [etag_len: u32 LE][etag bytes][value bytes]
//! ```
//!
//! The root carries a `VERSION` file. Opening the cache with a different
//! version string (or finding no version at all) wipes the root, so entries
//! written by an incompatible build are never read back.

use std::fmt::Write as _;
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::{Cache, CacheBucket};

/// [`Cache`] rooted at a directory on disk.
///
/// ```text
/// {root}/
/// +-- VERSION
/// +-- remote-files/
///     +-- <encoded key>
/// ```
pub struct FileCache {
    root: PathBuf,
}

impl FileCache {
    /// Open the cache at `root`, wiping it first if `version` does not match
    /// the stored one.
    #[must_use]
    pub fn new(root: PathBuf, version: &str) -> Self {
        ensure_version(&root, version);
        Self { root }
    }

    /// Root directory of this cache.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Cache for FileCache {
    fn bucket(&self, name: &str) -> Box<dyn CacheBucket> {
        Box::new(FileCacheBucket {
            dir: self.root.join(name),
        })
    }
}

struct FileCacheBucket {
    dir: PathBuf,
}

impl FileCacheBucket {
    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(encode_key(key))
    }
}

impl CacheBucket for FileCacheBucket {
    fn get(&self, key: &str, etag: &str) -> Option<Vec<u8>> {
        let mut file = File::open(self.entry_path(key)).ok()?;

        let mut len_buf = [0u8; 4];
        file.read_exact(&mut len_buf).ok()?;
        let etag_len = u32::from_le_bytes(len_buf) as usize;

        let mut stored_etag = vec![0u8; etag_len];
        file.read_exact(&mut stored_etag).ok()?;
        if !etag.is_empty() && stored_etag != etag.as_bytes() {
            return None;
        }

        let mut value = Vec::new();
        file.read_to_end(&mut value).ok()?;
        Some(value)
    }

    fn set(&self, key: &str, etag: &str, value: &[u8]) {
        if let Err(e) = fs::create_dir_all(&self.dir) {
            tracing::warn!(dir = %self.dir.display(), error = %e, "cannot create cache bucket");
            return;
        }

        let Ok(etag_len) = u32::try_from(etag.len()) else {
            return;
        };
        let mut buf = Vec::with_capacity(4 + etag.len() + value.len());
        buf.extend_from_slice(&etag_len.to_le_bytes());
        buf.extend_from_slice(etag.as_bytes());
        buf.extend_from_slice(value);

        if let Err(e) = fs::write(self.entry_path(key), &buf) {
            tracing::warn!(key, error = %e, "cache write failed");
        }
    }

    fn remove(&self, key: &str) {
        let _ = fs::remove_file(self.entry_path(key));
    }
}

/// Map an arbitrary key (URLs included) to a single flat file name.
///
/// ASCII alphanumerics, `-`, `_` and `.` pass through; every other byte
/// becomes `%XX`. A leading `.` is escaped too so keys cannot name `..` or
/// hidden files.
fn encode_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for (i, byte) in key.bytes().enumerate() {
        let plain = byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.');
        if plain && !(i == 0 && byte == b'.') {
            out.push(char::from(byte));
        } else {
            let _ = write!(out, "%{byte:02X}");
        }
    }
    out
}

fn ensure_version(root: &Path, version: &str) {
    let version_file = root.join("VERSION");

    match fs::read_to_string(&version_file) {
        Ok(stored) if stored == version => {
            tracing::debug!(version, "cache version matches");
            return;
        }
        Ok(stored) => {
            tracing::info!(
                stored = %stored,
                current = version,
                "cache version changed, wiping cache"
            );
        }
        Err(_) => {
            tracing::info!(root = %root.display(), "initializing cache");
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
    if let Err(e) = fs::write(&version_file, version) {
        tracing::warn!("failed to write cache VERSION file: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open(tmp: &TempDir, version: &str) -> FileCache {
        FileCache::new(tmp.path().join("cache"), version)
    }

    #[test]
    fn test_set_then_get() {
        let tmp = TempDir::new().unwrap();
        let bucket = open(&tmp, "1").bucket("remote-files");

        bucket.set("https://example.com/cover.png", "e1", b"record");
        assert_eq!(
            bucket.get("https://example.com/cover.png", "e1"),
            Some(b"record".to_vec())
        );
        assert_eq!(bucket.get("https://example.com/cover.png", "e2"), None);
        assert_eq!(
            bucket.get("https://example.com/cover.png", ""),
            Some(b"record".to_vec())
        );
    }

    #[test]
    fn test_url_keys_stay_inside_bucket() {
        let tmp = TempDir::new().unwrap();
        let cache = open(&tmp, "1");
        cache.bucket("remote-files").set("../../escape", "", b"x");

        let entries: Vec<_> = fs::read_dir(cache.root().join("remote-files"))
            .unwrap()
            .collect();
        assert_eq!(entries.len(), 1);
        assert!(!tmp.path().join("escape").exists());
    }

    #[test]
    fn test_encode_key() {
        assert_eq!(encode_key("abc-1.png"), "abc-1.png");
        assert_eq!(encode_key("a/b"), "a%2Fb");
        assert_eq!(encode_key(".."), "%2E.");
    }

    #[test]
    fn test_remove() {
        let tmp = TempDir::new().unwrap();
        let bucket = open(&tmp, "1").bucket("remote-files");

        bucket.set("k", "", b"v");
        bucket.remove("k");
        assert_eq!(bucket.get("k", ""), None);
    }

    #[test]
    fn test_same_version_keeps_entries() {
        let tmp = TempDir::new().unwrap();
        open(&tmp, "1").bucket("remote-files").set("k", "", b"kept");

        assert_eq!(
            open(&tmp, "1").bucket("remote-files").get("k", ""),
            Some(b"kept".to_vec())
        );
    }

    #[test]
    fn test_version_change_wipes_entries() {
        let tmp = TempDir::new().unwrap();
        open(&tmp, "1").bucket("remote-files").set("k", "", b"stale");

        let cache = open(&tmp, "2");
        assert_eq!(cache.bucket("remote-files").get("k", ""), None);
        assert_eq!(
            fs::read_to_string(cache.root().join("VERSION")).unwrap(),
            "2"
        );
    }
}
