//! Remote featured-image download.
//!
//! [`RemoteFileNodeCreator`] turns a URL into a `File` node: the bytes are
//! fetched through a [`RemoteFetcher`], written below the assets directory,
//! and remembered in the `remote-files` cache bucket so a later build reuses
//! the stored file instead of downloading it again.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use folio_cache::{Cache, CacheBucket, CacheBucketExt};
use folio_graph::{FileContent, Node, NodeActions, NodeId, NodeIdGenerator, content_digest};
use serde::{Deserialize, Serialize};
use ureq::Agent;

use crate::PLUGIN_NAME;
use crate::error::FetchError;

/// Cache bucket holding url -> stored file records.
pub const REMOTE_FILES_BUCKET: &str = "remote-files";

/// `sourceInstanceName` of downloaded files.
pub const REMOTE_SOURCE_NAME: &str = "__remote";

/// Upper bound on a downloaded body.
const MAX_BODY_BYTES: u64 = 50 * 1024 * 1024;

/// Downloaded bytes plus the reported media type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    pub bytes: Vec<u8>,
    pub media_type: Option<String>,
}

/// Transport used to download remote files.
pub trait RemoteFetcher: Send + Sync {
    /// Download `url`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] on transport failure or a non-success status.
    fn fetch(&self, url: &str) -> Result<RemoteFile, FetchError>;
}

/// Blocking HTTP fetcher backed by a `ureq` agent.
pub struct UreqFetcher {
    agent: Agent,
}

impl UreqFetcher {
    /// Create a fetcher whose requests give up after `timeout`.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        let agent = Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .into();
        Self { agent }
    }
}

impl RemoteFetcher for UreqFetcher {
    fn fetch(&self, url: &str) -> Result<RemoteFile, FetchError> {
        tracing::debug!(url, "downloading remote file");
        let response = self.agent.get(url).call()?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            return Err(FetchError::Status {
                url: url.to_owned(),
                status,
            });
        }

        let media_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split_once(';').map_or(v, |(t, _)| t).trim().to_owned())
            .filter(|v| !v.is_empty());
        let bytes = response
            .into_body()
            .with_config()
            .limit(MAX_BODY_BYTES)
            .read_to_vec()?;

        Ok(RemoteFile { bytes, media_type })
    }
}

/// Cache record for a stored download.
#[derive(Debug, Serialize, Deserialize)]
struct StoredFile {
    /// Path relative to the store directory.
    relative_path: String,
    media_type: Option<String>,
    digest: String,
}

/// Downloads remote files and registers them as `File` nodes.
pub struct RemoteFileNodeCreator {
    fetcher: Box<dyn RemoteFetcher>,
    bucket: Box<dyn CacheBucket>,
    store_dir: PathBuf,
    ids: NodeIdGenerator,
}

impl RemoteFileNodeCreator {
    /// Create a creator storing downloads below `store_dir`.
    pub fn new(fetcher: Box<dyn RemoteFetcher>, cache: &dyn Cache, store_dir: PathBuf) -> Self {
        Self {
            fetcher,
            bucket: cache.bucket(REMOTE_FILES_BUCKET),
            store_dir,
            ids: NodeIdGenerator::new(PLUGIN_NAME),
        }
    }

    /// Directory downloads are written to.
    pub fn store_dir(&self) -> &Path {
        &self.store_dir
    }

    /// Fetch `url` (or reuse the stored copy) and create a `File` node for it
    /// as a child of `parent`.
    ///
    /// The node id depends only on the URL, so documents sharing an image
    /// share its node.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] if the URL is not http(s), the download fails,
    /// the file cannot be written, or the node cannot be created.
    pub fn create_remote_file_node(
        &self,
        url: &str,
        parent: &NodeId,
        actions: &dyn NodeActions,
    ) -> Result<Node, FetchError> {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(FetchError::InvalidUrl(url.to_owned()));
        }

        let stored = match self.cached(url) {
            Some(stored) => {
                tracing::debug!(url, path = %stored.relative_path, "reusing stored remote file");
                stored
            }
            None => self.download(url)?,
        };

        let (name, ext) = split_file_name(
            stored
                .relative_path
                .rsplit('/')
                .next()
                .unwrap_or(&stored.relative_path),
        );
        let content = FileContent {
            absolute_path: self.store_dir.join(&stored.relative_path),
            relative_path: stored.relative_path,
            source_instance_name: REMOTE_SOURCE_NAME.to_owned(),
            name,
            ext,
            url: Some(url.to_owned()),
            media_type: stored.media_type,
        };
        let node = Node::file(
            self.ids.create_node_id(url),
            Some(parent.clone()),
            PLUGIN_NAME,
            content,
            stored.digest,
        );
        actions.create_node(node.clone())?;
        Ok(node)
    }

    fn cached(&self, url: &str) -> Option<StoredFile> {
        let stored: StoredFile = self.bucket.get_json(url, "")?;
        if self.store_dir.join(&stored.relative_path).is_file() {
            Some(stored)
        } else {
            self.bucket.remove(url);
            None
        }
    }

    fn download(&self, url: &str) -> Result<StoredFile, FetchError> {
        let remote = self.fetcher.fetch(url)?;

        let (name, mut ext) = file_name_from_url(url);
        if ext.is_empty() {
            ext = remote
                .media_type
                .as_deref()
                .and_then(extension_for_media_type)
                .unwrap_or_default()
                .to_owned();
        }
        let relative_path = format!("{}/{name}{ext}", content_digest(url));
        let path = self.store_dir.join(&relative_path);

        let io_err = |source| FetchError::Io {
            path: path.clone(),
            source,
        };
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(io_err)?;
        }
        fs::write(&path, &remote.bytes).map_err(io_err)?;

        let stored = StoredFile {
            relative_path,
            media_type: remote.media_type,
            digest: content_digest(&remote.bytes),
        };
        self.bucket.set_json(url, "", &stored);
        tracing::info!(
            url,
            path = %path.display(),
            bytes = remote.bytes.len(),
            "stored remote file"
        );
        Ok(stored)
    }
}

/// File stem and extension (with dot) taken from the last URL path segment.
fn file_name_from_url(url: &str) -> (String, String) {
    let without_scheme = url.split_once("://").map_or(url, |(_, rest)| rest);
    let path = without_scheme
        .split(['?', '#'])
        .next()
        .unwrap_or(without_scheme);
    let segment = path
        .split_once('/')
        .map_or("", |(_, p)| p)
        .rsplit('/')
        .next()
        .unwrap_or("");

    let sanitized: String = segment
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    split_file_name(&sanitized)
}

fn split_file_name(file_name: &str) -> (String, String) {
    let (name, ext) = match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => (stem, format!(".{ext}")),
        _ => (file_name, String::new()),
    };
    let name = if name.is_empty() { "file" } else { name };
    (name.to_owned(), ext)
}

fn extension_for_media_type(media_type: &str) -> Option<&'static str> {
    Some(match media_type {
        "image/png" => ".png",
        "image/jpeg" => ".jpg",
        "image/gif" => ".gif",
        "image/webp" => ".webp",
        "image/avif" => ".avif",
        "image/svg+xml" => ".svg",
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use folio_cache::{MemoryCache, NullCache};
    use folio_graph::{ContentGraph, NodeLookup};
    use pretty_assertions::assert_eq;

    struct FakeFetcher {
        calls: Arc<AtomicUsize>,
        media_type: Option<&'static str>,
    }

    impl RemoteFetcher for FakeFetcher {
        fn fetch(&self, url: &str) -> Result<RemoteFile, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if url.contains("missing") {
                return Err(FetchError::Status {
                    url: url.to_owned(),
                    status: 404,
                });
            }
            Ok(RemoteFile {
                bytes: b"image-bytes".to_vec(),
                media_type: self.media_type.map(str::to_owned),
            })
        }
    }

    fn fetcher(media_type: Option<&'static str>) -> (Box<FakeFetcher>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let fetcher = Box::new(FakeFetcher {
            calls: Arc::clone(&calls),
            media_type,
        });
        (fetcher, calls)
    }

    fn graph_with_parent() -> (ContentGraph, NodeId) {
        let graph = ContentGraph::new();
        let parent = Node::file(
            NodeId::new("doc"),
            None,
            "test",
            FileContent {
                absolute_path: PathBuf::from("/repo/docs/a.mdx"),
                relative_path: "a.mdx".to_owned(),
                source_instance_name: "docs".to_owned(),
                name: "a".to_owned(),
                ext: ".mdx".to_owned(),
                url: None,
                media_type: None,
            },
            String::new(),
        );
        graph.create_node(parent).unwrap();
        (graph, NodeId::new("doc"))
    }

    #[test]
    fn test_file_name_from_url() {
        assert_eq!(
            file_name_from_url("https://cdn.example.com/img/cover.png?w=300#top"),
            ("cover".to_owned(), ".png".to_owned())
        );
        assert_eq!(
            file_name_from_url("https://example.com/photo"),
            ("photo".to_owned(), String::new())
        );
        assert_eq!(
            file_name_from_url("https://example.com/"),
            ("file".to_owned(), String::new())
        );
        assert_eq!(
            file_name_from_url("https://example.com/my%20pic.jpeg"),
            ("my_20pic".to_owned(), ".jpeg".to_owned())
        );
    }

    #[test]
    fn test_creates_file_node_under_parent() {
        let tmp = tempfile::tempdir().unwrap();
        let (graph, parent) = graph_with_parent();
        let (fetcher, _) = fetcher(Some("image/png"));
        let creator = RemoteFileNodeCreator::new(fetcher, &NullCache, tmp.path().to_path_buf());

        let url = "https://example.com/images/cover.png";
        let node = creator
            .create_remote_file_node(url, &parent, &graph)
            .unwrap();

        let file = node.as_file().unwrap();
        assert_eq!(file.name, "cover");
        assert_eq!(file.ext, ".png");
        assert_eq!(file.url.as_deref(), Some(url));
        assert_eq!(file.media_type.as_deref(), Some("image/png"));
        assert_eq!(file.source_instance_name, REMOTE_SOURCE_NAME);
        assert_eq!(
            file.relative_path,
            format!("{}/cover.png", content_digest(url))
        );
        assert_eq!(fs::read(&file.absolute_path).unwrap(), b"image-bytes");

        assert_eq!(node.id, NodeIdGenerator::new(PLUGIN_NAME).create_node_id(url));
        assert_eq!(node.internal.owner, PLUGIN_NAME);
        assert_eq!(graph.get_node(&parent).unwrap().children, vec![node.id]);
    }

    #[test]
    fn test_extension_from_media_type() {
        let tmp = tempfile::tempdir().unwrap();
        let (graph, parent) = graph_with_parent();
        let (fetcher, _) = fetcher(Some("image/jpeg"));
        let creator = RemoteFileNodeCreator::new(fetcher, &NullCache, tmp.path().to_path_buf());

        let node = creator
            .create_remote_file_node("https://example.com/photo?id=7", &parent, &graph)
            .unwrap();
        assert_eq!(node.as_file().unwrap().ext, ".jpg");
    }

    #[test]
    fn test_stored_file_is_reused() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = MemoryCache::new();
        let (graph, parent) = graph_with_parent();
        let url = "https://example.com/cover.png";

        let (first, first_calls) = fetcher(None);
        RemoteFileNodeCreator::new(first, &cache, tmp.path().to_path_buf())
            .create_remote_file_node(url, &parent, &graph)
            .unwrap();
        assert_eq!(first_calls.load(Ordering::SeqCst), 1);

        let (second, second_calls) = fetcher(None);
        let creator = RemoteFileNodeCreator::new(second, &cache, tmp.path().to_path_buf());
        let node = creator
            .create_remote_file_node(url, &parent, &graph)
            .unwrap();
        assert_eq!(second_calls.load(Ordering::SeqCst), 0);
        assert_eq!(node.internal.content_digest, content_digest(b"image-bytes"));

        // Deleted file forces a fresh download
        fs::remove_file(&node.as_file().unwrap().absolute_path).unwrap();
        creator
            .create_remote_file_node(url, &parent, &graph)
            .unwrap();
        assert_eq!(second_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_fetch_failure_is_returned() {
        let tmp = tempfile::tempdir().unwrap();
        let (graph, parent) = graph_with_parent();
        let (fetcher, _) = fetcher(None);
        let creator = RemoteFileNodeCreator::new(fetcher, &NullCache, tmp.path().to_path_buf());

        let result =
            creator.create_remote_file_node("https://example.com/missing.png", &parent, &graph);
        assert!(matches!(result, Err(FetchError::Status { status: 404, .. })));
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn test_rejects_non_http_url() {
        let tmp = tempfile::tempdir().unwrap();
        let (graph, parent) = graph_with_parent();
        let (fetcher, calls) = fetcher(None);
        let creator = RemoteFileNodeCreator::new(fetcher, &NullCache, tmp.path().to_path_buf());

        let result = creator.create_remote_file_node("./cover.png", &parent, &graph);
        assert!(matches!(result, Err(FetchError::InvalidUrl(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
