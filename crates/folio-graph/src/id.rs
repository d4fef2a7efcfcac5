//! Node identifiers and content digests.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Opaque node identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Wrap an existing identifier string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Deterministic, namespaced id generator.
///
/// Ids are UUID v5 of the seed under a namespace derived from the owner name,
/// so the same seed always maps to the same node across builds while two
/// owners using the same seed never collide.
#[derive(Debug, Clone)]
pub struct NodeIdGenerator {
    namespace: Uuid,
}

impl NodeIdGenerator {
    /// Create a generator scoped to `owner` (usually a plugin name).
    pub fn new(owner: &str) -> Self {
        Self {
            namespace: Uuid::new_v5(&Uuid::NAMESPACE_URL, owner.as_bytes()),
        }
    }

    /// Derive the id for `seed`.
    pub fn create_node_id(&self, seed: &str) -> NodeId {
        NodeId(Uuid::new_v5(&self.namespace, seed.as_bytes()).to_string())
    }
}

/// SHA-256 hex digest of `content`, used as a node's `contentDigest`.
pub fn content_digest(content: impl AsRef<[u8]>) -> String {
    hex::encode(Sha256::digest(content.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_deterministic() {
        let ids = NodeIdGenerator::new("folio-source");
        assert_eq!(
            ids.create_node_id("https://example.com/a.png"),
            ids.create_node_id("https://example.com/a.png")
        );
        assert_ne!(
            ids.create_node_id("https://example.com/a.png"),
            ids.create_node_id("https://example.com/b.png")
        );
    }

    #[test]
    fn test_namespaces_do_not_collide() {
        let a = NodeIdGenerator::new("folio-source");
        let b = NodeIdGenerator::new("folio-filesystem");
        assert_ne!(a.create_node_id("seed"), b.create_node_id("seed"));
    }

    #[test]
    fn test_content_digest() {
        let digest = content_digest("hello");
        assert_eq!(digest.len(), 64);
        assert_eq!(digest, content_digest(b"hello"));
        assert_ne!(digest, content_digest("hello!"));
    }
}
