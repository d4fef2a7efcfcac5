//! Node model.
//!
//! A [`Node`] serializes to the JSON shape the query engine filters on:
//! camelCase keys, type-specific content flattened to the top level, derived
//! fields under `fields`, and links as `<name>___NODE` keys.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::id::NodeId;

/// Internal type tag of document nodes.
pub const MDX_TYPE: &str = "Mdx";
/// Internal type tag of file nodes.
pub const FILE_TYPE: &str = "File";

/// Suffix marking a link key (`featuredImageUrlSharp___NODE`).
pub const LINK_SUFFIX: &str = "___NODE";

/// A node of the content graph.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: NodeId,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub internal: Internal,
    #[serde(flatten)]
    pub content: NodeContent,
    /// Derived fields attached through `create_node_field`.
    pub fields: BTreeMap<String, Value>,
    /// Link keys (ending in [`LINK_SUFFIX`]) to other node ids.
    #[serde(flatten)]
    pub links: BTreeMap<String, NodeId>,
}

/// Bookkeeping owned by the graph.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Internal {
    #[serde(rename = "type")]
    pub type_name: String,
    pub content_digest: String,
    /// Plugin that created the node.
    pub owner: String,
    /// Field name to the plugin that set it. Empty until the first
    /// `create_node_field` call on this node.
    pub field_owners: BTreeMap<String, String>,
}

/// Type-specific node payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum NodeContent {
    Mdx(MdxContent),
    File(FileContent),
}

/// A content document parsed from an `.mdx` / `.md` file.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MdxContent {
    pub file_absolute_path: PathBuf,
    pub frontmatter: Frontmatter,
    pub body: String,
}

/// A file on disk, either sourced from a content directory or downloaded.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileContent {
    pub absolute_path: PathBuf,
    /// Path relative to the source directory, `/`-separated.
    pub relative_path: String,
    /// Name of the source directory (or `__remote` for downloads).
    pub source_instance_name: String,
    /// File stem.
    pub name: String,
    /// Extension including the dot (`.mdx`), empty when there is none.
    pub ext: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
}

/// Structured document frontmatter.
///
/// The known keys are typed; scalar values of any YAML type are accepted and
/// kept as their string form (`date: 2023-01-01`, `title: 2024`). Unknown
/// keys are preserved in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Frontmatter {
    #[serde(
        default,
        deserialize_with = "scalar_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub title: Option<String>,
    #[serde(
        default,
        deserialize_with = "scalar_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub navigation_label: Option<String>,
    #[serde(
        default,
        deserialize_with = "scalar_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub status: Option<String>,
    #[serde(
        default,
        deserialize_with = "scalar_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub date: Option<String>,
    #[serde(
        default,
        deserialize_with = "scalar_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub featured_image_url: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

fn scalar_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(Value::Bool(b)) => Some(b.to_string()),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(other @ (Value::Array(_) | Value::Object(_))) => {
            return Err(serde::de::Error::custom(format!(
                "expected a scalar, found {other}"
            )));
        }
    })
}

impl Node {
    /// Build a document node.
    pub fn mdx(
        id: NodeId,
        parent: Option<NodeId>,
        owner: &str,
        content: MdxContent,
        digest: String,
    ) -> Self {
        Self::with_content(id, parent, MDX_TYPE, owner, NodeContent::Mdx(content), digest)
    }

    /// Build a file node.
    pub fn file(
        id: NodeId,
        parent: Option<NodeId>,
        owner: &str,
        content: FileContent,
        digest: String,
    ) -> Self {
        Self::with_content(id, parent, FILE_TYPE, owner, NodeContent::File(content), digest)
    }

    fn with_content(
        id: NodeId,
        parent: Option<NodeId>,
        type_name: &str,
        owner: &str,
        content: NodeContent,
        content_digest: String,
    ) -> Self {
        Self {
            id,
            parent,
            children: Vec::new(),
            internal: Internal {
                type_name: type_name.to_owned(),
                content_digest,
                owner: owner.to_owned(),
                field_owners: BTreeMap::new(),
            },
            content,
            fields: BTreeMap::new(),
            links: BTreeMap::new(),
        }
    }

    /// Internal type tag.
    pub fn type_name(&self) -> &str {
        &self.internal.type_name
    }

    /// Document payload, if this is a document node.
    pub fn as_mdx(&self) -> Option<&MdxContent> {
        match &self.content {
            NodeContent::Mdx(mdx) => Some(mdx),
            NodeContent::File(_) => None,
        }
    }

    /// File payload, if this is a file node.
    pub fn as_file(&self) -> Option<&FileContent> {
        match &self.content {
            NodeContent::File(file) => Some(file),
            NodeContent::Mdx(_) => None,
        }
    }

    /// Derived string field, if set.
    pub fn field_str(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }

    /// Whether any plugin has attached fields to this node.
    pub fn has_field_owners(&self) -> bool {
        !self.internal.field_owners.is_empty()
    }

    /// JSON view used by queries.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn sample_mdx() -> Node {
        let frontmatter: Frontmatter = serde_yaml::from_str(
            "title: Hello\nnavigationLabel: Hi\ndate: 2023-01-01\ntags: [a, b]",
        )
        .unwrap();
        Node::mdx(
            NodeId::new("doc-1"),
            Some(NodeId::new("file-1")),
            "folio-filesystem",
            MdxContent {
                file_absolute_path: PathBuf::from("/repo/blog/post.mdx"),
                frontmatter,
                body: "Body".to_owned(),
            },
            "digest".to_owned(),
        )
    }

    #[test]
    fn test_frontmatter_accepts_scalars() {
        let fm: Frontmatter =
            serde_yaml::from_str("title: 2024\nstatus: true\ndate: 2023-03-01").unwrap();
        assert_eq!(fm.title.as_deref(), Some("2024"));
        assert_eq!(fm.status.as_deref(), Some("true"));
        assert_eq!(fm.date.as_deref(), Some("2023-03-01"));
        assert!(fm.featured_image_url.is_none());
    }

    #[test]
    fn test_frontmatter_rejects_nested_title() {
        let result: Result<Frontmatter, _> = serde_yaml::from_str("title:\n  nested: value");
        assert!(result.is_err());
    }

    #[test]
    fn test_query_view_shape() {
        let mut node = sample_mdx();
        node.fields.insert("slug".to_owned(), json!("/blog/post/"));
        node.links.insert(
            format!("featuredImageUrlSharp{LINK_SUFFIX}"),
            NodeId::new("img-1"),
        );

        let value = node.to_value();
        assert_eq!(value["id"], json!("doc-1"));
        assert_eq!(value["internal"]["type"], json!("Mdx"));
        assert_eq!(value["fileAbsolutePath"], json!("/repo/blog/post.mdx"));
        assert_eq!(value["frontmatter"]["navigationLabel"], json!("Hi"));
        assert_eq!(value["frontmatter"]["tags"], json!(["a", "b"]));
        assert_eq!(value["fields"]["slug"], json!("/blog/post/"));
        assert_eq!(value["featuredImageUrlSharp___NODE"], json!("img-1"));
    }

    #[test]
    fn test_accessors() {
        let node = sample_mdx();
        assert_eq!(node.type_name(), MDX_TYPE);
        assert!(node.as_mdx().is_some());
        assert!(node.as_file().is_none());
        assert!(!node.has_field_owners());
        assert_eq!(node.field_str("slug"), None);
    }
}
