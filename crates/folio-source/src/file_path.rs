//! URL path derivation from a document's source file.

use folio_graph::{FileContent, Node, NodeLookup};

use crate::error::AnnotateError;

/// Parent hops tolerated before giving up on finding the file node.
const MAX_DEPTH: usize = 16;

/// Derive the URL path of a document from its source file.
///
/// Walks the parent chain to the nearest `File` node and converts its
/// source-relative path: the extension is dropped, an `index` file maps to
/// its directory, and the result has a leading and a trailing slash.
///
/// - `post.mdx` -> `/post/`
/// - `2023/hello/index.mdx` -> `/2023/hello/`
/// - `index.mdx` -> `/`
pub fn create_file_path(node: &Node, lookup: &dyn NodeLookup) -> Result<String, AnnotateError> {
    let file = find_file(node, lookup)
        .ok_or_else(|| AnnotateError::MissingFileNode(node.id.clone()))?;
    Ok(file_path_to_slug(&file))
}

fn find_file(node: &Node, lookup: &dyn NodeLookup) -> Option<FileContent> {
    let mut current = lookup.get_node(node.parent.as_ref()?)?;
    for _ in 0..MAX_DEPTH {
        if let Some(file) = current.as_file() {
            return Some(file.clone());
        }
        current = lookup.get_node(current.parent.as_ref()?)?;
    }
    None
}

fn file_path_to_slug(file: &FileContent) -> String {
    let without_ext = file
        .relative_path
        .strip_suffix(&file.ext)
        .filter(|_| !file.ext.is_empty())
        .unwrap_or(&file.relative_path);

    let mut segments: Vec<&str> = without_ext.split('/').filter(|s| !s.is_empty()).collect();
    if segments.last() == Some(&"index") {
        segments.pop();
    }

    if segments.is_empty() {
        "/".to_owned()
    } else {
        format!("/{}/", segments.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::path::PathBuf;

    use super::*;
    use folio_graph::{Frontmatter, MdxContent, NodeId};
    use pretty_assertions::assert_eq;

    struct Nodes(HashMap<NodeId, Node>);

    impl NodeLookup for Nodes {
        fn get_node(&self, id: &NodeId) -> Option<Node> {
            self.0.get(id).cloned()
        }
    }

    fn file(relative_path: &str) -> FileContent {
        let ext = relative_path
            .rsplit_once('.')
            .map(|(_, e)| format!(".{e}"))
            .unwrap_or_default();
        FileContent {
            absolute_path: PathBuf::from("/repo/docs").join(relative_path),
            relative_path: relative_path.to_owned(),
            source_instance_name: "docs".to_owned(),
            name: String::new(),
            ext,
            url: None,
            media_type: None,
        }
    }

    fn doc(parent: Option<&str>) -> Node {
        Node::mdx(
            NodeId::new("doc"),
            parent.map(NodeId::new),
            "test",
            MdxContent {
                file_absolute_path: PathBuf::from("/repo/docs/x.mdx"),
                frontmatter: Frontmatter::default(),
                body: String::new(),
            },
            String::new(),
        )
    }

    #[test]
    fn test_slug_conversion() {
        assert_eq!(file_path_to_slug(&file("post.mdx")), "/post/");
        assert_eq!(file_path_to_slug(&file("2023/post.md")), "/2023/post/");
        assert_eq!(file_path_to_slug(&file("2023/hello/index.mdx")), "/2023/hello/");
        assert_eq!(file_path_to_slug(&file("index.mdx")), "/");
        assert_eq!(file_path_to_slug(&file("README")), "/README/");
        assert_eq!(file_path_to_slug(&file("v1.2/notes.mdx")), "/v1.2/notes/");
    }

    #[test]
    fn test_create_file_path_follows_parent() {
        let file_node = Node::file(
            NodeId::new("file"),
            None,
            "test",
            file("guides/setup.mdx"),
            String::new(),
        );
        let lookup = Nodes(HashMap::from([(NodeId::new("file"), file_node)]));

        assert_eq!(
            create_file_path(&doc(Some("file")), &lookup).unwrap(),
            "/guides/setup/"
        );
    }

    #[test]
    fn test_create_file_path_without_file_parent() {
        let lookup = Nodes(HashMap::new());
        let result = create_file_path(&doc(None), &lookup);
        assert!(matches!(result, Err(AnnotateError::MissingFileNode(_))));

        let result = create_file_path(&doc(Some("missing")), &lookup);
        assert!(matches!(result, Err(AnnotateError::MissingFileNode(_))));
    }
}
