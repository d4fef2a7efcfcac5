//! Filesystem sourcing.
//!
//! Walks a source directory and creates one `File` node per file plus, for
//! every `.mdx` / `.md` file, a child `Mdx` node carrying the parsed
//! frontmatter and body. Hidden entries are skipped and directory entries are
//! visited in name order so node creation order is reproducible.

use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::actions::NodeActions;
use crate::error::LoadError;
use crate::id::{NodeIdGenerator, content_digest};
use crate::node::{FileContent, Frontmatter, MdxContent, Node};

/// Owner recorded on sourced nodes.
pub const FILESYSTEM_OWNER: &str = "folio-filesystem";

/// Extensions treated as documents.
const DOCUMENT_EXTENSIONS: &[&str] = &["mdx", "md"];

/// Counts from one [`load_source_dir`] call.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoadSummary {
    pub files: usize,
    pub documents: usize,
}

/// Source every file below `dir` as instance `name`.
///
/// A missing directory yields an empty summary and a warning.
///
/// # Errors
///
/// Returns [`LoadError`] when a file cannot be read, a document has invalid
/// frontmatter, or node creation fails.
pub fn load_source_dir(
    actions: &dyn NodeActions,
    name: &str,
    dir: &Path,
) -> Result<LoadSummary, LoadError> {
    let root = std::path::absolute(dir).map_err(|source| LoadError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut summary = LoadSummary::default();
    if !root.is_dir() {
        tracing::warn!(source = name, dir = %root.display(), "source directory does not exist");
        return Ok(summary);
    }

    let loader = Loader {
        actions,
        ids: NodeIdGenerator::new(FILESYSTEM_OWNER),
        name,
        root: &root,
    };
    loader.walk(&root, &mut summary)?;

    tracing::info!(
        source = name,
        files = summary.files,
        documents = summary.documents,
        "sourced content directory"
    );
    Ok(summary)
}

struct Loader<'a> {
    actions: &'a dyn NodeActions,
    ids: NodeIdGenerator,
    name: &'a str,
    root: &'a Path,
}

impl Loader<'_> {
    fn walk(&self, dir: &Path, summary: &mut LoadSummary) -> Result<(), LoadError> {
        let io_err = |source| LoadError::Io {
            path: dir.to_path_buf(),
            source,
        };
        let mut entries: Vec<_> = fs::read_dir(dir)
            .map_err(io_err)?
            .filter_map(Result::ok)
            .filter(|e| !e.file_name().to_string_lossy().starts_with('.'))
            .collect();
        entries.sort_by_key(fs::DirEntry::file_name);

        for entry in entries {
            let path = entry.path();
            if entry.file_type().is_ok_and(|t| t.is_dir()) {
                self.walk(&path, summary)?;
            } else {
                self.load_file(&path, summary)?;
            }
        }
        Ok(())
    }

    fn load_file(&self, path: &Path, summary: &mut LoadSummary) -> Result<(), LoadError> {
        let bytes = fs::read(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let seed = path.to_string_lossy();
        let file_id = self.ids.create_node_id(&seed);
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_default();

        let file = FileContent {
            absolute_path: path.to_path_buf(),
            relative_path: relative_path(self.root, path),
            source_instance_name: self.name.to_owned(),
            name: path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default(),
            ext: if ext.is_empty() {
                String::new()
            } else {
                format!(".{ext}")
            },
            url: None,
            media_type: None,
        };
        self.actions.create_node(Node::file(
            file_id.clone(),
            None,
            FILESYSTEM_OWNER,
            file,
            content_digest(&bytes),
        ))?;
        summary.files += 1;

        if !DOCUMENT_EXTENSIONS.contains(&ext.to_lowercase().as_str()) {
            return Ok(());
        }

        let text = String::from_utf8_lossy(&bytes);
        let (frontmatter, body) = parse_document(&text, path)?;
        let doc_id = self.ids.create_node_id(&format!("{file_id} >>> Mdx"));
        self.actions.create_node(Node::mdx(
            doc_id,
            Some(file_id),
            FILESYSTEM_OWNER,
            MdxContent {
                file_absolute_path: path.to_path_buf(),
                frontmatter,
                body: body.to_owned(),
            },
            content_digest(text.as_bytes()),
        ))?;
        summary.documents += 1;
        Ok(())
    }
}

/// `/`-joined path of `path` below `root`.
fn relative_path(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Split a document into parsed frontmatter and body.
///
/// Documents without a leading `---` fence have default frontmatter and the
/// whole text as body.
pub(crate) fn parse_document<'a>(
    text: &'a str,
    path: &Path,
) -> Result<(Frontmatter, &'a str), LoadError> {
    let Some((yaml, body)) = split_frontmatter(text) else {
        return Ok((Frontmatter::default(), text));
    };
    if yaml.trim().is_empty() {
        return Ok((Frontmatter::default(), body));
    }
    let frontmatter: Option<Frontmatter> =
        serde_yaml::from_str(yaml).map_err(|e| LoadError::Frontmatter {
            path: PathBuf::from(path),
            message: e.to_string(),
        })?;
    Ok((frontmatter.unwrap_or_default(), body))
}

fn split_frontmatter(text: &str) -> Option<(&str, &str)> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let rest = text.strip_prefix("---")?;
    let rest = rest
        .strip_prefix("\r\n")
        .or_else(|| rest.strip_prefix('\n'))?;

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == "---" {
            return Some((&rest[..offset], &rest[offset + line.len()..]));
        }
        offset += line.len();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::NodeLookup;
    use crate::graph::ContentGraph;
    use crate::node::{FILE_TYPE, MDX_TYPE};
    use pretty_assertions::assert_eq;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_split_frontmatter() {
        let (yaml, body) = split_frontmatter("---\ntitle: A\n---\n# Body\n").unwrap();
        assert_eq!(yaml, "title: A\n");
        assert_eq!(body, "# Body\n");

        let (yaml, body) = split_frontmatter("---\n---\nbody").unwrap();
        assert_eq!(yaml, "");
        assert_eq!(body, "body");

        assert!(split_frontmatter("# No frontmatter").is_none());
        assert!(split_frontmatter("---\ntitle: unterminated\n").is_none());
    }

    #[test]
    fn test_split_frontmatter_crlf() {
        let (yaml, body) = split_frontmatter("---\r\ntitle: A\r\n---\r\nbody").unwrap();
        assert_eq!(yaml, "title: A\r\n");
        assert_eq!(body, "body");
    }

    #[test]
    fn test_parse_document_invalid_yaml() {
        let result = parse_document("---\ntitle: [oops\n---\n", Path::new("bad.mdx"));
        let err = result.unwrap_err();
        assert!(matches!(err, LoadError::Frontmatter { .. }));
        assert!(err.to_string().contains("bad.mdx"));
    }

    #[test]
    fn test_relative_path() {
        assert_eq!(
            relative_path(Path::new("/repo/blog"), Path::new("/repo/blog/2023/post.mdx")),
            "2023/post.mdx"
        );
    }

    #[test]
    fn test_load_source_dir_creates_file_and_document_nodes() {
        let tmp = tempfile::tempdir().unwrap();
        let blog = tmp.path().join("blog");
        write(&blog, "post.mdx", "---\ntitle: Post\ndate: 2023-01-01\n---\nHello");
        write(&blog, "2023/index.md", "No frontmatter");
        write(&blog, "cover.png", "png");
        write(&blog, ".draft.mdx", "---\ntitle: Hidden\n---\n");

        let graph = ContentGraph::new();
        let summary = load_source_dir(&graph, "blog", &blog).unwrap();
        assert_eq!(summary, LoadSummary { files: 3, documents: 2 });

        let files = graph.nodes_of_type(FILE_TYPE);
        let rel: Vec<_> = files
            .iter()
            .map(|n| n.as_file().unwrap().relative_path.as_str())
            .collect();
        assert_eq!(rel, vec!["2023/index.md", "cover.png", "post.mdx"]);

        let docs = graph.nodes_of_type(MDX_TYPE);
        let post = docs
            .iter()
            .find(|d| d.as_mdx().unwrap().frontmatter.title.as_deref() == Some("Post"))
            .unwrap();
        assert_eq!(post.as_mdx().unwrap().body, "Hello");
        assert!(post.as_mdx().unwrap().file_absolute_path.is_absolute());

        let parent = graph.get_node(post.parent.as_ref().unwrap()).unwrap();
        let parent_file = parent.as_file().unwrap();
        assert_eq!(parent_file.relative_path, "post.mdx");
        assert_eq!(parent_file.source_instance_name, "blog");
        assert_eq!(parent_file.ext, ".mdx");
        assert_eq!(parent.children, vec![post.id.clone()]);
    }

    #[test]
    fn test_loading_twice_is_stable() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "a.mdx", "---\ntitle: A\n---\n");

        let graph = ContentGraph::new();
        load_source_dir(&graph, "docs", tmp.path()).unwrap();
        load_source_dir(&graph, "docs", tmp.path()).unwrap();

        assert_eq!(graph.len(), 2);
    }

    #[test]
    fn test_missing_dir_is_empty() {
        let graph = ContentGraph::new();
        let summary = load_source_dir(&graph, "docs", Path::new("/nonexistent/docs")).unwrap();
        assert_eq!(summary, LoadSummary::default());
        assert!(graph.is_empty());
    }
}
