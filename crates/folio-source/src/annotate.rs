//! Document node annotation.
//!
//! Every freshly created `Mdx` node gets three derived fields:
//!
//! - `slug`: URL path, prefixed with the source root the document lives in
//! - `owner`: the [`OWNER_NAME`] sentinel marking source-root content
//! - `parent`: the resolved source root name (empty when none matched)
//!
//! Documents with a `featuredImageUrl` additionally get the downloaded image
//! linked under `featuredImageUrlSharp`.

use std::path::{Component, Path};

use folio_config::SourceRoots;
use folio_graph::{LINK_SUFFIX, MDX_TYPE, Node, NodeActions, NodeLookup};
use serde_json::Value;

use crate::error::AnnotateError;
use crate::file_path::create_file_path;
use crate::remote::RemoteFileNodeCreator;
use crate::{IMAGE_FIELD, OWNER_NAME, PLUGIN_NAME};

/// What [`NodeAnnotator::annotate`] did with a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotateOutcome {
    /// Fields were attached.
    Annotated,
    /// Not a document, or already annotated.
    Skipped,
}

/// Attaches derived fields to document nodes.
pub struct NodeAnnotator {
    source: Option<SourceRoots>,
    remote: Option<RemoteFileNodeCreator>,
}

impl NodeAnnotator {
    /// Create an annotator for the configured source roots.
    ///
    /// Featured images are not fetched until [`with_remote_files`] is used.
    ///
    /// [`with_remote_files`]: Self::with_remote_files
    pub fn new(source: Option<SourceRoots>) -> Self {
        Self {
            source,
            remote: None,
        }
    }

    /// Download featured images through `creator`.
    #[must_use]
    pub fn with_remote_files(mut self, creator: RemoteFileNodeCreator) -> Self {
        self.remote = Some(creator);
        self
    }

    /// Annotate `node` if it is an unclaimed document.
    ///
    /// # Errors
    ///
    /// Returns [`AnnotateError`] if the document has no file node, a field
    /// cannot be set, or its featured image cannot be fetched. All of these
    /// are fatal for the build.
    pub fn annotate(
        &self,
        node: &Node,
        actions: &dyn NodeActions,
        lookup: &dyn NodeLookup,
    ) -> Result<AnnotateOutcome, AnnotateError> {
        let Some(mdx) = node.as_mdx().filter(|_| node.type_name() == MDX_TYPE) else {
            return Ok(AnnotateOutcome::Skipped);
        };
        if node.has_field_owners() {
            tracing::debug!(id = %node.id, "document already annotated");
            return Ok(AnnotateOutcome::Skipped);
        }

        let relative = create_file_path(node, lookup)?;
        let prefix = source_prefix(self.source.as_ref(), &mdx.file_absolute_path);
        let slug = if prefix.is_empty() {
            relative
        } else {
            format!("/{prefix}{relative}")
        };
        tracing::debug!(id = %node.id, %slug, parent = %prefix, "annotating document");

        let fields = [
            ("slug", slug),
            ("owner", OWNER_NAME.to_owned()),
            ("parent", prefix),
        ];
        for (name, value) in fields {
            actions.create_node_field(&node.id, PLUGIN_NAME, name, Value::String(value))?;
        }

        let featured = mdx
            .frontmatter
            .featured_image_url
            .as_deref()
            .filter(|url| !url.trim().is_empty());
        if let (Some(url), Some(remote)) = (featured, &self.remote) {
            let file = remote
                .create_remote_file_node(url, &node.id, actions)
                .map_err(|source| AnnotateError::RemoteFile {
                    node: node.id.clone(),
                    url: url.to_owned(),
                    source,
                })?;
            actions.link_node(&node.id, &format!("{IMAGE_FIELD}{LINK_SUFFIX}"), &file.id)?;
        }

        Ok(AnnotateOutcome::Annotated)
    }
}

/// Source root prefix for a document at `path`.
///
/// A single configured root is used as is. With several roots, every path
/// component naming a configured root is kept, in path order, and the
/// matches are concatenated without a separator.
pub fn source_prefix(source: Option<&SourceRoots>, path: &Path) -> String {
    match source {
        None => String::new(),
        Some(SourceRoots::Single(name)) => name.clone(),
        Some(roots @ SourceRoots::Many(_)) => path
            .components()
            .filter_map(|c| match c {
                Component::Normal(s) => s.to_str(),
                _ => None,
            })
            .filter(|segment| roots.contains(segment))
            .collect(),
    }
}
