//! Source-root plugin for Folio.
//!
//! Hooks into the three build stages of a [`folio_graph::ContentGraph`]:
//!
//! 1. [`declare_schema`]: typed frontmatter and the featured image link
//! 2. [`NodeAnnotator::annotate`]: `slug`, `owner` and `parent` fields per
//!    document, plus the downloaded featured image
//! 3. [`generate_pages`]: one page per published document, newest first, with
//!    previous/next context
//!
//! [`SourcePlugin`] bundles the three stages behind the theme options.

mod annotate;
mod error;
mod file_path;
mod pages;
mod remote;
mod schema;

use folio_config::{SourceRoots, ThemeConfig};
use folio_graph::{
    Node, NodeActions, NodeLookup, PageActions, QueryRunner, Reporter, SchemaActions,
};

pub use annotate::{AnnotateOutcome, NodeAnnotator, source_prefix};
pub use error::{AnnotateError, FetchError, PagesError};
pub use file_path::create_file_path;
pub use pages::{
    NeighborFields, NeighborFrontmatter, NeighborSummary, SourcePageContext, generate_pages,
    source_documents_query,
};
pub use remote::{
    REMOTE_FILES_BUCKET, REMOTE_SOURCE_NAME, RemoteFetcher, RemoteFile, RemoteFileNodeCreator,
    UreqFetcher,
};
pub use schema::declare_schema;

/// Value of the `owner` field on annotated documents.
pub const OWNER_NAME: &str = "source";

/// Plugin name, recorded as the owner of every field and node it creates.
pub const PLUGIN_NAME: &str = "folio-source";

/// Link field holding the downloaded featured image.
pub const IMAGE_FIELD: &str = "featuredImageUrlSharp";

/// The plugin configured from theme options.
pub struct SourcePlugin {
    source: Option<SourceRoots>,
    layout: String,
    annotator: NodeAnnotator,
}

impl SourcePlugin {
    /// Create the plugin. Featured images are left alone until
    /// [`SourcePlugin::with_remote_files`] is called.
    pub fn new(theme: &ThemeConfig) -> Self {
        Self {
            source: theme.source.clone(),
            layout: theme.layout.clone(),
            annotator: NodeAnnotator::new(theme.source.clone()),
        }
    }

    /// Download featured images through `creator`.
    #[must_use]
    pub fn with_remote_files(mut self, creator: RemoteFileNodeCreator) -> Self {
        self.annotator = self.annotator.with_remote_files(creator);
        self
    }

    /// Configured source roots.
    pub fn source(&self) -> Option<&SourceRoots> {
        self.source.as_ref()
    }

    /// Schema stage.
    pub fn create_schema_customization(&self, actions: &dyn SchemaActions) {
        declare_schema(actions);
    }

    /// Node stage, called once per created node.
    ///
    /// # Errors
    ///
    /// See [`NodeAnnotator::annotate`].
    pub fn on_create_node(
        &self,
        node: &Node,
        actions: &dyn NodeActions,
        lookup: &dyn NodeLookup,
    ) -> Result<AnnotateOutcome, AnnotateError> {
        self.annotator.annotate(node, actions, lookup)
    }

    /// Page stage, called once after every node is annotated.
    ///
    /// # Errors
    ///
    /// See [`generate_pages`].
    pub fn create_pages(
        &self,
        queries: &dyn QueryRunner,
        pages: &dyn PageActions,
        reporter: &dyn Reporter,
    ) -> Result<(), PagesError> {
        generate_pages(self.source.as_ref(), &self.layout, queries, pages, reporter)
    }
}
