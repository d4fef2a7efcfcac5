//! Error types for annotation, remote files and page generation.

use std::path::PathBuf;

use folio_graph::{GraphError, NodeId, QueryError};

/// Error while downloading or storing a remote file.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// HTTP request failed (network error, timeout, body too large).
    #[error("HTTP request failed: {0}")]
    Http(#[from] ureq::Error),

    /// Server answered with a non-success status.
    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    /// URL is not an absolute http(s) URL.
    #[error("unsupported URL {0:?}")]
    InvalidUrl(String),

    /// Writing the downloaded file failed.
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Creating the file node failed.
    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Error while annotating a document node. Always fatal for the build.
#[derive(Debug, thiserror::Error)]
pub enum AnnotateError {
    /// No `File` node was found among the document's ancestors.
    #[error("document {0} has no parent file node")]
    MissingFileNode(NodeId),

    /// A graph mutation was rejected.
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// The featured image could not be fetched.
    #[error("featured image {url} for document {node}: {source}")]
    RemoteFile {
        node: NodeId,
        url: String,
        source: FetchError,
    },
}

/// Error while generating pages.
#[derive(Debug, thiserror::Error)]
pub enum PagesError {
    /// The source documents query failed.
    #[error("loading source documents failed: {0}")]
    Query(#[from] QueryError),

    /// Page context could not be encoded.
    #[error("encoding page context failed: {0}")]
    Context(#[from] serde_json::Error),
}
