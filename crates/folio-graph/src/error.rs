//! Error types for graph mutation, queries and sourcing.

use std::path::PathBuf;

use crate::id::NodeId;

/// Error from a node mutation.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// The node does not exist.
    #[error("node not found: {0}")]
    NodeNotFound(NodeId),

    /// The field is already owned by another plugin.
    #[error("field {field:?} on node {node} is owned by {owner}, not {requested}")]
    FieldOwnership {
        node: NodeId,
        field: String,
        owner: String,
        requested: String,
    },
}

/// Error from query execution.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// No node of this type exists and none was declared.
    #[error("unknown type {0:?}")]
    UnknownType(String),

    /// The path is neither declared nor present on any node of the type.
    #[error("unknown field {path:?} on type {type_name:?}")]
    UnknownField { type_name: String, path: String },
}

/// Error while sourcing content files.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// I/O error reading a directory or file.
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Frontmatter is not a valid YAML mapping.
    #[error("invalid frontmatter in {}: {message}", path.display())]
    Frontmatter { path: PathBuf, message: String },

    /// Node creation was rejected.
    #[error(transparent)]
    Graph(#[from] GraphError),
}
