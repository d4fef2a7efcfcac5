//! Content graph for Folio.
//!
//! This crate is the host side of the build: it owns the nodes, the schema
//! and the page registry, and hands plugins narrow callback traits to work
//! through:
//!
//! - [`NodeActions`] / [`NodeLookup`]: create nodes, attach derived fields,
//!   link nodes, read snapshots
//! - [`SchemaActions`]: declare node and object types
//! - [`QueryRunner`]: filtered, sorted node queries returning [`Edge`]s
//! - [`PageActions`]: request output pages
//! - [`Reporter`]: build diagnostics
//!
//! [`ContentGraph`] implements the node, schema and query traits;
//! [`PageRegistry`] implements page creation. [`load_source_dir`] populates a
//! graph from a content directory.
//!
//! # Example
//!
//! ```
//! use folio_graph::{ContentGraph, NodeQuery, QueryRunner, SchemaActions, TypeDef};
//!
//! let graph = ContentGraph::new();
//! graph.create_types(vec![TypeDef::node("Mdx")]);
//! let edges = graph.run_query(&NodeQuery::all("Mdx")).unwrap();
//! assert!(edges.is_empty());
//! ```

mod actions;
mod error;
mod graph;
mod id;
mod loader;
mod node;
mod pages;
mod query;
mod reporter;
mod schema;

pub use actions::{NodeActions, NodeLookup};
pub use error::{GraphError, LoadError, QueryError};
pub use graph::ContentGraph;
pub use id::{NodeId, NodeIdGenerator, content_digest};
pub use loader::{FILESYSTEM_OWNER, LoadSummary, load_source_dir};
pub use node::{
    FILE_TYPE, FileContent, Frontmatter, Internal, LINK_SUFFIX, MDX_TYPE, MdxContent, Node,
    NodeContent,
};
pub use pages::{PageActions, PageDescriptor, PageRegistry};
pub use query::{Edge, NodeQuery, Predicate, QueryRunner, SortOrder, lookup};
pub use reporter::{Reporter, TracingReporter};
pub use schema::{BUILTIN_FIELDS, FieldKind, ScalarType, Schema, SchemaActions, TypeDef};
