//! Callbacks the host hands to plugins for reading and mutating nodes.

use serde_json::Value;

use crate::error::GraphError;
use crate::id::NodeId;
use crate::node::Node;

/// Node mutation callbacks.
///
/// Implementations must be safe to call from several annotation workers at
/// once.
pub trait NodeActions: Send + Sync {
    /// Add `node`, replacing any node with the same id.
    fn create_node(&self, node: Node) -> Result<(), GraphError>;

    /// Attach the derived field `name` to a node on behalf of `owner`.
    ///
    /// Fails if another owner already set the same field.
    fn create_node_field(
        &self,
        node: &NodeId,
        owner: &str,
        name: &str,
        value: Value,
    ) -> Result<(), GraphError>;

    /// Point the link key `key` of `node` at `target`.
    fn link_node(&self, node: &NodeId, key: &str, target: &NodeId) -> Result<(), GraphError>;
}

/// Node lookup callback.
pub trait NodeLookup: Send + Sync {
    /// Snapshot of the node with `id`.
    fn get_node(&self, id: &NodeId) -> Option<Node>;
}
