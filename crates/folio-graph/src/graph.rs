//! In-process content graph.
//!
//! [`ContentGraph`] owns the node store and the schema registry, and
//! implements every host callback plugins receive: [`NodeActions`],
//! [`NodeLookup`], [`SchemaActions`] and [`QueryRunner`]. All state sits
//! behind one `RwLock`, so a single graph can be shared across annotation
//! workers.

use std::collections::HashMap;
use std::sync::RwLock;

use serde_json::Value;

use crate::actions::{NodeActions, NodeLookup};
use crate::error::{GraphError, QueryError};
use crate::id::NodeId;
use crate::node::Node;
use crate::query::{Edge, NodeQuery, QueryRunner, lookup};
use crate::schema::{FieldKind, Schema, SchemaActions, TypeDef};

#[derive(Default)]
struct GraphState {
    nodes: HashMap<NodeId, Node>,
    /// Creation order, used as the unsorted query order.
    order: Vec<NodeId>,
    schema: Schema,
}

/// Shared node store with schema and query support.
#[derive(Default)]
pub struct ContentGraph {
    state: RwLock<GraphState>,
}

impl ContentGraph {
    /// Create an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes.
    ///
    /// # Panics
    ///
    /// Panics if the internal `RwLock` is poisoned.
    pub fn len(&self) -> usize {
        self.state.read().unwrap().order.len()
    }

    /// Whether the graph holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All nodes of `type_name`, in creation order.
    ///
    /// # Panics
    ///
    /// Panics if the internal `RwLock` is poisoned.
    pub fn nodes_of_type(&self, type_name: &str) -> Vec<Node> {
        let state = self.state.read().unwrap();
        state
            .order
            .iter()
            .filter_map(|id| state.nodes.get(id))
            .filter(|node| node.type_name() == type_name)
            .cloned()
            .collect()
    }

    /// Follow the link-typed `field` of `node` as declared in the schema.
    ///
    /// Returns `None` when the field is not a declared link, the node has no
    /// value for it, or the target is missing or of the wrong type.
    ///
    /// # Panics
    ///
    /// Panics if the internal `RwLock` is poisoned.
    pub fn resolve_link(&self, node: &Node, field: &str) -> Option<Node> {
        let state = self.state.read().unwrap();
        let Some(FieldKind::Link { to, from }) = state.schema.field(node.type_name(), field)
        else {
            return None;
        };
        let target = state.nodes.get(node.links.get(from)?)?;
        (target.type_name() == to).then(|| target.clone())
    }

    /// SDL-style dump of the declared schema.
    ///
    /// # Panics
    ///
    /// Panics if the internal `RwLock` is poisoned.
    pub fn type_definitions(&self) -> String {
        self.state.read().unwrap().schema.type_definitions()
    }
}

impl NodeActions for ContentGraph {
    fn create_node(&self, mut node: Node) -> Result<(), GraphError> {
        let mut guard = self.state.write().unwrap();
        let state = &mut *guard;

        if let Some(parent_id) = &node.parent
            && !state.nodes.contains_key(parent_id)
        {
            return Err(GraphError::NodeNotFound(parent_id.clone()));
        }

        // A replaced node moving to a new parent leaves the old one's children
        let previous_parent = state
            .nodes
            .get(&node.id)
            .and_then(|existing| existing.parent.clone())
            .filter(|previous| node.parent.as_ref() != Some(previous));
        if let Some(previous) = previous_parent.and_then(|id| state.nodes.get_mut(&id)) {
            previous.children.retain(|child| child != &node.id);
        }

        if let Some(parent) = node.parent.as_ref().and_then(|id| state.nodes.get_mut(id))
            && !parent.children.contains(&node.id)
        {
            parent.children.push(node.id.clone());
        }

        match state.nodes.get(&node.id) {
            Some(existing) => {
                tracing::debug!(id = %node.id, "replacing node");
                node.children.clone_from(&existing.children);
            }
            None => state.order.push(node.id.clone()),
        }
        state.nodes.insert(node.id.clone(), node);
        Ok(())
    }

    fn create_node_field(
        &self,
        node: &NodeId,
        owner: &str,
        name: &str,
        value: Value,
    ) -> Result<(), GraphError> {
        let mut state = self.state.write().unwrap();
        let target = state
            .nodes
            .get_mut(node)
            .ok_or_else(|| GraphError::NodeNotFound(node.clone()))?;

        if let Some(existing) = target.internal.field_owners.get(name)
            && existing != owner
        {
            return Err(GraphError::FieldOwnership {
                node: node.clone(),
                field: name.to_owned(),
                owner: existing.clone(),
                requested: owner.to_owned(),
            });
        }

        target
            .internal
            .field_owners
            .insert(name.to_owned(), owner.to_owned());
        target.fields.insert(name.to_owned(), value);
        Ok(())
    }

    fn link_node(&self, node: &NodeId, key: &str, target: &NodeId) -> Result<(), GraphError> {
        let mut state = self.state.write().unwrap();
        if !state.nodes.contains_key(target) {
            return Err(GraphError::NodeNotFound(target.clone()));
        }
        let source = state
            .nodes
            .get_mut(node)
            .ok_or_else(|| GraphError::NodeNotFound(node.clone()))?;
        source.links.insert(key.to_owned(), target.clone());
        Ok(())
    }
}

impl NodeLookup for ContentGraph {
    fn get_node(&self, id: &NodeId) -> Option<Node> {
        self.state.read().unwrap().nodes.get(id).cloned()
    }
}

impl SchemaActions for ContentGraph {
    fn create_types(&self, types: Vec<TypeDef>) {
        let mut state = self.state.write().unwrap();
        for def in types {
            tracing::debug!(type_name = %def.name, "declaring type");
            state.schema.add(def);
        }
    }
}

impl QueryRunner for ContentGraph {
    fn run_query(&self, query: &NodeQuery) -> Result<Vec<Edge>, QueryError> {
        let nodes = self.nodes_of_type(&query.type_name);

        let state = self.state.read().unwrap();
        let declared = state.schema.get(&query.type_name).is_some();
        if !declared && nodes.is_empty() {
            return Err(QueryError::UnknownType(query.type_name.clone()));
        }

        // Paths must be declared or inferable from at least one node.
        let values: Vec<Value> = nodes.iter().map(Node::to_value).collect();
        for path in query.paths() {
            let known = state.schema.declares_path(&query.type_name, path)
                || values.iter().any(|v| lookup(v, path).is_some());
            if !known {
                return Err(QueryError::UnknownField {
                    type_name: query.type_name.clone(),
                    path: path.to_owned(),
                });
            }
        }
        drop(state);

        let edges = query.evaluate(nodes);
        tracing::debug!(type_name = %query.type_name, results = edges.len(), "query complete");
        Ok(edges)
    }
}
