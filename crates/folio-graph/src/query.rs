//! Node queries: type selection, equality filters, ordering.
//!
//! Queries run over the JSON view of each node ([`Node::to_value`]) and
//! address values by dotted paths such as `frontmatter.date` or
//! `fields.owner`.
//!
//! Filter semantics follow the usual content-graph conventions:
//! - `eq` requires the value to be present and equal
//! - `ne` matches when the value is absent, `null`, or different
//!
//! Sorting is stable. Values that parse as dates compare chronologically,
//! numbers numerically, strings lexically. Different kinds never compare
//! against each other: dates come first, then numbers, booleans and other
//! strings, and missing values always sort last, whatever the direction.

use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Serialize;
use serde_json::Value;

use crate::error::QueryError;
use crate::node::Node;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Single filter predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Eq(String, Value),
    Ne(String, Value),
}

impl Predicate {
    fn path(&self) -> &str {
        match self {
            Self::Eq(path, _) | Self::Ne(path, _) => path,
        }
    }

    fn matches(&self, node: &Value) -> bool {
        match self {
            Self::Eq(path, expected) => lookup(node, path).is_some_and(|v| v == expected),
            Self::Ne(path, unexpected) => lookup(node, path).is_none_or(|v| v != unexpected),
        }
    }
}

/// Query over all nodes of one type.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeQuery {
    pub type_name: String,
    pub filters: Vec<Predicate>,
    pub sort: Option<(String, SortOrder)>,
}

impl NodeQuery {
    /// Select every node of `type_name`.
    pub fn all(type_name: &str) -> Self {
        Self {
            type_name: type_name.to_owned(),
            filters: Vec::new(),
            sort: None,
        }
    }

    /// Keep nodes whose `path` equals `value`.
    #[must_use]
    pub fn eq(mut self, path: &str, value: impl Into<Value>) -> Self {
        self.filters.push(Predicate::Eq(path.to_owned(), value.into()));
        self
    }

    /// Keep nodes whose `path` is absent or differs from `value`.
    #[must_use]
    pub fn ne(mut self, path: &str, value: impl Into<Value>) -> Self {
        self.filters.push(Predicate::Ne(path.to_owned(), value.into()));
        self
    }

    /// Order results by `path`.
    #[must_use]
    pub fn sort_by(mut self, path: &str, order: SortOrder) -> Self {
        self.sort = Some((path.to_owned(), order));
        self
    }

    /// Every path the query reads.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.filters
            .iter()
            .map(Predicate::path)
            .chain(self.sort.iter().map(|(path, _)| path.as_str()))
    }

    /// Evaluate against `nodes` (already restricted to the query's type, in
    /// creation order).
    pub fn evaluate(&self, nodes: Vec<Node>) -> Vec<Edge> {
        let matched = nodes.into_iter().filter_map(|node| {
            let value = node.to_value();
            self.filters
                .iter()
                .all(|p| p.matches(&value))
                .then_some((value, node))
        });

        let nodes: Vec<Node> = match &self.sort {
            Some((path, order)) => {
                let mut keyed: Vec<(Option<SortKey>, Node)> = matched
                    .map(|(value, node)| (lookup(&value, path).map(SortKey::from_value), node))
                    .collect();
                keyed.sort_by(|(a, _), (b, _)| compare_keys(a.as_ref(), b.as_ref(), *order));
                keyed.into_iter().map(|(_, node)| node).collect()
            }
            None => matched.map(|(_, node)| node).collect(),
        };
        into_edges(nodes)
    }
}

/// One query result with its neighbors in result order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Edge {
    pub previous: Option<Node>,
    pub node: Node,
    pub next: Option<Node>,
}

fn into_edges(nodes: Vec<Node>) -> Vec<Edge> {
    (0..nodes.len())
        .map(|i| Edge {
            previous: i.checked_sub(1).map(|p| nodes[p].clone()),
            node: nodes[i].clone(),
            next: nodes.get(i + 1).cloned(),
        })
        .collect()
}

/// Query execution callback handed to plugins.
pub trait QueryRunner: Send + Sync {
    /// Run `query`, returning matching nodes as edges.
    fn run_query(&self, query: &NodeQuery) -> Result<Vec<Edge>, QueryError>;
}

/// Value at a dotted path, treating `null` as absent.
pub fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(value, |current, segment| current.get(segment))
        .filter(|v| !v.is_null())
}

/// Comparable form of a sort value, computed once per node.
#[derive(Debug, Clone, PartialEq)]
enum SortKey {
    Date(NaiveDateTime),
    Number(f64),
    Bool(bool),
    Text(String),
}

impl SortKey {
    fn from_value(value: &Value) -> Self {
        match value {
            Value::String(s) => parse_date(s).map_or_else(|| Self::Text(s.clone()), Self::Date),
            Value::Number(n) => Self::Number(n.as_f64().unwrap_or(0.0)),
            Value::Bool(b) => Self::Bool(*b),
            other => Self::Text(other.to_string()),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Date(_) => 0,
            Self::Number(_) => 1,
            Self::Bool(_) => 2,
            Self::Text(_) => 3,
        }
    }
}

/// Total order over optional keys. Only same-kind comparisons follow
/// `order`; kind rank and missing-last hold in both directions.
fn compare_keys(a: Option<&SortKey>, b: Option<&SortKey>, order: SortOrder) -> Ordering {
    let (a, b) = match (a, b) {
        (None, None) => return Ordering::Equal,
        (None, Some(_)) => return Ordering::Greater,
        (Some(_), None) => return Ordering::Less,
        (Some(a), Some(b)) => (a, b),
    };
    let ordering = match (a, b) {
        (SortKey::Date(a), SortKey::Date(b)) => a.cmp(b),
        (SortKey::Number(a), SortKey::Number(b)) => a.total_cmp(b),
        (SortKey::Bool(a), SortKey::Bool(b)) => a.cmp(b),
        (SortKey::Text(a), SortKey::Text(b)) => a.cmp(b),
        _ => return a.rank().cmp(&b.rank()),
    };
    match order {
        SortOrder::Asc => ordering,
        SortOrder::Desc => ordering.reverse(),
    }
}

/// Parse the date formats commonly found in frontmatter.
fn parse_date(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}
