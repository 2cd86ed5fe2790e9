//! Knowledge graph model, construction and storage.
//!
//! A [`Graph`] is a plain value: a key-unique node map plus an append-only
//! edge list. [`builder::GraphBuilder`] produces one from a source tree and
//! [`storage::KgStorage`] indexes one for traversal.

pub mod builder;
pub mod query;
pub mod scan;
pub mod storage;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::ingest::DeclarationKind;

pub use builder::{BuildCompletion, BuildResult, BuildStats, CancellationToken, GraphBuilder};
pub use query::{NodeEntry, ReachedNode};
pub use scan::{collect_source_files, SourceFile};
pub use storage::{GraphStats, KgStorage, SCHEMA_VERSION};

/// Key for a declaration: `Parent.member` for owned members, the bare name
/// otherwise.
pub fn node_key(name: &str, parent_name: Option<&str>) -> String {
    match parent_name {
        Some(parent) => format!("{}.{}", parent, name),
        None => name.to_string(),
    }
}

/// Relation type of an edge.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum EdgeRelation {
    /// Subtype to supertype or base class
    Extends,
    /// Type to interface
    Implements,
    /// Owner to a type it receives through a constructor or public field
    Injects,
    /// Type to member
    Contains,
}

impl EdgeRelation {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeRelation::Extends => "extends",
            EdgeRelation::Implements => "implements",
            EdgeRelation::Injects => "injects",
            EdgeRelation::Contains => "contains",
        }
    }
}

impl fmt::Display for EdgeRelation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    pub name: String,
    pub kind: DeclarationKind,
    /// Root-relative path with `/` separators
    pub file_path: String,
    pub start_line: usize,
    pub end_line: usize,
    #[serde(default)]
    pub description: Option<String>,
    pub content: String,
    pub is_exported: bool,
    pub importance: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphEdge {
    pub src: String,
    pub tgt: String,
    pub relation: EdgeRelation,
    /// File in which the relation was observed
    pub src_file: String,
}

/// Nodes keyed by node key, plus edges in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    pub nodes: BTreeMap<String, GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a node, returning the node it replaced.
    pub fn insert_node(&mut self, key: String, node: GraphNode) -> Option<GraphNode> {
        self.nodes.insert(key, node)
    }

    pub fn push_edge(&mut self, edge: GraphEdge) {
        self.edges.push(edge);
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.nodes.contains_key(key)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
}
