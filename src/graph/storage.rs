//! Indexed, serializable graph storage.
//!
//! [`KgStorage`] owns a [`Graph`] together with outgoing and incoming
//! adjacency indices. Index entries are positions into the edge vector, so
//! duplicate edges stay distinct and every edge is reachable from both ends.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::error::{KgError, Result};
use crate::graph::{EdgeRelation, Graph, GraphEdge, GraphNode};
use crate::ingest::DeclarationKind;

/// Snapshot schema written by [`KgStorage::to_json`].
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Serialize)]
struct SnapshotRef<'a> {
    version: u32,
    nodes: Vec<(&'a str, &'a GraphNode)>,
    edges: &'a [GraphEdge],
}

#[derive(Deserialize)]
struct Snapshot {
    version: u32,
    nodes: Vec<(String, GraphNode)>,
    edges: Vec<GraphEdge>,
}

#[derive(Deserialize)]
struct SnapshotHeader {
    version: u32,
}

/// Summary counts over a stored graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphStats {
    pub node_count: usize,
    pub edge_count: usize,
    pub file_count: usize,
    pub exported_count: usize,
    pub nodes_by_kind: BTreeMap<DeclarationKind, usize>,
    pub edges_by_relation: BTreeMap<EdgeRelation, usize>,
}

#[derive(Debug, Clone, Default)]
pub struct KgStorage {
    graph: Graph,
    out_edges: AHashMap<String, Vec<usize>>,
    in_edges: AHashMap<String, Vec<usize>>,
}

impl KgStorage {
    /// Empty storage; populate with [`load_graph`](Self::load_graph).
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_graph(graph: Graph) -> Self {
        let mut storage = Self::new();
        storage.load_graph(graph);
        storage
    }

    /// Replace the stored graph and rebuild both indices.
    pub fn load_graph(&mut self, graph: Graph) {
        self.out_edges.clear();
        self.in_edges.clear();
        for (idx, edge) in graph.edges.iter().enumerate() {
            self.out_edges.entry(edge.src.clone()).or_default().push(idx);
            self.in_edges.entry(edge.tgt.clone()).or_default().push(idx);
        }
        self.graph = graph;
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn into_graph(self) -> Graph {
        self.graph
    }

    pub fn get_node(&self, key: &str) -> Option<&GraphNode> {
        self.graph.nodes.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.graph.contains_key(key)
    }

    pub fn get_all_nodes(&self) -> &BTreeMap<String, GraphNode> {
        &self.graph.nodes
    }

    pub fn get_all_edges(&self) -> &[GraphEdge] {
        &self.graph.edges
    }

    /// Edges whose source is `key`, in insertion order.
    pub fn outgoing<'a>(&'a self, key: &str) -> impl Iterator<Item = &'a GraphEdge> + 'a {
        self.indexed(self.out_edges.get(key))
    }

    /// Edges whose target is `key`, in insertion order.
    pub fn incoming<'a>(&'a self, key: &str) -> impl Iterator<Item = &'a GraphEdge> + 'a {
        self.indexed(self.in_edges.get(key))
    }

    fn indexed<'a>(
        &'a self,
        positions: Option<&'a Vec<usize>>,
    ) -> impl Iterator<Item = &'a GraphEdge> + 'a {
        positions
            .into_iter()
            .flatten()
            .filter_map(|&idx| self.graph.edges.get(idx))
    }

    /// Exported nodes in key order.
    pub fn exported_nodes(&self) -> impl Iterator<Item = (&str, &GraphNode)> {
        self.graph
            .nodes
            .iter()
            .filter(|(_, node)| node.is_exported)
            .map(|(key, node)| (key.as_str(), node))
    }

    pub fn edges_by_relation(&self, relation: EdgeRelation) -> impl Iterator<Item = &GraphEdge> {
        self.graph.edges.iter().filter(move |e| e.relation == relation)
    }

    pub fn stats(&self) -> GraphStats {
        let mut stats = GraphStats {
            node_count: self.graph.node_count(),
            edge_count: self.graph.edge_count(),
            ..GraphStats::default()
        };
        let mut files = BTreeSet::new();
        for node in self.graph.nodes.values() {
            *stats.nodes_by_kind.entry(node.kind).or_default() += 1;
            if node.is_exported {
                stats.exported_count += 1;
            }
            files.insert(node.file_path.as_str());
        }
        for edge in &self.graph.edges {
            *stats.edges_by_relation.entry(edge.relation).or_default() += 1;
        }
        stats.file_count = files.len();
        stats
    }

    fn snapshot(&self) -> SnapshotRef<'_> {
        SnapshotRef {
            version: SCHEMA_VERSION,
            nodes: self.graph.nodes.iter().map(|(k, n)| (k.as_str(), n)).collect(),
            edges: &self.graph.edges,
        }
    }

    /// Serialize to the snapshot format:
    /// `{"version": 1, "nodes": [[key, node], ...], "edges": [...]}`.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(&self.snapshot()).map_err(KgError::Serialize)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.snapshot()).map_err(KgError::Serialize)
    }

    /// Rebuild storage from a snapshot, exactly as [`load_graph`](Self::load_graph) would.
    ///
    /// Malformed input and snapshots from a newer schema are errors.
    pub fn from_json(json: &str) -> Result<Self> {
        let header: SnapshotHeader = serde_json::from_str(json).map_err(KgError::Deserialize)?;
        if header.version > SCHEMA_VERSION {
            return Err(KgError::SchemaVersion {
                found: header.version,
                supported: SCHEMA_VERSION,
            });
        }
        let snapshot: Snapshot = serde_json::from_str(json).map_err(KgError::Deserialize)?;
        tracing::debug!(
            version = snapshot.version,
            nodes = snapshot.nodes.len(),
            edges = snapshot.edges.len(),
            "loaded graph snapshot"
        );

        let mut graph = Graph::new();
        for (key, node) in snapshot.nodes {
            graph.insert_node(key, node);
        }
        graph.edges = snapshot.edges;
        Ok(Self::from_graph(graph))
    }
}
