//! Traversals and lookups over [`KgStorage`].
//!
//! Traversals are breadth-first with a visited set, so a node is reported at
//! its shortest hop distance and the depth bound is exact.

use ahash::{AHashMap, AHashSet};
use serde::Serialize;
use std::collections::{BTreeSet, VecDeque};

use crate::graph::storage::KgStorage;
use crate::graph::{EdgeRelation, GraphEdge, GraphNode};
use crate::ingest::DeclarationKind;

/// A node reached by a traversal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReachedNode<'a> {
    pub key: &'a str,
    /// Hops from the start node (at least 1)
    pub depth: usize,
    #[serde(flatten)]
    pub node: &'a GraphNode,
}

/// A node together with its key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeEntry<'a> {
    pub key: &'a str,
    #[serde(flatten)]
    pub node: &'a GraphNode,
}

#[derive(Clone, Copy)]
enum Direction {
    Outgoing,
    Incoming,
}

impl KgStorage {
    fn traverse<'a>(
        &'a self,
        start: &str,
        max_depth: usize,
        direction: Direction,
    ) -> Vec<ReachedNode<'a>> {
        let mut reached = Vec::new();
        if max_depth == 0 {
            return reached;
        }
        let mut visited: AHashSet<&'a str> = AHashSet::new();
        let mut queue: VecDeque<(&'a str, usize)> = VecDeque::new();

        let step = |key: &str| -> Vec<&'a GraphEdge> {
            match direction {
                Direction::Outgoing => self.outgoing(key).collect(),
                Direction::Incoming => self.incoming(key).collect(),
            }
        };
        let far_end = |edge: &'a GraphEdge| -> &'a str {
            match direction {
                Direction::Outgoing => edge.tgt.as_str(),
                Direction::Incoming => edge.src.as_str(),
            }
        };

        for edge in step(start) {
            let next = far_end(edge);
            if next != start && visited.insert(next) {
                queue.push_back((next, 1));
            }
        }
        while let Some((key, depth)) = queue.pop_front() {
            if let Some((stored_key, node)) = self.get_all_nodes().get_key_value(key) {
                reached.push(ReachedNode {
                    key: stored_key.as_str(),
                    depth,
                    node,
                });
            }
            if depth == max_depth {
                continue;
            }
            for edge in step(key) {
                let next = far_end(edge);
                if next != start && visited.insert(next) {
                    queue.push_back((next, depth + 1));
                }
            }
        }
        reached
    }

    /// Nodes reachable from `key` by following outgoing edges.
    ///
    /// # Arguments
    /// * `key` - Start node (need not exist as a node)
    /// * `depth` - Maximum number of hops; 0 yields nothing
    ///
    /// # Returns
    /// Reached nodes ordered by depth, then discovery order. The start node
    /// is never included, even on cycles.
    pub fn get_successors(&self, key: &str, depth: usize) -> Vec<ReachedNode<'_>> {
        self.traverse(key, depth, Direction::Outgoing)
    }

    /// Nodes reaching `key` within `depth` hops, following incoming edges.
    pub fn get_predecessors(&self, key: &str, depth: usize) -> Vec<ReachedNode<'_>> {
        self.traverse(key, depth, Direction::Incoming)
    }

    /// Union of successors and predecessors, deduplicated by key at the
    /// smaller of the two depths.
    pub fn get_neighbors(&self, key: &str, depth: usize) -> Vec<ReachedNode<'_>> {
        let mut merged: Vec<ReachedNode<'_>> = Vec::new();
        let mut positions: AHashMap<&str, usize> = AHashMap::new();
        let successors = self.get_successors(key, depth);
        let predecessors = self.get_predecessors(key, depth);
        for reached in successors.into_iter().chain(predecessors) {
            match positions.get(reached.key) {
                Some(&idx) => {
                    if reached.depth < merged[idx].depth {
                        merged[idx].depth = reached.depth;
                    }
                }
                None => {
                    positions.insert(reached.key, merged.len());
                    merged.push(reached);
                }
            }
        }
        merged.sort_by_key(|r| r.depth);
        merged
    }

    /// Nodes with an `implements` edge to `interface_key`, sorted by key.
    ///
    /// Empty unless `interface_key` names an interface node.
    pub fn get_implementors(&self, interface_key: &str) -> Vec<NodeEntry<'_>> {
        match self.get_node(interface_key) {
            Some(node) if node.kind == DeclarationKind::Interface => {}
            _ => return Vec::new(),
        }
        let sources: BTreeSet<&str> = self
            .incoming(interface_key)
            .filter(|edge| edge.relation == EdgeRelation::Implements)
            .map(|edge| edge.src.as_str())
            .collect();
        sources
            .into_iter()
            .filter_map(|key| {
                self.get_all_nodes()
                    .get_key_value(key)
                    .map(|(key, node)| NodeEntry { key: key.as_str(), node })
            })
            .collect()
    }

    /// Nodes declared in `file_path`, ordered by start line.
    pub fn get_types_by_file(&self, file_path: &str) -> Vec<NodeEntry<'_>> {
        let mut entries: Vec<_> = self
            .get_all_nodes()
            .iter()
            .filter(|(_, node)| node.file_path == file_path)
            .map(|(key, node)| NodeEntry { key: key.as_str(), node })
            .collect();
        entries.sort_by_key(|entry| entry.node.start_line);
        entries
    }
}

#[cfg(test)]
mod tests {
    use crate::graph::{EdgeRelation, Graph, GraphEdge, GraphNode, KgStorage};
    use crate::ingest::DeclarationKind;

    fn add(graph: &mut Graph, key: &str, kind: DeclarationKind, line: usize) {
        graph.insert_node(
            key.into(),
            GraphNode {
                name: key.rsplit('.').next().unwrap_or(key).into(),
                kind,
                file_path: "src/lib.rs".into(),
                start_line: line,
                end_line: line + 1,
                description: None,
                content: String::new(),
                is_exported: true,
                importance: 0.5,
            },
        );
    }

    fn link(graph: &mut Graph, src: &str, tgt: &str, relation: EdgeRelation) {
        graph.push_edge(GraphEdge {
            src: src.into(),
            tgt: tgt.into(),
            relation,
            src_file: "src/lib.rs".into(),
        });
    }

    /// A -> B -> C -> A, plus D -> A
    fn cyclic() -> KgStorage {
        let mut graph = Graph::new();
        for (key, line) in [("A", 1), ("B", 5), ("C", 3), ("D", 9)] {
            add(&mut graph, key, DeclarationKind::Class, line);
        }
        link(&mut graph, "A", "B", EdgeRelation::Extends);
        link(&mut graph, "B", "C", EdgeRelation::Injects);
        link(&mut graph, "C", "A", EdgeRelation::Injects);
        link(&mut graph, "D", "A", EdgeRelation::Extends);
        KgStorage::from_graph(graph)
    }

    fn keys<'a>(reached: &[super::ReachedNode<'a>]) -> Vec<(&'a str, usize)> {
        reached.iter().map(|r| (r.key, r.depth)).collect()
    }

    #[test]
    fn test_successors_respect_depth_and_cycles() {
        let storage = cyclic();
        assert!(storage.get_successors("A", 0).is_empty());
        assert_eq!(keys(&storage.get_successors("A", 1)), vec![("B", 1)]);
        assert_eq!(keys(&storage.get_successors("A", 10)), vec![("B", 1), ("C", 2)]);
    }

    #[test]
    fn test_predecessors() {
        let storage = cyclic();
        assert_eq!(keys(&storage.get_predecessors("A", 1)), vec![("C", 1), ("D", 1)]);
        assert_eq!(keys(&storage.get_predecessors("A", 2)), vec![("C", 1), ("D", 1), ("B", 2)]);
    }

    #[test]
    fn test_neighbors_keep_shortest_depth() {
        let storage = cyclic();
        // C is two hops forward but one hop backward
        assert_eq!(
            keys(&storage.get_neighbors("A", 2)),
            vec![("B", 1), ("C", 1), ("D", 1)]
        );
    }

    #[test]
    fn test_edge_only_keys_are_traversed_not_returned() {
        let mut graph = Graph::new();
        add(&mut graph, "A", DeclarationKind::Class, 1);
        add(&mut graph, "C", DeclarationKind::Class, 2);
        link(&mut graph, "A", "ghost", EdgeRelation::Injects);
        link(&mut graph, "ghost", "C", EdgeRelation::Injects);
        let storage = KgStorage::from_graph(graph);

        assert_eq!(keys(&storage.get_successors("A", 2)), vec![("C", 2)]);
    }

    #[test]
    fn test_implementors_require_interface() {
        let mut graph = Graph::new();
        add(&mut graph, "Repo", DeclarationKind::Interface, 1);
        add(&mut graph, "Base", DeclarationKind::Class, 2);
        add(&mut graph, "Sql", DeclarationKind::Class, 3);
        add(&mut graph, "Mem", DeclarationKind::Class, 4);
        link(&mut graph, "Sql", "Repo", EdgeRelation::Implements);
        link(&mut graph, "Mem", "Repo", EdgeRelation::Implements);
        link(&mut graph, "Sql", "Repo", EdgeRelation::Implements);
        link(&mut graph, "Mem", "Base", EdgeRelation::Implements);
        let storage = KgStorage::from_graph(graph);

        let implementors: Vec<_> = storage.get_implementors("Repo").iter().map(|e| e.key).collect();
        assert_eq!(implementors, vec!["Mem", "Sql"]);
        assert!(storage.get_implementors("Base").is_empty());
        assert!(storage.get_implementors("Missing").is_empty());
    }

    #[test]
    fn test_types_by_file_sorted_by_line() {
        let storage = cyclic();
        let entries: Vec<_> = storage
            .get_types_by_file("src/lib.rs")
            .iter()
            .map(|e| e.key)
            .collect();
        assert_eq!(entries, vec!["A", "C", "B", "D"]);
        assert!(storage.get_types_by_file("other.rs").is_empty());
    }
}
