// THEORY:
// The `graph` module is the shared container underneath both halves of the
// engine: the region adjacency graph built from superpixels and the grid
// graph built from the walkability grid. It is deliberately minimal — a
// node store keyed by id and an edge store keyed by the unordered id pair.
//
// Key architectural principles:
// 1.  **Symmetric adjacency**: every edge is undirected. The edge key is the
//     canonical pair (min, max) packed into a single u64, so `add_edge(a, b)`
//     and `get_edge(b, a)` resolve to the same slot without allocation in the
//     hot adjacency path.
// 2.  **Silent absence**: lookups for missing nodes or edges return `None` or
//     an empty list. The algorithms treat "not there" as ordinary data, never
//     as a failure.
// 3.  **Last write wins**: inserting a node with an existing id, or an edge
//     for an existing pair, replaces the previous entry. The builders upstream
//     only ever produce unique ids, so this is a simplification, not a hazard.

use std::collections::HashMap;

pub type NodeId = u32;

/// A node that can live in a [`Graph`]. Identity is the id and nothing else;
/// two nodes with the same id are the same node as far as the container is
/// concerned.
pub trait GraphNode {
    fn id(&self) -> NodeId;
}

/// An undirected, weighted edge. `Clone` supplies the copy capability; the
/// similarity comparison lets callers coalesce near-identical edges.
pub trait GraphEdge: Clone {
    fn weight(&self) -> f64;

    fn is_similar(&self, other: &Self, threshold: f64) -> bool {
        (self.weight() - other.weight()).abs() <= threshold
    }
}

/// Canonical unordered-pair key: (min, max) packed into a u64.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EdgeKey(u64);

impl EdgeKey {
    pub fn new(a: NodeId, b: NodeId) -> Self {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        EdgeKey(((lo as u64) << 32) | hi as u64)
    }

    pub fn endpoints(&self) -> (NodeId, NodeId) {
        ((self.0 >> 32) as NodeId, self.0 as NodeId)
    }
}

/// Generic node/edge store with symmetric-undirected adjacency.
#[derive(Debug, Clone, Default)]
pub struct Graph<N, E> {
    nodes: HashMap<NodeId, N>,
    edges: HashMap<EdgeKey, E>,
}

impl<N: GraphNode, E: GraphEdge> Graph<N, E> {
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            edges: HashMap::new(),
        }
    }

    pub fn add_node(&mut self, node: N) {
        self.nodes.insert(node.id(), node);
    }

    pub fn get_node(&self, id: NodeId) -> Option<&N> {
        self.nodes.get(&id)
    }

    pub fn get_node_mut(&mut self, id: NodeId) -> Option<&mut N> {
        self.nodes.get_mut(&id)
    }

    pub fn add_edge(&mut self, from: NodeId, to: NodeId, edge: E) {
        self.edges.insert(EdgeKey::new(from, to), edge);
    }

    /// Symmetric lookup: `get_edge(a, b)` and `get_edge(b, a)` are the same.
    pub fn get_edge(&self, from: NodeId, to: NodeId) -> Option<&E> {
        self.edges.get(&EdgeKey::new(from, to))
    }

    pub fn nodes(&self) -> impl Iterator<Item = &N> {
        self.nodes.values()
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    pub fn edges(&self) -> impl Iterator<Item = (EdgeKey, &E)> {
        self.edges.iter().map(|(k, e)| (*k, e))
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Every other node connected to `id` by an edge.
    ///
    /// This is a scan of all nodes — O(n) per query, O(n^2) for a full
    /// adjacency pass. Callers that need repeated adjacency queries (the
    /// pathfinder) should build their own index instead of calling this in
    /// a loop.
    pub fn adjacent_nodes(&self, id: NodeId) -> Vec<&N> {
        self.nodes
            .iter()
            .filter(|(other_id, _)| **other_id != id)
            .filter(|(other_id, _)| self.get_edge(id, **other_id).is_some())
            .map(|(_, node)| node)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct TestNode(NodeId);

    impl GraphNode for TestNode {
        fn id(&self) -> NodeId {
            self.0
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    struct TestEdge(f64);

    impl GraphEdge for TestEdge {
        fn weight(&self) -> f64 {
            self.0
        }
    }

    #[test]
    fn edge_lookup_is_symmetric() {
        let mut graph: Graph<TestNode, TestEdge> = Graph::new();
        graph.add_node(TestNode(1));
        graph.add_node(TestNode(2));
        graph.add_edge(1, 2, TestEdge(0.5));

        assert_eq!(graph.get_edge(1, 2), Some(&TestEdge(0.5)));
        assert_eq!(graph.get_edge(2, 1), Some(&TestEdge(0.5)));
    }

    #[test]
    fn missing_lookups_are_silent() {
        let graph: Graph<TestNode, TestEdge> = Graph::new();
        assert!(graph.get_node(7).is_none());
        assert!(graph.get_edge(1, 2).is_none());
        assert!(graph.adjacent_nodes(1).is_empty());
    }

    #[test]
    fn last_write_wins_for_duplicate_pairs() {
        let mut graph: Graph<TestNode, TestEdge> = Graph::new();
        graph.add_node(TestNode(3));
        graph.add_node(TestNode(9));
        graph.add_edge(3, 9, TestEdge(1.0));
        graph.add_edge(9, 3, TestEdge(2.0));

        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.get_edge(3, 9), Some(&TestEdge(2.0)));
    }

    #[test]
    fn adjacency_only_reports_connected_nodes() {
        let mut graph: Graph<TestNode, TestEdge> = Graph::new();
        for id in 0..4 {
            graph.add_node(TestNode(id));
        }
        graph.add_edge(0, 1, TestEdge(1.0));
        graph.add_edge(0, 2, TestEdge(1.0));

        let mut adjacent: Vec<NodeId> = graph.adjacent_nodes(0).iter().map(|n| n.id()).collect();
        adjacent.sort_unstable();
        assert_eq!(adjacent, vec![1, 2]);
        assert!(graph.adjacent_nodes(3).is_empty());
    }

    #[test]
    fn edge_key_packs_canonical_pair() {
        assert_eq!(EdgeKey::new(8, 3), EdgeKey::new(3, 8));
        assert_eq!(EdgeKey::new(3, 8).endpoints(), (3, 8));
    }

    #[test]
    fn default_edge_similarity_compares_weights() {
        let a = TestEdge(1.0);
        let b = TestEdge(1.05);
        assert!(a.is_similar(&b, 0.1));
        assert!(!a.is_similar(&b, 0.01));
    }
}
