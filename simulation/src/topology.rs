//! Network topologies for Meshlab simulations
//!
//! Provides functions to create various network topologies:
//! - Ring: Each node connected to its two neighbors
//! - Full mesh: Every node connected to every other
//! - Line, star
//! - Random: Configurable connection probability
//! - Custom: Build from edge list
//!
//! Nodes are numbered `1..=n`. Neighbor lists keep insertion order, which is
//! the order a node broadcasts in.

use std::collections::BTreeMap;

use clap::ValueEnum;
use meshlab_core::NodeId;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};

/// Shape of a generated topology
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum TopologyKind {
    #[default]
    Ring,
    Full,
    Line,
    Star,
    Random,
}

/// An undirected network topology
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Topology {
    adjacency: BTreeMap<NodeId, Vec<NodeId>>,
}

impl Topology {
    /// Create an empty topology
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node without connections
    pub fn add_node(&mut self, id: NodeId) {
        self.adjacency.entry(id).or_default();
    }

    /// Add a bidirectional connection between two nodes
    pub fn connect(&mut self, a: NodeId, b: NodeId) {
        if a == b {
            return; // No self-loops
        }

        for (from, to) in [(a, b), (b, a)] {
            let neighbors = self.adjacency.entry(from).or_default();
            if !neighbors.contains(&to) {
                neighbors.push(to);
            }
        }
    }

    /// Neighbors of a node, in connection order
    pub fn neighbors(&self, id: NodeId) -> &[NodeId] {
        self.adjacency.get(&id).map(Vec::as_slice).unwrap_or_default()
    }

    /// Check if two nodes are directly connected
    pub fn are_connected(&self, a: NodeId, b: NodeId) -> bool {
        self.neighbors(a).contains(&b)
    }

    pub fn node_ids(&self) -> Vec<NodeId> {
        self.adjacency.keys().copied().collect()
    }

    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    /// Number of undirected edges
    pub fn edge_count(&self) -> usize {
        self.adjacency.values().map(Vec::len).sum::<usize>() / 2
    }

    /// Check that every neighbor exists and no node lists itself
    pub fn validate(&self) -> SimResult<()> {
        for (node, neighbors) in &self.adjacency {
            for neighbor in neighbors {
                if neighbor == node {
                    return Err(SimError::SelfLoop(*node));
                }
                if !self.adjacency.contains_key(neighbor) {
                    return Err(SimError::UnknownNeighbor {
                        node: *node,
                        neighbor: *neighbor,
                    });
                }
            }
        }
        Ok(())
    }

    /// Insert a one-way adjacency entry without any checks
    #[cfg(test)]
    fn insert_neighbors(&mut self, id: NodeId, neighbors: Vec<NodeId>) {
        self.adjacency.insert(id, neighbors);
    }

    /// Print a simple ASCII visualization of the topology
    pub fn visualize(&self) -> String {
        let mut output = String::new();
        output.push_str("Topology:\n");
        output.push_str(&format!("  Nodes: {}\n", self.node_count()));
        output.push_str(&format!("  Edges: {}\n\n", self.edge_count()));

        for (id, neighbors) in &self.adjacency {
            let neighbor_str: Vec<String> = neighbors.iter().map(|n| n.to_string()).collect();
            output.push_str(&format!("  {} -> [{}]\n", id, neighbor_str.join(", ")));
        }
        output
    }
}

/// Builder for generated topologies
pub struct TopologyBuilder {
    node_count: u32,
}

impl TopologyBuilder {
    /// Create a builder for nodes `1..=node_count`
    pub fn new(node_count: u32) -> Self {
        Self { node_count }
    }

    /// Build the topology selected by `kind`
    pub fn build(self, kind: TopologyKind, connection_probability: f64) -> Topology {
        match kind {
            TopologyKind::Ring => self.ring(),
            TopologyKind::Full => self.full_mesh(),
            TopologyKind::Line => self.line(),
            TopologyKind::Star => self.star(),
            TopologyKind::Random => self.random(connection_probability),
        }
    }

    fn empty(&self) -> (Topology, Vec<NodeId>) {
        let ids = NodeId::range(self.node_count);
        let mut topology = Topology::new();
        for id in &ids {
            topology.add_node(*id);
        }
        (topology, ids)
    }

    /// 1 - 2 - 3 - ... - n - 1
    pub fn ring(self) -> Topology {
        let (mut topology, ids) = self.empty();
        if ids.len() < 2 {
            return topology;
        }

        for i in 0..ids.len() {
            let next = (i + 1) % ids.len();
            topology.connect(ids[i], ids[next]);
        }
        topology
    }

    /// Every node connected to every other
    pub fn full_mesh(self) -> Topology {
        let (mut topology, ids) = self.empty();

        for i in 0..ids.len() {
            for j in (i + 1)..ids.len() {
                topology.connect(ids[i], ids[j]);
            }
        }
        topology
    }

    /// 1 - 2 - 3 - ... - n
    pub fn line(self) -> Topology {
        let (mut topology, ids) = self.empty();

        for pair in ids.windows(2) {
            topology.connect(pair[0], pair[1]);
        }
        topology
    }

    /// Node 1 in the center, connected to all others
    pub fn star(self) -> Topology {
        let (mut topology, ids) = self.empty();

        if let Some((center, rest)) = ids.split_first() {
            for id in rest {
                topology.connect(*center, *id);
            }
        }
        topology
    }

    /// Random graph with the given connection probability
    ///
    /// Every node ends up with at least one neighbor when there are two or
    /// more nodes.
    pub fn random(self, connection_probability: f64) -> Topology {
        let (mut topology, ids) = self.empty();
        let mut rng = rand::rng();

        for i in 0..ids.len() {
            for j in (i + 1)..ids.len() {
                if rng.random::<f64>() < connection_probability {
                    topology.connect(ids[i], ids[j]);
                }
            }
        }

        if ids.len() < 2 {
            return topology;
        }

        // Ensure no isolated nodes: connect each to a random other node
        for (i, id) in ids.iter().enumerate() {
            if topology.neighbors(*id).is_empty() {
                let offset = rng.random_range(1..ids.len());
                topology.connect(*id, ids[(i + offset) % ids.len()]);
            }
        }
        topology
    }
}

/// Create a custom topology from an edge list
pub fn from_edges(edges: &[(u32, u32)]) -> Topology {
    let mut topology = Topology::new();

    for (a, b) in edges {
        topology.connect(NodeId(*a), NodeId(*b));
    }
    topology
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ring_topology() {
        let topology = TopologyBuilder::new(4).ring();
        assert_eq!(topology.node_count(), 4);
        assert_eq!(topology.edge_count(), 4); // 1-2, 2-3, 3-4, 4-1

        assert!(topology.are_connected(NodeId(1), NodeId(2)));
        assert!(topology.are_connected(NodeId(4), NodeId(1))); // Wrap around
        assert!(!topology.are_connected(NodeId(1), NodeId(3))); // Not direct
        assert!(topology.validate().is_ok());
    }

    #[test]
    fn test_full_mesh() {
        let topology = TopologyBuilder::new(4).full_mesh();
        assert_eq!(topology.edge_count(), 6); // C(4,2) = 6

        for a in NodeId::range(4) {
            for b in NodeId::range(4) {
                if a != b {
                    assert!(topology.are_connected(a, b));
                }
            }
        }
    }

    #[test]
    fn test_line_and_star() {
        let line = TopologyBuilder::new(4).line();
        assert_eq!(line.edge_count(), 3);
        assert_eq!(line.neighbors(NodeId(1)), &[NodeId(2)]);
        assert_eq!(line.neighbors(NodeId(2)), &[NodeId(1), NodeId(3)]);

        let star = TopologyBuilder::new(4).star();
        assert_eq!(star.edge_count(), 3);
        assert_eq!(star.neighbors(NodeId(1)), &[NodeId(2), NodeId(3), NodeId(4)]);
        assert_eq!(star.neighbors(NodeId(3)), &[NodeId(1)]);
    }

    #[test]
    fn test_random_has_no_isolated_nodes() {
        let topology = TopologyBuilder::new(8).random(0.0);
        assert_eq!(topology.node_count(), 8);
        for id in topology.node_ids() {
            assert!(!topology.neighbors(id).is_empty());
        }
        assert!(topology.validate().is_ok());
    }

    #[test]
    fn test_tiny_topologies() {
        assert_eq!(TopologyBuilder::new(1).ring().edge_count(), 0);
        assert_eq!(TopologyBuilder::new(1).random(1.0).edge_count(), 0);
        assert_eq!(TopologyBuilder::new(0).star().node_count(), 0);
    }

    #[test]
    fn test_custom_topology() {
        let topology = from_edges(&[(1, 2), (1, 3), (2, 3), (2, 4), (2, 4), (3, 3)]);

        assert_eq!(topology.node_count(), 4);
        assert_eq!(topology.edge_count(), 4);
        assert!(topology.are_connected(NodeId(1), NodeId(2)));
        assert!(!topology.are_connected(NodeId(1), NodeId(4)));
        assert!(!topology.are_connected(NodeId(3), NodeId(3)));
    }

    #[test]
    fn test_validate_rejects_bad_adjacency() {
        let mut topology = from_edges(&[(1, 2)]);
        topology.insert_neighbors(NodeId(3), vec![NodeId(9)]);
        assert!(matches!(
            topology.validate(),
            Err(SimError::UnknownNeighbor { neighbor: NodeId(9), .. })
        ));

        let mut topology = Topology::new();
        topology.insert_neighbors(NodeId(1), vec![NodeId(1)]);
        assert!(matches!(topology.validate(), Err(SimError::SelfLoop(NodeId(1)))));
    }

    #[test]
    fn test_visualize() {
        let output = from_edges(&[(1, 2)]).visualize();
        assert!(output.contains("Nodes: 2"));
        assert!(output.contains("1 -> [2]"));
    }
}
