//! Peer-graph snapshot and connectivity analysis.
//!
//! Peer edges are directional: A -> B exists when A lists B as a peer, and
//! reciprocity is not assumed. Reachability analysis treats every edge as
//! bidirectional, which conflates "who forwards to whom" with "who is
//! mutually reachable". Both views are therefore exposed:
//! [`PeerGraph::edges`] is the directed record,
//! [`PeerGraph::undirected_adjacency`] the symmetrized closure used for
//! clustering and layout.

use std::collections::BTreeSet;

use murmur_gossip::NodeId;

/// Snapshot of the wired topology at analysis time.
#[derive(Debug, Clone)]
pub struct PeerGraph {
    node_count: usize,
    edges: Vec<(NodeId, NodeId)>,
}

impl PeerGraph {
    pub fn new(node_count: usize, edges: Vec<(NodeId, NodeId)>) -> Self {
        Self { node_count, edges }
    }

    pub fn node_count(&self) -> usize {
        self.node_count
    }

    /// Directed edges exactly as recorded in each node's peer set.
    pub fn edges(&self) -> &[(NodeId, NodeId)] {
        &self.edges
    }

    /// Symmetrized adjacency: every directed edge counted both ways,
    /// deduplicated.
    pub fn undirected_adjacency(&self) -> Vec<BTreeSet<usize>> {
        let mut adjacency = vec![BTreeSet::new(); self.node_count];
        for (from, to) in &self.edges {
            adjacency[from.index()].insert(to.index());
            adjacency[to.index()].insert(from.index());
        }
        adjacency
    }

    /// Connected components over the symmetrized adjacency.
    ///
    /// Iterative explicit-stack traversal: recursion depth would be a
    /// liability at networks of 1000+ nodes. Every node lands in exactly
    /// one component; isolated nodes form singletons. Components are sorted
    /// internally and ordered by their smallest member.
    pub fn connected_components(&self) -> Vec<Vec<usize>> {
        let adjacency = self.undirected_adjacency();
        let mut visited = vec![false; self.node_count];
        let mut components = Vec::new();

        for start in 0..self.node_count {
            if visited[start] {
                continue;
            }
            let mut component = Vec::new();
            let mut stack = vec![start];
            visited[start] = true;
            while let Some(node) = stack.pop() {
                component.push(node);
                for &neighbor in &adjacency[node] {
                    if !visited[neighbor] {
                        visited[neighbor] = true;
                        stack.push(neighbor);
                    }
                }
            }
            component.sort_unstable();
            components.push(component);
        }

        components
    }
}

/// Index of the largest component; first one wins ties.
pub fn largest_component_index(components: &[Vec<usize>]) -> usize {
    let mut largest = 0;
    let mut largest_size = 0;
    for (i, component) in components.iter().enumerate() {
        if component.len() > largest_size {
            largest_size = component.len();
            largest = i;
        }
    }
    largest
}
