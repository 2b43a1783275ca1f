//! Network construction and protocol-wide actions.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::Rng;
use tracing::info;

use murmur_gossip::{GossipNode, GossipResult, NodeId, TraceLog};
use murmur_transport::MemoryNetwork;

use crate::export::{ExportError, build_visualization, write_visualization};
use crate::topology::PeerGraph;

/// Builds a network of gossip nodes and drives protocol-wide actions.
///
/// Owns the shared trace log; every node it creates records accepted
/// deliveries into it.
pub struct NetworkBuilder {
    network: MemoryNetwork,
    nodes: Vec<GossipNode>,
    traces: TraceLog,
    start_time: DateTime<Utc>,
}

impl NetworkBuilder {
    pub fn new(network: MemoryNetwork) -> Self {
        Self {
            network,
            nodes: Vec::new(),
            traces: TraceLog::new(),
            start_time: Utc::now(),
        }
    }

    /// Allocate `count` gossip nodes at deterministic sequential addresses.
    pub fn create_nodes(&mut self, count: usize) -> GossipResult<()> {
        info!(count, "creating gossip nodes");
        for _ in 0..count {
            let id = NodeId::from_index(self.nodes.len());
            let node = GossipNode::new(self.network.clone(), id, self.traces.clone())?;
            self.nodes.push(node);
        }
        Ok(())
    }

    /// Wire each node to `peers_per_node` distinct random peers, self
    /// excluded. Returns the number of edges actually added.
    ///
    /// Peer selection retries at most `3 * peers_per_node` times per node,
    /// so nodes can end up with fewer peers when the requested count
    /// approaches the network size. That shortfall is accepted, not
    /// corrected.
    pub fn build_random_topology(&self, peers_per_node: usize) -> usize {
        info!(peers_per_node, "building random topology");
        let mut rng = rand::rng();
        let mut edges = 0;
        for node in &self.nodes {
            for peer in self.select_random_peers(&mut rng, node.id(), peers_per_node) {
                if node.add_peer(peer.address()) {
                    edges += 1;
                }
            }
        }
        edges
    }

    fn select_random_peers(
        &self,
        rng: &mut impl Rng,
        node: NodeId,
        count: usize,
    ) -> Vec<NodeId> {
        let mut peers = Vec::new();
        let mut attempts = count * 3;
        while peers.len() < count && attempts > 0 {
            attempts -= 1;
            let candidate = NodeId::from_index(rng.random_range(0..self.nodes.len()));
            if candidate == node || peers.contains(&candidate) {
                continue;
            }
            peers.push(candidate);
        }
        peers
    }

    /// Add the directed peer edge `from -> to`.
    pub fn link(&self, from: NodeId, to: NodeId) -> bool {
        self.nodes[from.index()].add_peer(to.address())
    }

    /// Launch every node's receive loop.
    pub fn start_all(&self) {
        info!(count = self.nodes.len(), "starting nodes");
        for node in &self.nodes {
            node.start();
        }
    }

    /// Originate `content` from a uniformly random node.
    ///
    /// Returns the originator id and the generated message id, or `None`
    /// on an empty network.
    pub fn initiate_gossip(&self, content: &str) -> Option<(NodeId, String)> {
        if self.nodes.is_empty() {
            return None;
        }
        let starter = rand::rng().random_range(0..self.nodes.len());
        let node = &self.nodes[starter];
        let message_id = node.gossip(content);
        Some((node.id(), message_id))
    }

    pub fn nodes(&self) -> &[GossipNode] {
        &self.nodes
    }

    pub fn network(&self) -> &MemoryNetwork {
        &self.network
    }

    pub fn traces(&self) -> &TraceLog {
        &self.traces
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    /// Wait for propagation to settle.
    ///
    /// The protocol has no convergence signal; termination is data-driven
    /// (ttl exhaustion), so harnesses impose an external deadline.
    pub async fn settle(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    /// Snapshot the directed peer graph exactly as recorded in each node's
    /// peer set.
    pub fn peer_graph(&self) -> PeerGraph {
        let mut edges = Vec::new();
        for node in &self.nodes {
            for peer in node.peers() {
                let to = NodeId::from_address(&peer);
                if to.index() < self.nodes.len() {
                    edges.push((node.id(), to));
                }
            }
        }
        PeerGraph::new(self.nodes.len(), edges)
    }

    /// Serialize topology + traces into the visualization document under
    /// `dir`. Returns the written path.
    pub fn export_visualization_data(&self, dir: impl AsRef<Path>) -> Result<PathBuf, ExportError> {
        let data = build_visualization(&self.peer_graph(), &self.traces, self.start_time);
        let path = write_visualization(&data, dir.as_ref())?;
        info!(
            path = %path.display(),
            nodes = data.topology.nodes.len(),
            traces = data.traces.len(),
            "exported visualization data"
        );
        Ok(path)
    }

    /// Shut down every node, joining receive loops and forward tasks.
    pub async fn close_all(&self) {
        for node in &self.nodes {
            node.close().await;
        }
    }
}
