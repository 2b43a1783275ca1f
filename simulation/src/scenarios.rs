//! Pre-built experiment drivers used by the CLI and the tests.

use std::fmt;
use std::time::Duration;

use tracing::info;

use murmur_gossip::{GossipResult, NodeId};
use murmur_transport::{Address, MemoryNetwork};

use crate::builder::NetworkBuilder;

/// Outcome of flooding one message through a random topology.
#[derive(Debug, Clone)]
pub struct SpreadReport {
    pub nodes: usize,
    pub origin: NodeId,
    /// Nodes whose received log is non-empty after settling.
    pub reached: usize,
    /// Successful sends summed over all nodes.
    pub messages_sent: u64,
}

impl SpreadReport {
    pub fn reached_percent(&self) -> f64 {
        if self.nodes == 0 {
            return 0.0;
        }
        self.reached as f64 / self.nodes as f64 * 100.0
    }
}

impl fmt::Display for SpreadReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Gossip results:")?;
        writeln!(f, "  network size: {} nodes", self.nodes)?;
        writeln!(f, "  origin: node {}", self.origin)?;
        writeln!(
            f,
            "  nodes reached: {} ({:.1}%)",
            self.reached,
            self.reached_percent()
        )?;
        writeln!(f, "  messages sent: {}", self.messages_sent)?;
        write!(
            f,
            "  average per node: {:.1}",
            self.messages_sent as f64 / self.nodes.max(1) as f64
        )
    }
}

/// Flood one message through `node_count` nodes wired to `peers_per_node`
/// random peers each, then report coverage.
pub async fn run_spread(
    node_count: usize,
    peers_per_node: usize,
    settle: Duration,
) -> GossipResult<SpreadReport> {
    let mut builder = NetworkBuilder::new(MemoryNetwork::new());
    builder.create_nodes(node_count)?;
    builder.build_random_topology(peers_per_node);
    builder.start_all();

    let (origin, _) = builder
        .initiate_gossip("hello from the gossip network")
        .expect("network is not empty");
    builder.settle(settle).await;

    let mut reached = 0;
    let mut messages_sent = 0;
    for node in builder.nodes() {
        let stats = node.stats();
        if stats.received_log > 0 {
            reached += 1;
        }
        messages_sent += stats.sent;
    }
    builder.close_all().await;

    let report = SpreadReport {
        nodes: node_count,
        origin,
        reached,
        messages_sent,
    };
    info!(
        nodes = report.nodes,
        reached = report.reached,
        messages_sent = report.messages_sent,
        "spread finished"
    );
    Ok(report)
}

/// Outcome of the 5-node directed ring scenario.
#[derive(Debug, Clone)]
pub struct RingReport {
    /// Ids whose received log is non-empty, in id order.
    pub reached: Vec<NodeId>,
    /// The originator's connected component, computed independently from
    /// the peer graph.
    pub origin_component: Vec<NodeId>,
}

impl RingReport {
    pub fn matches(&self) -> bool {
        self.reached == self.origin_component
    }
}

impl fmt::Display for RingReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Ring scenario:")?;
        writeln!(f, "  reached: {:?}", self.reached)?;
        writeln!(f, "  origin component: {:?}", self.origin_component)?;
        write!(
            f,
            "  reached set matches component: {}",
            if self.matches() { "yes" } else { "NO" }
        )
    }
}

/// Five nodes wired into one directed cycle, one peer each; gossip from
/// node 0 must cover exactly the originator's component.
pub async fn run_ring(settle: Duration) -> GossipResult<RingReport> {
    let mut builder = NetworkBuilder::new(MemoryNetwork::new());
    builder.create_nodes(5)?;
    for i in 0..5u32 {
        builder.link(NodeId(i), NodeId((i + 1) % 5));
    }
    builder.start_all();

    builder.nodes()[0].gossip("around the ring");
    builder.settle(settle).await;

    let reached = builder
        .nodes()
        .iter()
        .filter(|n| n.stats().received_log > 0)
        .map(|n| n.id())
        .collect();

    let origin_component = builder
        .peer_graph()
        .connected_components()
        .into_iter()
        .find(|c| c.contains(&0))
        .map(|c| c.into_iter().map(NodeId::from_index).collect())
        .unwrap_or_default();

    builder.close_all().await;
    Ok(RingReport {
        reached,
        origin_component,
    })
}

/// Outcome of the partition/heal scenario.
#[derive(Debug, Clone)]
pub struct PartitionReport {
    pub nodes: usize,
    /// Nodes the first message reached while half the ring was marked.
    pub reached_during_partition: usize,
    /// Nodes the second message reached after healing.
    pub reached_after_heal: usize,
}

impl fmt::Display for PartitionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Partition scenario ({} nodes):", self.nodes)?;
        writeln!(
            f,
            "  reached during partition: {}",
            self.reached_during_partition
        )?;
        write!(f, "  reached after heal: {}", self.reached_after_heal)
    }
}

/// A bidirectional ring of ten nodes: mark the back half unreachable,
/// gossip from node 0, heal, gossip again.
pub async fn run_partition(settle: Duration) -> GossipResult<PartitionReport> {
    const NODES: u32 = 10;

    let mut builder = NetworkBuilder::new(MemoryNetwork::new());
    builder.create_nodes(NODES as usize)?;
    for i in 0..NODES {
        let next = (i + 1) % NODES;
        builder.link(NodeId(i), NodeId(next));
        builder.link(NodeId(next), NodeId(i));
    }
    builder.start_all();

    let marked: Vec<Address> = (NODES / 2..NODES).map(|i| NodeId(i).address()).collect();
    builder.network().partition(&marked, &[]);

    let first = builder.nodes()[0].gossip("behind the partition");
    builder.settle(settle).await;
    let reached_during_partition = count_received(&builder, &first);

    builder.network().heal();
    let second = builder.nodes()[0].gossip("after the heal");
    builder.settle(settle).await;
    let reached_after_heal = count_received(&builder, &second);

    builder.close_all().await;
    Ok(PartitionReport {
        nodes: NODES as usize,
        reached_during_partition,
        reached_after_heal,
    })
}

fn count_received(builder: &NetworkBuilder, message_id: &str) -> usize {
    builder
        .nodes()
        .iter()
        .filter(|n| n.received_messages().iter().any(|m| m.id == message_id))
        .count()
}
