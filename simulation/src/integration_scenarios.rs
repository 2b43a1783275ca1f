//! End-to-end scenarios exercising the full stack: transport, dispatch,
//! protocol, and analysis together.

use std::time::Duration;

use murmur_gossip::NodeId;
use murmur_transport::{MemoryNetwork, TransportError};

use crate::builder::NetworkBuilder;
use crate::scenarios;

const SETTLE: Duration = Duration::from_millis(500);

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_component_coverage_on_random_topology() {
    let mut builder = NetworkBuilder::new(MemoryNetwork::new());
    builder.create_nodes(50).unwrap();
    builder.build_random_topology(3);

    let components = builder.peer_graph().connected_components();
    let mut covered: Vec<usize> = components.into_iter().flatten().collect();
    covered.sort_unstable();
    assert_eq!(
        covered,
        (0..50).collect::<Vec<_>>(),
        "components must partition the node set"
    );

    builder.close_all().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_hundred_node_spread_logs_each_message_once() {
    let mut builder = NetworkBuilder::new(MemoryNetwork::new());
    builder.create_nodes(100).unwrap();
    builder.build_random_topology(2);
    builder.start_all();

    let (origin, _) = builder.initiate_gossip("reachability probe").unwrap();
    builder.settle(SETTLE).await;

    let mut reached = Vec::new();
    for node in builder.nodes() {
        let stats = node.stats();
        assert!(
            stats.received_log <= 1,
            "node {} logged a duplicate",
            node.id()
        );
        assert_eq!(stats.received as usize, stats.received_log);
        if stats.received_log > 0 {
            reached.push(node.id().index());
        }
    }

    // Flooding travels directed edges only, so the reached set can never
    // leave the originator's (symmetrized) component.
    let components = builder.peer_graph().connected_components();
    let origin_component = components
        .iter()
        .find(|c| c.contains(&origin.index()))
        .unwrap();
    for node in &reached {
        assert!(origin_component.contains(node));
    }
    if !builder.nodes()[origin.index()].peers().is_empty() {
        assert!(!reached.is_empty(), "an origin with peers must reach someone");
    }

    builder.close_all().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_ring_reached_set_equals_origin_component() {
    // Two directed cycles, {0,1,2} and {3,4}; every node lists exactly one
    // peer, so flooding can cover its whole cycle and nothing else.
    let mut builder = NetworkBuilder::new(MemoryNetwork::new());
    builder.create_nodes(5).unwrap();
    builder.link(NodeId(0), NodeId(1));
    builder.link(NodeId(1), NodeId(2));
    builder.link(NodeId(2), NodeId(0));
    builder.link(NodeId(3), NodeId(4));
    builder.link(NodeId(4), NodeId(3));
    builder.start_all();

    builder.nodes()[0].gossip("x");
    builder.settle(SETTLE).await;

    let reached: Vec<usize> = builder
        .nodes()
        .iter()
        .filter(|n| n.stats().received_log > 0)
        .map(|n| n.id().index())
        .collect();

    let origin_component = builder
        .peer_graph()
        .connected_components()
        .into_iter()
        .find(|c| c.contains(&0))
        .unwrap();
    assert_eq!(reached, origin_component);

    // Each reached node logged the message exactly once.
    for index in &reached {
        assert_eq!(builder.nodes()[*index].stats().received_log, 1);
    }
    // The other cycle hears nothing.
    assert_eq!(builder.nodes()[3].stats().received_log, 0);
    assert_eq!(builder.nodes()[4].stats().received_log, 0);

    builder.close_all().await;
}

#[tokio::test]
async fn test_closed_address_cannot_be_dialed() {
    let mut builder = NetworkBuilder::new(MemoryNetwork::new());
    builder.create_nodes(3).unwrap();
    builder.start_all();
    let addr = builder.nodes()[0].address();
    builder.close_all().await;

    assert_eq!(
        builder.network().dial(addr).err(),
        Some(TransportError::AddressNotFound(addr)),
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_partition_scenario_recovers_after_heal() {
    let report = scenarios::run_partition(SETTLE).await.unwrap();
    assert!(
        report.reached_during_partition < report.nodes,
        "marked half must be unreachable"
    );
    assert_eq!(
        report.reached_after_heal, report.nodes,
        "healed ring must be fully covered"
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_full_ring_scenario_covers_component() {
    let report = scenarios::run_ring(SETTLE).await.unwrap();
    assert!(report.matches(), "reached set must equal origin component");
    assert_eq!(report.reached.len(), 5);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_spread_report_is_internally_consistent() {
    let report = scenarios::run_spread(30, 3, SETTLE).await.unwrap();
    assert_eq!(report.nodes, 30);
    assert!(report.reached <= report.nodes);
    let expected = report.reached as f64 / 30.0 * 100.0;
    assert!((report.reached_percent() - expected).abs() < f64::EPSILON);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_export_after_spread_contains_traces() {
    let mut builder = NetworkBuilder::new(MemoryNetwork::new());
    builder.create_nodes(10).unwrap();
    for i in 0..10u32 {
        let next = (i + 1) % 10;
        builder.link(NodeId(i), NodeId(next));
        builder.link(NodeId(next), NodeId(i));
    }
    builder.start_all();
    builder.nodes()[0].gossip("for the record");
    builder.settle(SETTLE).await;
    builder.close_all().await;

    let dir = tempfile::tempdir().unwrap();
    let path = builder.export_visualization_data(dir.path()).unwrap();

    let json: serde_json::Value =
        serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
    assert_eq!(json["topology"]["nodes"].as_array().unwrap().len(), 10);
    assert!(
        !json["traces"].as_array().unwrap().is_empty(),
        "a settled flood leaves traces"
    );
    assert!(json.get("startTime").is_some());
}
