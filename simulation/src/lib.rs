//! # Murmur Simulation
//!
//! Harness for running epidemic dissemination experiments over the
//! in-process transport, with connectivity analysis and visualization
//! export.
//!
//! ## Overview
//!
//! - **Builder** (`builder.rs`): constructs N gossip nodes at deterministic
//!   addresses, wires random or explicit topologies, and drives
//!   protocol-wide actions (start-all, initiate-gossip, close-all).
//! - **Topology** (`topology.rs`): the peer-graph snapshot. Peer edges are
//!   directional; the snapshot exposes both the directed edge list and its
//!   symmetrized closure, and computes connected components over the
//!   latter.
//! - **Layout** (`layout.rs`): force-directed positioning for the
//!   visualization, with the largest component separated from isolated
//!   ones.
//! - **Export** (`export.rs`): serializes topology + message traces into
//!   the JSON document the replay front-end consumes.
//! - **Scenarios** (`scenarios.rs`): pre-built experiment drivers used by
//!   the CLI and the tests.
//!
//! ## Example
//!
//! ```rust,ignore
//! use murmur_simulation::NetworkBuilder;
//! use murmur_transport::MemoryNetwork;
//!
//! let mut builder = NetworkBuilder::new(MemoryNetwork::new());
//! builder.create_nodes(100)?;
//! builder.build_random_topology(2);
//! builder.start_all();
//! builder.initiate_gossip("hello from the gossip network");
//!
//! tokio::time::sleep(std::time::Duration::from_secs(1)).await;
//!
//! let components = builder.peer_graph().connected_components();
//! builder.export_visualization_data("out")?;
//! builder.close_all().await;
//! ```

pub mod builder;
pub mod export;
pub mod layout;
pub mod scenarios;
pub mod topology;

#[cfg(test)]
mod integration_scenarios;

// Re-export main types
pub use builder::NetworkBuilder;
pub use export::{
    ClusterInfo, EdgeInfo, ExportError, NetworkTopology, NodeInfo, VisualizationData,
    build_visualization, write_visualization,
};
pub use layout::{CANVAS_HEIGHT, CANVAS_WIDTH, Position, layout_components};
pub use scenarios::{PartitionReport, RingReport, SpreadReport};
pub use topology::{PeerGraph, largest_component_index};
