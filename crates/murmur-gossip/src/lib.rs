//! # Murmur Gossip
//!
//! Best-effort epidemic dissemination over the in-process murmur transport.
//!
//! Each [`GossipNode`] keeps a peer set, a seen-message-id set, and an
//! append-only received log. A message originated anywhere floods the
//! network: every node that sees a message id for the first time records it
//! and re-fans-out to its peers until the hop budget (TTL) runs out.
//! Duplicate suppression is the sole guard against infinite flooding on
//! cyclic topologies.
//!
//! Delivery is at-most-once with no acknowledgement: forwarding failures
//! (partitioned, unreachable, or saturated peers) are swallowed, because
//! partial delivery is a normal outcome of an epidemic protocol.
//!
//! ## Example
//!
//! ```rust,ignore
//! use murmur_gossip::{GossipNode, NodeId, TraceLog};
//! use murmur_transport::MemoryNetwork;
//!
//! let network = MemoryNetwork::new();
//! let traces = TraceLog::new();
//!
//! let a = GossipNode::new(network.clone(), NodeId(0), traces.clone())?;
//! let b = GossipNode::new(network.clone(), NodeId(1), traces.clone())?;
//! a.add_peer(b.address());
//! b.add_peer(a.address());
//! a.start();
//! b.start();
//!
//! a.gossip("the roof is on fire");
//! ```

pub mod error;
pub mod message;
pub mod node;
pub mod trace;

// Re-exports
pub use error::{GossipError, GossipResult};
pub use message::{BASE_PORT, DEFAULT_TTL, GossipMessage, NodeId};
pub use node::{GossipNode, GossipStats};
pub use trace::{MessageTrace, TraceLog};
