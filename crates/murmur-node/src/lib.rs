//! # Murmur Node
//!
//! Per-address message dispatch on top of [`murmur_transport`].
//!
//! A [`Node`] binds one address, keeps a table of handlers keyed by
//! [`PayloadKind`](murmur_transport::PayloadKind), and runs a single receive
//! loop that pulls envelopes off the inbound queue and dispatches them.
//! Handler errors are logged and contained; they never terminate the loop.
//!
//! ## Example
//!
//! ```rust,ignore
//! use murmur_node::Node;
//! use murmur_transport::{Address, MemoryNetwork, PayloadKind};
//!
//! let network = MemoryNetwork::new();
//! let alice = Node::bind(network.clone(), Address::localhost(9000))?;
//! let bob = Node::bind(network.clone(), Address::localhost(9001))?;
//!
//! alice.handle(PayloadKind::Discover, move |envelope| {
//!     // reply with something useful
//!     Ok(())
//! });
//!
//! alice.start();
//! bob.start();
//! bob.send_string(alice.address(), PayloadKind::Discover, "")?;
//! ```

pub mod error;
pub mod node;

// Re-exports
pub use error::{HandlerError, NodeError, NodeResult};
pub use node::{Handler, HandlerResult, Node};
