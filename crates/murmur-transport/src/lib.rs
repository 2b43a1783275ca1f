//! # Murmur Transport
//!
//! In-process simulated network transport for Murmur.
//!
//! Maps logical addresses to bounded inbound queues and supports
//! partition/heal fault injection. There are no real sockets: the address
//! space is process-local, built for testing distributed algorithms under
//! controlled failure conditions.
//!
//! ## Features
//!
//! - Exclusive address registration with bounded inbound queues
//! - Fail-fast sends (`QueueFull`, `NetworkPartitioned`, `AddressNotFound`)
//! - Group partition marking and healing
//! - Tagged `"<type>:<body>"` payload envelopes
//!
//! ## Example
//!
//! ```rust,ignore
//! use murmur_transport::{Address, Envelope, MemoryNetwork, PayloadKind};
//!
//! let network = MemoryNetwork::new();
//! let mut listener = network.listen(Address::localhost(9000))?;
//!
//! let dialer = network.dial(Address::localhost(9000))?;
//! dialer.send(Envelope::tagged(
//!     Address::localhost(9001),
//!     Address::localhost(9000),
//!     PayloadKind::Gossip,
//!     b"{}",
//! ))?;
//!
//! let envelope = listener.recv().await.unwrap();
//! ```

pub mod address;
pub mod envelope;
pub mod error;
pub mod network;

// Re-exports
pub use address::Address;
pub use envelope::{Envelope, PayloadKind};
pub use error::{TransportError, TransportResult};
pub use network::{DEFAULT_QUEUE_CAPACITY, Dialer, Listener, MemoryNetwork};
