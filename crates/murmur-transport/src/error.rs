//! Transport layer error types

use thiserror::Error;

use crate::address::Address;

/// Errors returned synchronously by transport operations.
///
/// Nothing in the transport blocks indefinitely: a send that cannot complete
/// fails with one of these instead of waiting.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The address already has a registered listener.
    #[error("address already in use: {0}")]
    AddressInUse(Address),

    /// No listener is registered at the address.
    #[error("no listener at address: {0}")]
    AddressNotFound(Address),

    /// One of the endpoints is currently behind a partition mark.
    #[error("network partitioned between {from} and {to}")]
    NetworkPartitioned { from: Address, to: Address },

    /// The destination's bounded inbound queue is full.
    #[error("inbound queue full at {0}")]
    QueueFull(Address),

    /// The destination was deregistered after the dial.
    #[error("connection closed: {0}")]
    ConnectionClosed(Address),
}

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;
