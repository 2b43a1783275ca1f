//! Logical addresses for the in-process address space.

use std::net::{IpAddr, Ipv4Addr};

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// A (host, port) pair identifying one listener in the address space.
///
/// Addresses are the sole routing identity: the network delivers to whoever
/// currently holds the listener registered under this address.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display,
)]
#[display("{host}:{port}")]
pub struct Address {
    pub host: IpAddr,
    pub port: u16,
}

impl Address {
    pub fn new(host: IpAddr, port: u16) -> Self {
        Self { host, port }
    }

    /// Loopback address on the given port.
    pub fn localhost(port: u16) -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port,
        }
    }
}
