//! Gossip wire message and node identity.
//!
//! Gossip bodies travel as JSON inside a `"gossip:<json>"` tagged payload.

use chrono::{DateTime, Utc};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use murmur_transport::Address;

use crate::error::{GossipError, GossipResult};

/// Hop budget for newly originated messages.
pub const DEFAULT_TTL: u32 = 20;

/// Base port of the deterministic id-to-address allocation.
pub const BASE_PORT: u16 = 9000;

/// Protocol-level identity of a gossip participant.
///
/// Ids map to addresses deterministically: node `i` listens on
/// `127.0.0.1:(BASE_PORT + i)`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display,
)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn from_index(index: usize) -> Self {
        Self(index as u32)
    }

    /// The address this id listens on.
    pub fn address(self) -> Address {
        Address::localhost(BASE_PORT + self.0 as u16)
    }

    /// Recover the id behind a deterministically allocated address.
    pub fn from_address(addr: &Address) -> Self {
        Self(addr.port.saturating_sub(BASE_PORT) as u32)
    }
}

/// A piece of information spreading through the network.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GossipMessage {
    /// Unique message identifier.
    pub id: String,
    /// The actual information.
    pub content: String,
    /// Original sender.
    pub sender: NodeId,
    /// When the message was created.
    pub timestamp: DateTime<Utc>,
    /// Hops remaining; no forwarding happens at zero.
    pub ttl: u32,
}

impl GossipMessage {
    /// Originate a new message with a fresh id and the default hop budget.
    pub fn originate(sender: NodeId, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            content: content.into(),
            sender,
            timestamp: Utc::now(),
            ttl: DEFAULT_TTL,
        }
    }

    pub fn encode(&self) -> GossipResult<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| GossipError::Encode(e.to_string()))
    }

    pub fn decode(bytes: &[u8]) -> GossipResult<Self> {
        serde_json::from_slice(bytes).map_err(|e| GossipError::Decode(e.to_string()))
    }
}
