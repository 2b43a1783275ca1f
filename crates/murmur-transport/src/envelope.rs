//! Wire envelope and tagged payload encoding.
//!
//! Payloads are `"<type>:<body>"` where only the first colon delimits; the
//! tag names a [`PayloadKind`] that keys the node dispatch table.

use bytes::Bytes;

use crate::address::Address;

/// Message kinds carried on the wire.
///
/// The dispatch table is keyed by this enum rather than raw tag strings;
/// unknown wire tags fall through to a node's fallback handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PayloadKind {
    /// Epidemic dissemination payload.
    Gossip,
    /// Request for the receiver's peer list.
    Discover,
    /// Peer-list reply to a `Discover`.
    Peers,
}

impl PayloadKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayloadKind::Gossip => "gossip",
            PayloadKind::Discover => "discover",
            PayloadKind::Peers => "peers",
        }
    }

    /// Parse a wire tag. Unknown tags return `None`.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "gossip" => Some(PayloadKind::Gossip),
            "discover" => Some(PayloadKind::Discover),
            "peers" => Some(PayloadKind::Peers),
            _ => None,
        }
    }
}

impl std::fmt::Display for PayloadKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One message in flight between two addresses.
#[derive(Debug, Clone)]
pub struct Envelope {
    pub from: Address,
    pub to: Address,
    pub payload: Bytes,
}

impl Envelope {
    /// Build an envelope carrying a tagged payload.
    pub fn tagged(from: Address, to: Address, kind: PayloadKind, body: &[u8]) -> Self {
        let tag = kind.as_str().as_bytes();
        let mut payload = Vec::with_capacity(tag.len() + 1 + body.len());
        payload.extend_from_slice(tag);
        payload.push(b':');
        payload.extend_from_slice(body);
        Self {
            from,
            to,
            payload: Bytes::from(payload),
        }
    }

    /// Split the payload at the first colon into (tag, body).
    ///
    /// A payload without a colon is all tag with an empty body.
    pub fn split_payload(&self) -> (&[u8], &[u8]) {
        match self.payload.iter().position(|&b| b == b':') {
            Some(i) => (&self.payload[..i], &self.payload[i + 1..]),
            None => (&self.payload[..], &[]),
        }
    }

    /// The parsed message kind, if the tag is known.
    pub fn kind(&self) -> Option<PayloadKind> {
        let (tag, _) = self.split_payload();
        std::str::from_utf8(tag).ok().and_then(PayloadKind::from_tag)
    }

    /// The payload body after the first colon.
    pub fn body(&self) -> &[u8] {
        self.split_payload().1
    }
}
