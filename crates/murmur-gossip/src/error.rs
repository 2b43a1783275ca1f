//! Error types for murmur-gossip

use thiserror::Error;

use murmur_node::NodeError;

/// Errors that can occur in the gossip layer.
#[derive(Debug, Error)]
pub enum GossipError {
    /// The underlying dispatch node failed.
    #[error(transparent)]
    Node(#[from] NodeError),

    /// Failed to encode a gossip payload.
    #[error("failed to encode gossip payload: {0}")]
    Encode(String),

    /// Failed to decode a gossip payload.
    #[error("failed to decode gossip payload: {0}")]
    Decode(String),
}

/// Result type for gossip operations.
pub type GossipResult<T> = Result<T, GossipError>;
