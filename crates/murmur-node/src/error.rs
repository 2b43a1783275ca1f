//! Error types for node dispatch

use thiserror::Error;

use murmur_transport::TransportError;

/// Errors surfaced by node operations.
#[derive(Debug, Error)]
pub enum NodeError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The node has been closed; closed is terminal.
    #[error("node is closed")]
    Closed,
}

/// Result type for node operations.
pub type NodeResult<T> = Result<T, NodeError>;

/// Error returned by a registered handler.
///
/// Non-fatal by design: the receive loop logs it and moves on.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// The payload body could not be decoded.
    #[error("failed to decode payload: {0}")]
    Decode(String),

    /// A reply send failed.
    #[error("failed to send reply: {0}")]
    Send(#[from] NodeError),

    /// Anything else the handler wants to report.
    #[error("{0}")]
    Other(String),
}
