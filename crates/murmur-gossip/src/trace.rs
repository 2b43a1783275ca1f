//! Message-trace recording for offline inspection.
//!
//! Every accepted delivery (first sight of a message id on a node) is
//! recorded as one trace event. The log is shared: the harness creates one
//! [`TraceLog`] and hands a clone to every node.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::message::NodeId;

/// A single accepted transmission event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageTrace {
    pub timestamp: DateTime<Utc>,
    pub message_id: String,
    pub original_sender: NodeId,
    /// Who handed the message to the receiver on this hop.
    pub immediate_forwarder: NodeId,
    pub receiver: NodeId,
    pub content: String,
    /// TTL as received, before the forwarding decrement.
    pub ttl: u32,
    /// True when the forwarder is the original sender.
    pub is_direct: bool,
}

/// Shared, append-only log of accepted deliveries.
#[derive(Debug, Clone, Default)]
pub struct TraceLog {
    entries: Arc<Mutex<Vec<MessageTrace>>>,
}

impl TraceLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, trace: MessageTrace) {
        self.entries
            .lock()
            .expect("trace log lock poisoned")
            .push(trace);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("trace log lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the log in append (time) order.
    pub fn snapshot(&self) -> Vec<MessageTrace> {
        self.entries
            .lock()
            .expect("trace log lock poisoned")
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trace(receiver: u32) -> MessageTrace {
        MessageTrace {
            timestamp: Utc::now(),
            message_id: "m".into(),
            original_sender: NodeId(0),
            immediate_forwarder: NodeId(0),
            receiver: NodeId(receiver),
            content: "x".into(),
            ttl: 20,
            is_direct: true,
        }
    }

    #[test]
    fn test_snapshot_preserves_append_order() {
        let log = TraceLog::new();
        for i in 0..5 {
            log.record(trace(i));
        }
        let snapshot = log.snapshot();
        assert_eq!(snapshot.len(), 5);
        for (i, entry) in snapshot.iter().enumerate() {
            assert_eq!(entry.receiver, NodeId(i as u32));
        }
    }

    #[test]
    fn test_clones_share_one_log() {
        let log = TraceLog::new();
        let clone = log.clone();
        clone.record(trace(1));
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_trace_serializes_with_camel_case_fields() {
        let json = serde_json::to_value(trace(3)).unwrap();
        assert!(json.get("messageId").is_some());
        assert!(json.get("originalSender").is_some());
        assert!(json.get("immediateForwarder").is_some());
        assert!(json.get("isDirect").is_some());
    }
}
