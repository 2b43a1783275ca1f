//! The per-node epidemic state machine.
//!
//! Per (node, message-id) the state is Unseen then Seen; Seen is terminal.
//! All mutable protocol state lives behind one reader/writer lock that is
//! never held across anything that could block: the lock is released before
//! fan-out, and each outbound send runs in its own short-lived task.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, RwLock};

use chrono::Utc;
use tokio::task::JoinSet;
use tracing::{debug, info, trace, warn};

use murmur_node::{HandlerError, Node};
use murmur_transport::{Address, MemoryNetwork, PayloadKind};

use crate::error::GossipResult;
use crate::message::{GossipMessage, NodeId};
use crate::trace::{MessageTrace, TraceLog};

/// Counters exposed for external inspection; reading has no side effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GossipStats {
    /// Known peer count.
    pub peers: usize,
    /// Entries in the received log.
    pub received_log: usize,
    /// Successful outbound sends.
    pub sent: u64,
    /// Accepted inbound messages.
    pub received: u64,
}

#[derive(Default)]
struct GossipState {
    /// Known peer addresses; deduplicated, self excluded.
    peers: Vec<Address>,
    /// Message ids this node has accepted. Grows monotonically; the sole
    /// mechanism preventing infinite flooding on cyclic topologies.
    seen: HashSet<String>,
    /// Append-only log of accepted messages.
    received: Vec<GossipMessage>,
    sent: u64,
    received_count: u64,
}

struct Core {
    id: NodeId,
    node: Node,
    state: RwLock<GossipState>,
    traces: TraceLog,
    /// Outstanding fan-out tasks, joined on close so none leak past
    /// shutdown.
    forwards: Mutex<JoinSet<()>>,
}

impl Core {
    fn add_peer(&self, peer: Address) -> bool {
        if peer == self.id.address() {
            return false;
        }
        let mut state = self.state.write().expect("gossip state lock poisoned");
        if state.peers.contains(&peer) {
            return false;
        }
        state.peers.push(peer);
        true
    }

    /// Accept a message seen for the first time and forward it while the
    /// hop budget lasts.
    fn handle_gossip(self: &Arc<Self>, mut msg: GossipMessage, forwarder: NodeId) {
        {
            let mut state = self.state.write().expect("gossip state lock poisoned");
            if !state.seen.insert(msg.id.clone()) {
                return; // already processed
            }
            state.received.push(msg.clone());
            state.received_count += 1;
        }

        let is_direct = msg.sender == forwarder;
        self.traces.record(MessageTrace {
            timestamp: Utc::now(),
            message_id: msg.id.clone(),
            original_sender: msg.sender,
            immediate_forwarder: forwarder,
            receiver: self.id,
            content: msg.content.clone(),
            ttl: msg.ttl,
            is_direct,
        });

        if is_direct {
            debug!(node = %self.id, sender = %msg.sender, content = %msg.content, "received gossip");
        } else {
            debug!(
                node = %self.id,
                sender = %msg.sender,
                via = %forwarder,
                content = %msg.content,
                "received forwarded gossip"
            );
        }

        if msg.ttl > 0 {
            msg.ttl -= 1;
            self.fan_out(msg);
        }
    }

    /// Send `msg` to every currently known peer, one task per target.
    ///
    /// Failures are swallowed: a partitioned, closed, or saturated peer is a
    /// normal outcome here, not a condition to retry.
    fn fan_out(self: &Arc<Self>, msg: GossipMessage) {
        let peers = {
            let state = self.state.read().expect("gossip state lock poisoned");
            state.peers.clone()
        };
        let body = match msg.encode() {
            Ok(body) => body,
            Err(e) => {
                warn!(node = %self.id, error = %e, "failed to encode gossip message");
                return;
            }
        };

        let mut forwards = self.forwards.lock().expect("forward set lock poisoned");
        for peer in peers {
            let core = Arc::clone(self);
            let body = body.clone();
            forwards.spawn(async move {
                match core.node.send(peer, PayloadKind::Gossip, &body) {
                    Ok(()) => {
                        core.state.write().expect("gossip state lock poisoned").sent += 1;
                    }
                    Err(e) => {
                        trace!(node = %core.id, %peer, error = %e, "fan-out send dropped");
                    }
                }
            });
        }
    }
}

/// One gossip participant: a dispatch node plus epidemic protocol state.
pub struct GossipNode {
    core: Arc<Core>,
}

impl GossipNode {
    /// Create a gossip node listening on the address derived from `id`.
    pub fn new(network: MemoryNetwork, id: NodeId, traces: TraceLog) -> GossipResult<Self> {
        let node = Node::bind(network, id.address()).map_err(crate::error::GossipError::Node)?;
        let core = Arc::new(Core {
            id,
            node,
            state: RwLock::new(GossipState::default()),
            traces,
            forwards: Mutex::new(JoinSet::new()),
        });
        register_handlers(&core);
        Ok(Self { core })
    }

    pub fn id(&self) -> NodeId {
        self.core.id
    }

    pub fn address(&self) -> Address {
        self.core.id.address()
    }

    /// Add a peer address. Self and duplicates are rejected.
    pub fn add_peer(&self, peer: Address) -> bool {
        self.core.add_peer(peer)
    }

    /// Snapshot of the current peer set.
    pub fn peers(&self) -> Vec<Address> {
        self.core
            .state
            .read()
            .expect("gossip state lock poisoned")
            .peers
            .clone()
    }

    /// Launch the receive loop.
    pub fn start(&self) {
        self.core.node.start();
    }

    /// Originate a new message and fan it out to every known peer.
    ///
    /// Returns the generated message id.
    pub fn gossip(&self, content: impl Into<String>) -> String {
        let msg = GossipMessage::originate(self.core.id, content);
        info!(node = %self.core.id, content = %msg.content, "starting gossip");
        let id = msg.id.clone();
        self.core.fan_out(msg);
        id
    }

    /// Ask `peer` for its peer list; the reply is merged on arrival.
    pub fn request_peers(&self, peer: Address) -> GossipResult<()> {
        self.core
            .node
            .send(peer, PayloadKind::Discover, b"")
            .map_err(crate::error::GossipError::Node)
    }

    /// Peer/receive/send counters; no side effects.
    pub fn stats(&self) -> GossipStats {
        let state = self.core.state.read().expect("gossip state lock poisoned");
        GossipStats {
            peers: state.peers.len(),
            received_log: state.received.len(),
            sent: state.sent,
            received: state.received_count,
        }
    }

    /// Snapshot of the received log.
    pub fn received_messages(&self) -> Vec<GossipMessage> {
        self.core
            .state
            .read()
            .expect("gossip state lock poisoned")
            .received
            .clone()
    }

    /// Close the node and join all outstanding forward tasks.
    pub async fn close(&self) {
        self.core.node.close().await;
        let mut forwards = {
            let mut guard = self.core.forwards.lock().expect("forward set lock poisoned");
            std::mem::take(&mut *guard)
        };
        while forwards.join_next().await.is_some() {}
    }
}

impl std::fmt::Debug for GossipNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let stats = self.stats();
        f.debug_struct("GossipNode")
            .field("id", &self.core.id)
            .field("peers", &stats.peers)
            .field("received", &stats.received)
            .field("sent", &stats.sent)
            .finish()
    }
}

fn register_handlers(core: &Arc<Core>) {
    // Gossip payloads drive the epidemic state machine.
    let gossip_core = Arc::clone(core);
    core.node.handle(PayloadKind::Gossip, move |envelope| {
        let msg = GossipMessage::decode(envelope.body())
            .map_err(|e| HandlerError::Decode(e.to_string()))?;
        let forwarder = NodeId::from_address(&envelope.from);
        gossip_core.handle_gossip(msg, forwarder);
        Ok(())
    });

    // Discover requests are answered with our current peer list.
    let discover_core = Arc::clone(core);
    core.node.handle(PayloadKind::Discover, move |envelope| {
        let peers = {
            let state = discover_core
                .state
                .read()
                .expect("gossip state lock poisoned");
            state.peers.clone()
        };
        let body =
            serde_json::to_vec(&peers).map_err(|e| HandlerError::Other(e.to_string()))?;
        discover_core
            .node
            .send(envelope.from, PayloadKind::Peers, &body)?;
        Ok(())
    });

    // Peer-list replies are merged into our own peer set.
    let peers_core = Arc::clone(core);
    core.node.handle(PayloadKind::Peers, move |envelope| {
        let peers: Vec<Address> = serde_json::from_slice(envelope.body())
            .map_err(|e| HandlerError::Decode(e.to_string()))?;
        for peer in peers {
            if peers_core.add_peer(peer) {
                debug!(node = %peers_core.id, %peer, "learned peer via exchange");
            }
        }
        Ok(())
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_peer_rejects_self_and_duplicates() {
        let network = MemoryNetwork::new();
        let node = GossipNode::new(network, NodeId(0), TraceLog::new()).unwrap();

        assert!(!node.add_peer(NodeId(0).address()), "self must be rejected");
        assert!(node.add_peer(NodeId(1).address()));
        assert!(!node.add_peer(NodeId(1).address()), "duplicate must be rejected");
        assert_eq!(node.peers(), vec![NodeId(1).address()]);
    }

    #[test]
    fn test_stats_start_at_zero() {
        let network = MemoryNetwork::new();
        let node = GossipNode::new(network, NodeId(0), TraceLog::new()).unwrap();

        assert_eq!(
            node.stats(),
            GossipStats {
                peers: 0,
                received_log: 0,
                sent: 0,
                received: 0,
            }
        );
    }
}
