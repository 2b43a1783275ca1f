//! The in-process address space.
//!
//! [`MemoryNetwork`] maps logical addresses to bounded inbound queues and
//! injects partition faults. The registry and the partition marks sit behind
//! a single lock that is held for the full duration of a send, so a
//! destination queue cannot be deregistered mid-delivery. Enqueueing never
//! blocks: a saturated destination fails the send with `QueueFull`.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tracing::debug;

use crate::address::Address;
use crate::envelope::Envelope;
use crate::error::{TransportError, TransportResult};

/// Default inbound queue capacity per listener.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

struct NetworkState {
    /// An address appears here at most once at any time.
    listeners: HashMap<Address, mpsc::Sender<Envelope>>,
    /// Partition marks apply to addresses, not pairs: a marked address is
    /// unreachable from everyone, not just the opposite group.
    partitioned: HashSet<Address>,
}

/// Shared in-process address space.
///
/// Cheap to clone; all clones share one registry. Construct one per harness
/// and pass a clone into every node constructor.
#[derive(Clone)]
pub struct MemoryNetwork {
    state: Arc<Mutex<NetworkState>>,
    queue_capacity: usize,
}

impl MemoryNetwork {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_QUEUE_CAPACITY)
    }

    /// Address space with a custom inbound queue capacity.
    pub fn with_capacity(queue_capacity: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(NetworkState {
                listeners: HashMap::new(),
                partitioned: HashSet::new(),
            })),
            queue_capacity,
        }
    }

    /// Register `addr` exclusively and return its inbound queue.
    pub fn listen(&self, addr: Address) -> TransportResult<Listener> {
        let mut state = self.state.lock().expect("network lock poisoned");
        if state.listeners.contains_key(&addr) {
            return Err(TransportError::AddressInUse(addr));
        }
        let (tx, rx) = mpsc::channel(self.queue_capacity);
        state.listeners.insert(addr, tx);
        debug!(%addr, "listener registered");
        Ok(Listener { addr, inbox: rx })
    }

    /// Return a lightweight outbound handle to `addr`.
    pub fn dial(&self, addr: Address) -> TransportResult<Dialer> {
        let state = self.state.lock().expect("network lock poisoned");
        if !state.listeners.contains_key(&addr) {
            return Err(TransportError::AddressNotFound(addr));
        }
        Ok(Dialer {
            remote: addr,
            network: self.clone(),
        })
    }

    /// Deregister `addr` and release its queue. Idempotent.
    ///
    /// The listener's `recv` drains anything already enqueued and then
    /// returns `None`; sends racing with the close fail instead of hanging.
    pub fn close(&self, addr: Address) {
        let mut state = self.state.lock().expect("network lock poisoned");
        if state.listeners.remove(&addr).is_some() {
            debug!(%addr, "listener closed");
        }
    }

    /// Mark every address in both groups as partitioned.
    pub fn partition(&self, group_a: &[Address], group_b: &[Address]) {
        let mut state = self.state.lock().expect("network lock poisoned");
        state.partitioned.extend(group_a.iter().copied());
        state.partitioned.extend(group_b.iter().copied());
        debug!(marked = state.partitioned.len(), "network partitioned");
    }

    /// Clear every partition mark.
    pub fn heal(&self) {
        let mut state = self.state.lock().expect("network lock poisoned");
        state.partitioned.clear();
        debug!("network healed");
    }

    /// Number of currently registered listeners.
    pub fn listener_count(&self) -> usize {
        let state = self.state.lock().expect("network lock poisoned");
        state.listeners.len()
    }

    fn send(&self, envelope: Envelope) -> TransportResult<()> {
        let state = self.state.lock().expect("network lock poisoned");
        if state.partitioned.contains(&envelope.from) || state.partitioned.contains(&envelope.to) {
            return Err(TransportError::NetworkPartitioned {
                from: envelope.from,
                to: envelope.to,
            });
        }
        let to = envelope.to;
        let tx = state
            .listeners
            .get(&to)
            .ok_or(TransportError::ConnectionClosed(to))?;
        tx.try_send(envelope).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => TransportError::QueueFull(to),
            mpsc::error::TrySendError::Closed(_) => TransportError::ConnectionClosed(to),
        })
    }
}

impl Default for MemoryNetwork {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryNetwork {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock().expect("network lock poisoned");
        f.debug_struct("MemoryNetwork")
            .field("listeners", &state.listeners.len())
            .field("partitioned", &state.partitioned.len())
            .field("queue_capacity", &self.queue_capacity)
            .finish()
    }
}

/// Inbound side of a registered address.
pub struct Listener {
    addr: Address,
    inbox: mpsc::Receiver<Envelope>,
}

impl Listener {
    pub fn addr(&self) -> Address {
        self.addr
    }

    /// Receive the next envelope.
    ///
    /// Returns `None` once the address is deregistered and the queue has
    /// been drained.
    pub async fn recv(&mut self) -> Option<Envelope> {
        self.inbox.recv().await
    }
}

/// Lightweight outbound handle returned by one dial.
///
/// Dropped after each send; there is no connection reuse.
pub struct Dialer {
    remote: Address,
    network: MemoryNetwork,
}

impl Dialer {
    pub fn remote(&self) -> Address {
        self.remote
    }

    /// Enqueue an envelope into the remote queue.
    ///
    /// Per sender-to-receiver ordering is FIFO (single queue, single enqueue
    /// point); there is no ordering guarantee across different senders.
    pub fn send(&self, envelope: Envelope) -> TransportResult<()> {
        self.network.send(envelope)
    }
}
