//! Message-dispatch node.
//!
//! Handlers are registered per [`PayloadKind`]; registrations are rare and
//! dispatches frequent, so the table sits behind an `RwLock`. The handler
//! `Arc` is cloned out of the table before invocation so a handler may
//! register or replace handlers without deadlocking the loop.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use murmur_transport::{Address, Envelope, Listener, MemoryNetwork, PayloadKind};

use crate::error::{HandlerError, NodeError, NodeResult};

/// Outcome of one handler invocation.
pub type HandlerResult = Result<(), HandlerError>;

/// A registered message handler.
pub type Handler = Arc<dyn Fn(Envelope) -> HandlerResult + Send + Sync>;

struct NodeInner {
    address: Address,
    network: MemoryNetwork,
    handlers: RwLock<HashMap<PayloadKind, Handler>>,
    /// Receives envelopes whose kind has no registered handler, including
    /// unknown wire tags.
    fallback: RwLock<Option<Handler>>,
    /// Taken by `start`; present only before the loop launches.
    listener: Mutex<Option<Listener>>,
    receive_loop: Mutex<Option<JoinHandle<()>>>,
    closed: AtomicBool,
}

/// One address-bound participant with a typed dispatch table.
///
/// Cheap to clone; clones share the same dispatch state and receive loop.
#[derive(Clone)]
pub struct Node {
    inner: Arc<NodeInner>,
}

impl Node {
    /// Bind `address` on the network and prepare a dispatch node for it.
    pub fn bind(network: MemoryNetwork, address: Address) -> NodeResult<Self> {
        let listener = network.listen(address)?;
        Ok(Self {
            inner: Arc::new(NodeInner {
                address,
                network,
                handlers: RwLock::new(HashMap::new()),
                fallback: RwLock::new(None),
                listener: Mutex::new(Some(listener)),
                receive_loop: Mutex::new(None),
                closed: AtomicBool::new(false),
            }),
        })
    }

    pub fn address(&self) -> Address {
        self.inner.address
    }

    pub fn network(&self) -> &MemoryNetwork {
        &self.inner.network
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    /// Register a handler for `kind`. A later registration for the same kind
    /// replaces the earlier one.
    pub fn handle<F>(&self, kind: PayloadKind, handler: F)
    where
        F: Fn(Envelope) -> HandlerResult + Send + Sync + 'static,
    {
        self.inner
            .handlers
            .write()
            .expect("handler table lock poisoned")
            .insert(kind, Arc::new(handler));
    }

    /// Register the fallback handler for envelopes no kind handler matches.
    pub fn handle_fallback<F>(&self, handler: F)
    where
        F: Fn(Envelope) -> HandlerResult + Send + Sync + 'static,
    {
        *self
            .inner
            .fallback
            .write()
            .expect("fallback lock poisoned") = Some(Arc::new(handler));
    }

    /// Launch the receive loop.
    ///
    /// One loop per node; calling `start` again is a no-op. The loop exits
    /// cleanly once the node is closed and the inbound queue has drained.
    pub fn start(&self) {
        let Some(mut listener) = self
            .inner
            .listener
            .lock()
            .expect("listener slot lock poisoned")
            .take()
        else {
            return;
        };

        let node = self.clone();
        let handle = tokio::spawn(async move {
            while let Some(envelope) = listener.recv().await {
                node.dispatch(envelope);
            }
            debug!(addr = %node.inner.address, "receive loop stopped");
        });

        *self
            .inner
            .receive_loop
            .lock()
            .expect("receive loop slot lock poisoned") = Some(handle);
    }

    fn dispatch(&self, envelope: Envelope) {
        let handler = {
            let handlers = self
                .inner
                .handlers
                .read()
                .expect("handler table lock poisoned");
            envelope
                .kind()
                .and_then(|kind| handlers.get(&kind).cloned())
                .or_else(|| {
                    self.inner
                        .fallback
                        .read()
                        .expect("fallback lock poisoned")
                        .clone()
                })
        };

        match handler {
            Some(handler) => {
                if let Err(e) = handler(envelope) {
                    warn!(addr = %self.inner.address, error = %e, "handler failed");
                }
            }
            None => {
                debug!(
                    addr = %self.inner.address,
                    from = %envelope.from,
                    "dropping envelope with no matching handler"
                );
            }
        }
    }

    /// Build the tagged payload, dial the destination, and send.
    ///
    /// One dial per send; the outbound handle is released immediately.
    pub fn send(&self, to: Address, kind: PayloadKind, body: &[u8]) -> NodeResult<()> {
        if self.is_closed() {
            return Err(NodeError::Closed);
        }
        let dialer = self.inner.network.dial(to)?;
        dialer.send(Envelope::tagged(self.inner.address, to, kind, body))?;
        Ok(())
    }

    pub fn send_string(&self, to: Address, kind: PayloadKind, body: &str) -> NodeResult<()> {
        self.send(to, kind, body.as_bytes())
    }

    /// Close the node: deregister the address and wait for the receive loop
    /// to drain and exit. Idempotent; closed is terminal.
    pub async fn close(&self) {
        if self.inner.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.inner.network.close(self.inner.address);

        let handle = self
            .inner
            .receive_loop
            .lock()
            .expect("receive loop slot lock poisoned")
            .take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }

        // Never started: release the queue held by the unstarted listener.
        self.inner
            .listener
            .lock()
            .expect("listener slot lock poisoned")
            .take();
    }
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("address", &self.inner.address)
            .field("closed", &self.is_closed())
            .finish()
    }
}
