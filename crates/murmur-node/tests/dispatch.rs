//! Integration tests for node dispatch over the in-process transport.

use std::time::Duration;

use bytes::Bytes;
use tokio::sync::mpsc;
use tokio::time::timeout;

use murmur_node::{HandlerError, Node, NodeError};
use murmur_transport::{Address, Envelope, MemoryNetwork, PayloadKind, TransportError};

const WAIT: Duration = Duration::from_secs(5);

async fn recv_signal<T>(rx: &mut mpsc::Receiver<T>, what: &str) -> T {
    timeout(WAIT, rx.recv())
        .await
        .unwrap_or_else(|_| panic!("timeout waiting for: {what}"))
        .expect("signal channel closed")
}

#[tokio::test]
async fn test_request_reply_between_two_nodes() {
    let network = MemoryNetwork::new();
    let alice = Node::bind(network.clone(), Address::localhost(9000)).unwrap();
    let bob = Node::bind(network.clone(), Address::localhost(9001)).unwrap();

    let (done_tx, mut done_rx) = mpsc::channel::<String>(1);

    // Alice answers peer-list requests.
    let alice_handle = alice.clone();
    alice.handle(PayloadKind::Discover, move |envelope| {
        alice_handle.send_string(envelope.from, PayloadKind::Peers, "nice to meet you")?;
        Ok(())
    });

    // Bob records the reply.
    bob.handle(PayloadKind::Peers, move |envelope| {
        let body = String::from_utf8_lossy(envelope.body()).into_owned();
        done_tx.try_send(body).ok();
        Ok(())
    });

    alice.start();
    bob.start();
    bob.send_string(alice.address(), PayloadKind::Discover, "")
        .unwrap();

    let reply = recv_signal(&mut done_rx, "reply from alice").await;
    assert_eq!(reply, "nice to meet you");

    alice.close().await;
    bob.close().await;
}

#[tokio::test]
async fn test_handler_error_does_not_stop_receive_loop() {
    let network = MemoryNetwork::new();
    let node = Node::bind(network.clone(), Address::localhost(9000)).unwrap();
    let sender = Address::localhost(9001);

    let (seen_tx, mut seen_rx) = mpsc::channel::<Vec<u8>>(4);

    node.handle(PayloadKind::Gossip, move |envelope| {
        let body = envelope.body().to_vec();
        seen_tx.try_send(body.clone()).ok();
        if body == b"bad" {
            return Err(HandlerError::Other("synthetic failure".into()));
        }
        Ok(())
    });
    node.start();

    let dialer = network.dial(node.address()).unwrap();
    dialer
        .send(Envelope::tagged(
            sender,
            node.address(),
            PayloadKind::Gossip,
            b"bad",
        ))
        .unwrap();
    dialer
        .send(Envelope::tagged(
            sender,
            node.address(),
            PayloadKind::Gossip,
            b"good",
        ))
        .unwrap();

    assert_eq!(recv_signal(&mut seen_rx, "first envelope").await, b"bad");
    // The loop survived the handler error and delivered the next envelope.
    assert_eq!(recv_signal(&mut seen_rx, "second envelope").await, b"good");

    node.close().await;
}

#[tokio::test]
async fn test_fallback_receives_unknown_tag() {
    let network = MemoryNetwork::new();
    let node = Node::bind(network.clone(), Address::localhost(9000)).unwrap();
    let sender = Address::localhost(9001);

    let (seen_tx, mut seen_rx) = mpsc::channel::<Vec<u8>>(1);
    node.handle_fallback(move |envelope| {
        seen_tx.try_send(envelope.payload.to_vec()).ok();
        Ok(())
    });
    node.start();

    let dialer = network.dial(node.address()).unwrap();
    dialer
        .send(Envelope {
            from: sender,
            to: node.address(),
            payload: Bytes::from_static(b"mystery:data"),
        })
        .unwrap();

    let payload = recv_signal(&mut seen_rx, "fallback dispatch").await;
    assert_eq!(payload, b"mystery:data");

    node.close().await;
}

#[tokio::test]
async fn test_later_registration_replaces_earlier() {
    let network = MemoryNetwork::new();
    let node = Node::bind(network.clone(), Address::localhost(9000)).unwrap();
    let sender = Address::localhost(9001);

    let (tx, mut rx) = mpsc::channel::<&'static str>(1);
    let first_tx = tx.clone();
    node.handle(PayloadKind::Gossip, move |_| {
        first_tx.try_send("first").ok();
        Ok(())
    });
    node.handle(PayloadKind::Gossip, move |_| {
        tx.try_send("second").ok();
        Ok(())
    });
    node.start();

    network
        .dial(node.address())
        .unwrap()
        .send(Envelope::tagged(
            sender,
            node.address(),
            PayloadKind::Gossip,
            b"x",
        ))
        .unwrap();

    assert_eq!(recv_signal(&mut rx, "replaced handler").await, "second");

    node.close().await;
}

#[tokio::test]
async fn test_partition_blocks_and_heal_restores() {
    let network = MemoryNetwork::new();
    let a = Node::bind(network.clone(), Address::localhost(9000)).unwrap();
    let b = Node::bind(network.clone(), Address::localhost(9001)).unwrap();

    let (seen_tx, mut seen_rx) = mpsc::channel::<Vec<u8>>(2);
    b.handle(PayloadKind::Gossip, move |envelope| {
        seen_tx.try_send(envelope.body().to_vec()).ok();
        Ok(())
    });
    a.start();
    b.start();

    a.send_string(b.address(), PayloadKind::Gossip, "before")
        .unwrap();
    assert_eq!(recv_signal(&mut seen_rx, "normal delivery").await, b"before");

    network.partition(&[a.address()], &[b.address()]);
    let err = a
        .send_string(b.address(), PayloadKind::Gossip, "blocked")
        .unwrap_err();
    assert!(matches!(
        err,
        NodeError::Transport(TransportError::NetworkPartitioned { .. })
    ));

    network.heal();
    a.send_string(b.address(), PayloadKind::Gossip, "after")
        .unwrap();
    assert_eq!(recv_signal(&mut seen_rx, "post-heal delivery").await, b"after");

    a.close().await;
    b.close().await;
}

#[tokio::test]
async fn test_dial_fails_after_node_closes() {
    let network = MemoryNetwork::new();
    let node = Node::bind(network.clone(), Address::localhost(9000)).unwrap();
    let addr = node.address();
    node.start();
    node.close().await;

    assert_eq!(
        network.dial(addr).err(),
        Some(TransportError::AddressNotFound(addr)),
    );
}

#[tokio::test]
async fn test_send_from_closed_node_fails() {
    let network = MemoryNetwork::new();
    let a = Node::bind(network.clone(), Address::localhost(9000)).unwrap();
    let b = Node::bind(network.clone(), Address::localhost(9001)).unwrap();
    b.start();

    a.close().await;
    assert!(matches!(
        a.send_string(b.address(), PayloadKind::Gossip, "x"),
        Err(NodeError::Closed)
    ));

    b.close().await;
}
