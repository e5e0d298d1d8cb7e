//! Integration tests for the connection handshake.
//!
//! Each test spins up a receiver (real or scripted) on loopback and drives
//! the handshake against it from a separate tokio task.

use std::net::SocketAddr;
use std::time::Duration;

use arq_over_udp::packet::{Kind, Packet};
use arq_over_udp::receiver::{LossyReceiver, ReceiverConfig};
use arq_over_udp::sender::{ArqSender, SenderConfig, SenderError};
use arq_over_udp::socket::Socket;
use arq_over_udp::state::SenderState;

/// Bind a socket to an OS-assigned port on loopback.
async fn ephemeral() -> Socket {
    let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
    Socket::bind(addr).await.expect("bind failed")
}

/// Start a [`LossyReceiver`] on loopback and return its address.
async fn start_receiver(drop_probability: f64) -> SocketAddr {
    let receiver = LossyReceiver::bind(ReceiverConfig {
        bind: "127.0.0.1:0".parse().unwrap(),
        drop_probability,
    })
    .await
    .expect("receiver bind");
    let addr = receiver.local_addr();
    tokio::spawn(async move {
        let _ = receiver.serve().await;
    });
    addr
}

// ---------------------------------------------------------------------------
// Test 1: SYN is answered with ACK(0)
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_syn_gets_ack_zero() {
    let server = start_receiver(0.0).await;
    let sock = ephemeral().await;

    sock.send_to(&Packet::syn(), server).await.expect("send SYN");

    let (reply, from) = sock.recv_from().await.expect("recv ACK");
    assert_eq!(from, server);
    assert_eq!(reply.kind, Kind::Ack);
    assert_eq!(reply.sequence, 0);
    assert!(reply.payload.is_empty());
}

// ---------------------------------------------------------------------------
// Test 2: repeated SYNs are each acknowledged (idempotent handshake)
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_repeated_syn_is_idempotent() {
    let server = start_receiver(0.0).await;
    let sock = ephemeral().await;

    for _ in 0..3 {
        sock.send_to(&Packet::syn(), server).await.expect("send SYN");
        let (reply, _) = sock.recv_from().await.expect("recv ACK");
        assert_eq!(reply, Packet::ack(0));
    }
}

// ---------------------------------------------------------------------------
// Test 3: the SYN is acknowledged even on a maximally lossy channel
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_handshake_survives_lossy_channel() {
    // Drop probability applies to DATA only; 0.99 must not affect the SYN.
    let server = start_receiver(0.99).await;
    let sock = ephemeral().await;

    sock.send_to(&Packet::syn(), server).await.expect("send SYN");
    let (reply, _) = sock.recv_from().await.expect("recv ACK");
    assert_eq!(reply, Packet::ack(0));
}

// ---------------------------------------------------------------------------
// Test 4: a zero-length session is just the handshake plus an empty report
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_empty_session_completes_after_handshake() {
    let server = start_receiver(0.0).await;

    let mut config = SenderConfig::new(server);
    config.total_count = 0;

    let sender = ArqSender::bind(config).await.expect("sender bind");
    assert_eq!(sender.state(), SenderState::Handshaking);

    let report = sender.run().await.expect("run");

    assert_eq!(report.packets_sent, 0);
    assert_eq!(report.acknowledged, 0);
    assert_eq!(report.retransmissions, 0);
    assert!(report.rtt.is_none());
}

// ---------------------------------------------------------------------------
// Test 5: bounded handshake gives up against a silent peer
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_bounded_handshake_times_out() {
    // A socket that is bound but never serviced: SYNs queue up unanswered.
    let silent = ephemeral().await;
    let server = silent.local_addr;

    let mut config = SenderConfig::new(server);
    config.max_handshake_retries = Some(2);

    let sender = ArqSender::bind(config).await.expect("sender bind");
    let err = sender.run().await.expect_err("handshake must time out");

    // Initial SYN + 2 retries.
    match err {
        SenderError::HandshakeTimeout { attempts } => assert_eq!(attempts, 3),
        other => panic!("unexpected error: {other}"),
    }
}

// ---------------------------------------------------------------------------
// Test 6: the handshake ACK can arrive late, after several polls
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_handshake_tolerates_slow_ack() {
    // Scripted peer: sit on the SYN for a few poll intervals, then ACK.
    let peer_sock = ephemeral().await;
    let server = peer_sock.local_addr;

    let peer = tokio::spawn(async move {
        let (pkt, from) = peer_sock.recv_from().await.expect("recv SYN");
        assert_eq!(pkt.kind, Kind::Syn);
        tokio::time::sleep(Duration::from_millis(350)).await;
        peer_sock.send_to(&Packet::ack(0), from).await.expect("send ACK");
    });

    let mut config = SenderConfig::new(server);
    config.total_count = 0;

    let sender = ArqSender::bind(config).await.expect("sender bind");
    let report = sender.run().await.expect("late ACK must still complete");
    assert_eq!(report.acknowledged, 0);

    peer.await.unwrap();
}
