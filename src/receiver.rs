//! Lossy-channel receiver.
//!
//! The receiver terminates connection handshakes and acknowledges DATA
//! packets — except that with probability `drop_probability` it silently
//! discards an inbound DATA packet, which is the protocol's sole loss
//! mechanism.  Payload content is never validated; the receiver is
//! payload-agnostic.
//!
//! # Concurrency
//!
//! Every inbound datagram is dispatched to its own lightweight task
//! ([`tokio::spawn`]).  Units of work share nothing mutable: each owns its
//! private datagram bytes and a handle to the socket, whose `send_to` calls
//! are atomic per datagram.  No ordering is guaranteed across units — the
//! sender side already tolerates out-of-order, duplicated, and dropped
//! acknowledgements, so none is needed.
//!
//! No per-connection session object is retained across packets; handling is
//! stateless per datagram.

use std::net::SocketAddr;
use std::sync::Arc;

use rand::Rng;

use crate::packet::{Kind, Packet};
use crate::socket::{Socket, SocketError};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Receiver-side configuration.
#[derive(Debug, Clone)]
pub struct ReceiverConfig {
    /// Local address to bind.
    pub bind: SocketAddr,
    /// Probability in `[0, 1)` that an inbound DATA packet is dropped.
    pub drop_probability: f64,
}

// ---------------------------------------------------------------------------
// LossyReceiver
// ---------------------------------------------------------------------------

/// A UDP server that acknowledges the ARQ sender across a simulated lossy
/// channel.
pub struct LossyReceiver {
    socket: Arc<Socket>,
    drop_probability: f64,
}

impl LossyReceiver {
    /// Bind the receiver socket.
    pub async fn bind(config: ReceiverConfig) -> Result<Self, SocketError> {
        assert!(
            (0.0..1.0).contains(&config.drop_probability),
            "drop probability must be in [0, 1)"
        );
        let socket = Socket::bind(config.bind).await?;
        log::info!(
            "receiver listening on {} (drop probability {:.0}%)",
            socket.local_addr,
            config.drop_probability * 100.0
        );
        Ok(Self {
            socket: Arc::new(socket),
            drop_probability: config.drop_probability,
        })
    }

    /// Address the receiver is bound to (useful with an ephemeral port).
    pub fn local_addr(&self) -> SocketAddr {
        self.socket.local_addr
    }

    /// Run the dispatch loop forever.
    ///
    /// Each datagram is handed to an independent task; a task that fails to
    /// send its reply dies alone, while decode failures are logged and
    /// swallowed inside the task.  Only an error on the receiving socket
    /// itself ends the loop.
    pub async fn serve(&self) -> Result<(), SocketError> {
        loop {
            let (bytes, peer) = self.socket.recv_raw().await?;
            let socket = Arc::clone(&self.socket);
            let drop_probability = self.drop_probability;
            tokio::spawn(async move {
                if let Some(reply) = response_for(&bytes, peer, drop_probability) {
                    if let Err(e) = socket.send_to(&reply, peer).await {
                        log::error!("[recv] sending ACK to {peer} failed: {e}");
                    }
                }
            });
        }
    }
}

/// Decide the reply (if any) for one inbound datagram.
///
/// - SYN → `ACK(0)`, unconditionally and idempotently.
/// - DATA → dropped with `drop_probability`, otherwise `ACK(sequence)`.
/// - Anything else — stray ACKs, unknown kinds, undecodable bytes — is
///   logged and ignored, never propagated as an error.
fn response_for(bytes: &[u8], peer: SocketAddr, drop_probability: f64) -> Option<Packet> {
    let packet = match Packet::decode(bytes) {
        Ok(packet) => packet,
        Err(e) => {
            log::warn!("[recv] ignoring undecodable datagram from {peer}: {e}");
            return None;
        }
    };

    match packet.kind {
        Kind::Syn => {
            log::info!("[recv] connection request from {peer}");
            Some(Packet::ack(0))
        }
        Kind::Data => {
            if rand::thread_rng().gen_bool(drop_probability) {
                log::info!("[recv] simulating loss: DATA seq={} dropped", packet.sequence);
                None
            } else {
                log::debug!(
                    "[recv] ← DATA seq={} len={}; → ACK seq={}",
                    packet.sequence,
                    packet.payload.len(),
                    packet.sequence
                );
                Some(Packet::ack(packet.sequence))
            }
        }
        Kind::Ack => {
            log::warn!("[recv] ignoring unexpected ACK from {peer}");
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
