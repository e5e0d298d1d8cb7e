//! ARQ sender state machine: handshake + windowed transfer + report.
//!
//! # Architecture
//!
//! ```text
//!  ArqSender
//!    ├── SendWindow   (sliding window, transmit records)   ── no I/O
//!    ├── SessionStats (RTT samples, retransmission count)  ── no I/O
//!    └── Socket       (async UDP, bounded-wait polls)
//! ```
//!
//! The sender is a single logical thread of control: it never runs anything
//! in parallel, it only suspends inside bounded [`tokio::time::timeout`]
//! polls on the socket.  One *round* of the sending phase is:
//!
//! 1. **Window fill** — transmit every eligible, unacknowledged sequence
//!    number and advance `next_to_send`.
//! 2. **Response collection** — poll for ACKs until the retry timeout
//!    elapses.  Each first-observed ACK yields an RTT sample and may slide
//!    the window.  Collection ends early once nothing is in flight.
//! 3. **Timeout** — if outstanding sequences remain when the retry timeout
//!    expires, retransmit the whole outstanding window, rewind
//!    `next_to_send`, and count one retransmission round.
//!
//! Rounds repeat until every sequence number is acknowledged.
//!
//! The handshake intentionally mirrors the permissive original protocol: one
//! SYN, polled forever.  If its ACK is permanently lost the state machine
//! never leaves [`SenderState::Handshaking`] — opt into
//! [`SenderConfig::max_handshake_retries`] for a bounded variant that
//! re-sends the SYN and eventually gives up.

use std::net::{Ipv4Addr, SocketAddr};
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::time::timeout;

use crate::packet::{Kind, Packet};
use crate::payload::payload_for;
use crate::socket::{Socket, SocketError};
use crate::state::SenderState;
use crate::stats::{SessionStats, TransferReport};
use crate::window::SendWindow;

/// Bounded wait per handshake poll.
const HANDSHAKE_POLL: Duration = Duration::from_millis(100);

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Sender-side configuration.
#[derive(Debug, Clone)]
pub struct SenderConfig {
    /// Receiver address.
    pub server: SocketAddr,
    /// Sliding-window capacity N (≥ 1).
    pub window_capacity: u16,
    /// DATA payload size in bytes.
    pub payload_size: u16,
    /// Retry timeout: the length of one response-collection phase.
    pub retry_timeout: Duration,
    /// Total number of sequence numbers to deliver (`0..total_count`).
    pub total_count: u16,
    /// `None` (default): poll for the handshake ACK forever without
    /// re-sending the SYN.  `Some(n)`: re-send the SYN after each expired
    /// poll, failing with [`SenderError::HandshakeTimeout`] once the initial
    /// attempt plus `n` retries are exhausted.
    pub max_handshake_retries: Option<u32>,
}

impl SenderConfig {
    /// Configuration with the protocol's stock parameters: window 5,
    /// 80-byte payloads, 300 ms retry timeout, 30 packets.
    pub fn new(server: SocketAddr) -> Self {
        Self {
            server,
            window_capacity: 5,
            payload_size: 80,
            retry_timeout: Duration::from_millis(300),
            total_count: 30,
            max_handshake_retries: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors that can terminate a sender session.
#[derive(Debug, Error)]
pub enum SenderError {
    /// Socket-level failure; not locally recovered.
    #[error(transparent)]
    Socket(#[from] SocketError),

    /// The bounded handshake gave up without observing an ACK.
    #[error("handshake ACK not observed after {attempts} SYN transmissions")]
    HandshakeTimeout { attempts: u32 },
}

// ---------------------------------------------------------------------------
// ArqSender
// ---------------------------------------------------------------------------

/// The ARQ send-side session: `Handshaking → Sending → Completed → Reporting`.
pub struct ArqSender {
    config: SenderConfig,
    socket: Socket,
    state: SenderState,
    window: SendWindow,
    stats: SessionStats,
}

impl ArqSender {
    /// Bind an ephemeral local port and prepare a session.
    pub async fn bind(config: SenderConfig) -> Result<Self, SenderError> {
        let socket = Socket::bind(SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0))).await?;
        let window = SendWindow::new(config.total_count, config.window_capacity);
        Ok(Self {
            config,
            socket,
            state: SenderState::Handshaking,
            window,
            stats: SessionStats::new(),
        })
    }

    /// Current FSM state.
    pub fn state(&self) -> SenderState {
        self.state
    }

    /// Drive the session to completion and return the transfer report.
    pub async fn run(mut self) -> Result<TransferReport, SenderError> {
        self.handshake().await?;
        self.state = SenderState::Sending;

        self.transfer().await?;
        self.state = SenderState::Completed;
        log::info!(
            "transfer complete: {} sequence(s) acknowledged, {} retransmission round(s)",
            self.window.acknowledged_count(),
            self.stats.retransmissions()
        );

        let report = self
            .stats
            .report(self.window.next_to_send, self.window.acknowledged_count());
        self.state = SenderState::Reporting;
        Ok(report)
    }

    // -----------------------------------------------------------------------
    // Handshaking
    // -----------------------------------------------------------------------

    /// Send a SYN and poll in bounded waits until an ACK is observed.
    async fn handshake(&mut self) -> Result<(), SenderError> {
        self.socket.send_to(&Packet::syn(), self.config.server).await?;
        log::info!("→ SYN to {}; waiting for handshake ACK", self.config.server);

        let mut attempts = 1u32;
        loop {
            match timeout(HANDSHAKE_POLL, self.socket.recv_from()).await {
                Ok(Ok((packet, addr))) => {
                    if addr == self.config.server && packet.kind == Kind::Ack {
                        log::info!("connection established");
                        return Ok(());
                    }
                    log::debug!("[handshake] ignoring {} from {addr}", packet.kind);
                }
                Ok(Err(SocketError::Packet(e))) => {
                    log::debug!("[handshake] ignoring undecodable datagram: {e}");
                }
                Ok(Err(e)) => return Err(e.into()),
                Err(_elapsed) => {
                    let Some(max_retries) = self.config.max_handshake_retries else {
                        // Permissive default: the SYN is never re-sent and
                        // this state can be occupied indefinitely.
                        continue;
                    };
                    if attempts > max_retries {
                        return Err(SenderError::HandshakeTimeout { attempts });
                    }
                    attempts += 1;
                    self.socket.send_to(&Packet::syn(), self.config.server).await?;
                    log::debug!("[handshake] → SYN (attempt {attempts})");
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Sending
    // -----------------------------------------------------------------------

    /// Run fill / collect rounds until every sequence number is acknowledged.
    async fn transfer(&mut self) -> Result<(), SenderError> {
        log::info!(
            "sending {} packet(s) of {} byte(s), window {}",
            self.window.total_count(),
            self.config.payload_size,
            self.config.window_capacity
        );
        while !self.window.is_complete() {
            self.fill_window().await?;
            self.collect_responses().await?;
        }
        Ok(())
    }

    /// Window fill: transmit every eligible unacknowledged sequence number.
    async fn fill_window(&mut self) -> Result<(), SenderError> {
        while self.window.can_fill() {
            let seq = self.window.next_to_send;
            if !self.window.is_acknowledged(seq) {
                self.transmit(seq).await?;
                let first_byte = u32::from(seq) * u32::from(self.config.payload_size);
                let last_byte = first_byte + u32::from(self.config.payload_size).saturating_sub(1);
                log::debug!("→ DATA seq={seq} (bytes {first_byte}..{last_byte})");
            }
            self.window.advance();
        }
        Ok(())
    }

    /// Response collection: poll for ACKs for one retry-timeout period.
    ///
    /// Ends early when the session completes or nothing is left in flight;
    /// otherwise the expiring timeout triggers one retransmission round.
    async fn collect_responses(&mut self) -> Result<(), SenderError> {
        let deadline = Instant::now() + self.config.retry_timeout;

        loop {
            if self.window.is_complete() || !self.window.has_outstanding() {
                return Ok(());
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return self.retransmit_round().await;
            }

            match timeout(remaining, self.socket.recv_from()).await {
                Ok(Ok((packet, addr))) => {
                    if addr != self.config.server {
                        continue;
                    }
                    match packet.kind {
                        Kind::Ack => self.handle_ack(packet.sequence),
                        other => log::debug!("ignoring {} during transfer", other),
                    }
                }
                Ok(Err(SocketError::Packet(e))) => {
                    log::debug!("ignoring undecodable datagram: {e}");
                }
                Ok(Err(e)) => return Err(e.into()),
                Err(_elapsed) => return self.retransmit_round().await,
            }
        }
    }

    /// Process one inbound ACK: first observation yields an RTT sample and
    /// may slide the window; duplicates and unsolicited ACKs are ignored.
    fn handle_ack(&mut self, sequence: u16) {
        match self.window.on_ack(sequence, Instant::now()) {
            Some(rtt) => {
                self.stats.record_rtt(rtt);
                log::debug!(
                    "← ACK seq={sequence} rtt={}ms (window_start={}, {}/{} acked)",
                    rtt.as_millis(),
                    self.window.window_start,
                    self.window.acknowledged_count(),
                    self.window.total_count()
                );
            }
            None => log::debug!("← ACK seq={sequence} (duplicate or unsolicited; ignored)"),
        }
    }

    /// Timeout: go back N.  Retransmit every outstanding sequence number in
    /// the stalled window, rewind `next_to_send`, count one round.
    async fn retransmit_round(&mut self) -> Result<(), SenderError> {
        let outstanding = self.window.outstanding();
        self.stats.record_retransmission();
        log::info!(
            "timeout: retransmitting {} packet(s) from window_start={}",
            outstanding.len(),
            self.window.window_start
        );

        for seq in outstanding {
            self.transmit(seq).await?;
            log::debug!("↻ DATA seq={seq} (retransmit)");
        }
        self.window.rewind();
        Ok(())
    }

    /// Encode and send the DATA packet for `seq`, refreshing its transmit
    /// record.  The payload is regenerated, not buffered (see
    /// [`crate::payload`]).
    async fn transmit(&mut self, seq: u16) -> Result<(), SenderError> {
        let packet = Packet::data(seq, payload_for(seq, self.config.payload_size));
        self.socket.send_to(&packet, self.config.server).await?;
        self.window.record_sent(seq, Instant::now());
        Ok(())
    }
}
