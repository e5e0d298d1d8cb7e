//! `arq-over-udp` — windowed ARQ (Go-Back-N style) data transfer over a
//! lossy UDP channel.
//!
//! # Architecture
//!
//! ```text
//!  ┌────────────┐  DATA (seq, payload)   ┌───────────────┐
//!  │ ArqSender  │───────────────────────▶│ LossyReceiver │──┐ drops with
//!  └────┬───────┘                        └───────┬───────┘◀─┘ probability p
//!       │              ACK (seq)                 │
//!       │◀───────────────────────────────────────┘
//!       │
//!  ┌────▼──────────────────────────────┐
//!  │  SendWindow + SessionStats        │
//!  │  (pure state, no I/O)             │
//!  └────┬──────────────────────────────┘
//!       │ encoded datagrams
//!  ┌────▼──────┐
//!  │  Socket   │  (thin async wrapper around tokio UdpSocket)
//!  └───────────┘
//! ```
//!
//! The sender transmits a configurable number of deterministic pseudorandom
//! payloads through a sliding window, measures RTT per acknowledgement,
//! retransmits the outstanding window on timeout, and reports summary
//! statistics.  The receiver acknowledges everything it doesn't decide to
//! drop — simulated loss is its whole purpose.
//!
//! Each module has a single responsibility:
//! - [`packet`]   — wire format (serialise / deserialise)
//! - [`payload`]  — deterministic per-sequence payload generation
//! - [`socket`]   — async UDP socket abstraction
//! - [`window`]   — sliding-window send state machine
//! - [`stats`]    — RTT samples, retransmission counting, transfer report
//! - [`state`]    — sender finite-state-machine types
//! - [`sender`]   — ARQ sender session (handshake, rounds, report)
//! - [`receiver`] — lossy-channel receiver (per-datagram task dispatch)

pub mod packet;
pub mod payload;
pub mod receiver;
pub mod sender;
pub mod socket;
pub mod state;
pub mod stats;
pub mod window;
