//! Sender finite-state machine (FSM) types.
//!
//! This module defines every state the [`crate::sender::ArqSender`] can
//! occupy.  State transitions are *not* implemented here — they live in
//! [`crate::sender`] — keeping the type free for guard logic or tracing
//! without touching the transfer plumbing.
//!
//! ```text
//!  Handshaking ──ACK observed──▶ Sending ──all sequences acked──▶ Completed
//!                                                                    │
//!                                                 report computed    │
//!                                                                    ▼
//!                                                               Reporting
//! ```

/// All possible states of the sender FSM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SenderState {
    /// SYN sent; polling for the handshake ACK.  With no retry limit
    /// configured this state can be occupied indefinitely.
    #[default]
    Handshaking,
    /// Window fill / response collection / retransmission rounds in progress.
    Sending,
    /// Every sequence number has been acknowledged; transfer finished.
    Completed,
    /// Terminal: session statistics have been computed from the frozen
    /// samples and counters.
    Reporting,
}

impl std::fmt::Display for SenderState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SenderState::Handshaking => "handshaking",
            SenderState::Sending => "sending",
            SenderState::Completed => "completed",
            SenderState::Reporting => "reporting",
        };
        write!(f, "{s}")
    }
}
