//! ARQ send-window state machine.
//!
//! [`SendWindow`] tracks the sliding transmission window for one session:
//! which sequence numbers may be put on the wire, which have been
//! acknowledged, and when each outstanding one was last transmitted.
//!
//! # Protocol contract
//!
//! - At most `capacity` sequence numbers may be in flight at once:
//!   `next_to_send` never passes `window_start + capacity`.
//! - Acknowledgements are accepted **selectively**: each ACK marks exactly
//!   one sequence number, in any order, and yields one RTT sample on first
//!   observation.  Duplicates are ignored.
//! - The window slides only while `window_start` itself is acknowledged, so
//!   a single lost packet stalls the left edge.
//! - Retransmission is **go-back-N**: on timeout the caller resends every
//!   unacknowledged sequence number in
//!   `[window_start, min(window_start + capacity, total_count))` and rewinds
//!   `next_to_send` to `window_start`.
//!
//! The selective-acceptance / whole-window-retransmit pairing is the defining
//! behavior of this protocol and is preserved as-is.
//!
//! This module only manages state; all socket I/O is the caller's
//! responsibility.

use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

/// Send-window state for one transfer session.
///
/// # Sequence-number layout
///
/// ```text
///  window_start        next_to_send       window_start + capacity
///      │                    │                    │
///  ────┼────────────────────┼────────────────────┼──────▶ seq space
///      │ ◀── in flight ───▶ │ ◀─── sendable ───▶ │
/// ```
#[derive(Debug)]
pub struct SendWindow {
    /// Left window edge: the oldest sequence number not yet acknowledged.
    pub window_start: u16,

    /// The next sequence number the fill step will consider.
    pub next_to_send: u16,

    /// Maximum number of sequence numbers in flight simultaneously (N).
    capacity: u16,

    /// Total sequence numbers in the session: `0..total_count`.
    total_count: u16,

    /// Sequence numbers acknowledged so far (selective, possibly sparse).
    acknowledged: HashSet<u16>,

    /// Send timestamp per outstanding sequence number, kept until that
    /// sequence is acknowledged.  Refreshed on every (re)transmission.
    transmit_times: HashMap<u16, Instant>,
}

impl SendWindow {
    /// Create a new [`SendWindow`] covering sequences `0..total_count`.
    ///
    /// `capacity` is the window size N (≥ 1).
    pub fn new(total_count: u16, capacity: u16) -> Self {
        assert!(capacity >= 1, "window capacity must be at least 1");
        Self {
            window_start: 0,
            next_to_send: 0,
            capacity,
            total_count,
            acknowledged: HashSet::new(),
            transmit_times: HashMap::new(),
        }
    }

    /// Right edge of the current window, clamped to `total_count`.
    fn window_end(&self) -> u16 {
        (u32::from(self.window_start) + u32::from(self.capacity))
            .min(u32::from(self.total_count)) as u16
    }

    /// `true` while the fill step may consider another sequence number.
    pub fn can_fill(&self) -> bool {
        self.next_to_send < self.window_end()
    }

    /// `true` if `sequence` has been acknowledged.
    pub fn is_acknowledged(&self, sequence: u16) -> bool {
        self.acknowledged.contains(&sequence)
    }

    /// Record a transmission of `sequence` at `now`.
    ///
    /// Overwrites any previous timestamp, so a retransmission refreshes the
    /// base for the next RTT sample.
    pub fn record_sent(&mut self, sequence: u16, now: Instant) {
        self.transmit_times.insert(sequence, now);
    }

    /// Advance `next_to_send` past the sequence number the fill step just
    /// considered (whether or not it was put on the wire).
    pub fn advance(&mut self) {
        debug_assert!(
            self.can_fill(),
            "advance past the window edge ({} / {})",
            self.next_to_send,
            self.window_end()
        );
        self.next_to_send += 1;
    }

    /// Process an inbound acknowledgement for `sequence`.
    ///
    /// On the first observation of an ACK for an outstanding sequence this
    /// returns the RTT sample (`now` minus the recorded send time), marks the
    /// sequence acknowledged, drops its transmit record, and slides
    /// `window_start` forward past every contiguously acknowledged sequence.
    ///
    /// Returns `None` for a duplicate ACK or one with no matching transmit
    /// record; neither mutates any state.
    pub fn on_ack(&mut self, sequence: u16, now: Instant) -> Option<Duration> {
        if self.acknowledged.contains(&sequence) {
            return None;
        }
        let sent_at = self.transmit_times.remove(&sequence)?;

        self.acknowledged.insert(sequence);
        while self.acknowledged.contains(&self.window_start) {
            self.window_start += 1;
        }
        Some(now.duration_since(sent_at))
    }

    /// `true` while at least one transmitted sequence awaits acknowledgement.
    ///
    /// Equivalent to `window_start != next_to_send`: the left edge only
    /// reaches `next_to_send` once everything sent so far is acknowledged.
    pub fn has_outstanding(&self) -> bool {
        self.window_start != self.next_to_send
    }

    /// Every unacknowledged sequence number in the current window,
    /// `[window_start, min(window_start + capacity, total_count))`, in order.
    ///
    /// This is the go-back-N retransmission set.  It can include sequence
    /// numbers past `next_to_send` when the window slid during response
    /// collection; those get their first transmission from the retransmit
    /// step instead of the fill step.
    pub fn outstanding(&self) -> Vec<u16> {
        (self.window_start..self.window_end())
            .filter(|seq| !self.acknowledged.contains(seq))
            .collect()
    }

    /// Rewind `next_to_send` to `window_start` (the "go back" step, taken
    /// after retransmitting the outstanding set).
    pub fn rewind(&mut self) {
        self.next_to_send = self.window_start;
    }

    /// `true` once every sequence in `0..total_count` is acknowledged.
    pub fn is_complete(&self) -> bool {
        self.acknowledged.len() == usize::from(self.total_count)
    }

    /// Number of distinct sequence numbers acknowledged so far.
    pub fn acknowledged_count(&self) -> usize {
        self.acknowledged.len()
    }

    /// Total sequence numbers in the session.
    pub fn total_count(&self) -> u16 {
        self.total_count
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    /// Helper: mark `seq` sent just now and return the timestamp used.
    fn send(w: &mut SendWindow, seq: u16) -> Instant {
        let now = Instant::now();
        w.record_sent(seq, now);
        w.advance();
        now
    }

    /// Helper: run the fill step, sending everything eligible.
    fn fill(w: &mut SendWindow) -> Vec<u16> {
        let mut sent = Vec::new();
        while w.can_fill() {
            let seq = w.next_to_send;
            if !w.is_acknowledged(seq) {
                w.record_sent(seq, Instant::now());
                sent.push(seq);
            }
            w.advance();
        }
        sent
    }

    #[test]
    fn initial_state() {
        let w = SendWindow::new(30, 5);
        assert_eq!(w.window_start, 0);
        assert_eq!(w.next_to_send, 0);
        assert!(w.can_fill());
        assert!(!w.has_outstanding());
        assert!(!w.is_complete());
        assert_eq!(w.acknowledged_count(), 0);
    }

    #[test]
    fn fill_stops_at_capacity() {
        let mut w = SendWindow::new(30, 5);
        assert_eq!(fill(&mut w), vec![0, 1, 2, 3, 4]);
        assert!(!w.can_fill());
        assert_eq!(w.next_to_send, 5);
        assert!(w.has_outstanding());
    }

    #[test]
    fn fill_stops_at_total_count() {
        let mut w = SendWindow::new(3, 5);
        assert_eq!(fill(&mut w), vec![0, 1, 2]);
        assert!(!w.can_fill());
        assert_eq!(w.next_to_send, 3);
    }

    #[test]
    fn window_invariants_hold_throughout() {
        let mut w = SendWindow::new(10, 3);
        let check = |w: &SendWindow| {
            assert!(w.window_start <= w.next_to_send);
            assert!(u32::from(w.next_to_send) <= u32::from(w.window_start) + 3);
            assert!(w.next_to_send <= 10);
        };

        check(&w);
        fill(&mut w);
        check(&w);
        w.on_ack(1, Instant::now()); // out of order
        check(&w);
        w.on_ack(0, Instant::now());
        check(&w);
        fill(&mut w);
        check(&w);
    }

    #[test]
    fn in_order_acks_slide_window() {
        let mut w = SendWindow::new(10, 3);
        fill(&mut w); // 0, 1, 2

        assert!(w.on_ack(0, Instant::now()).is_some());
        assert_eq!(w.window_start, 1);
        assert!(w.on_ack(1, Instant::now()).is_some());
        assert_eq!(w.window_start, 2);
        assert!(w.on_ack(2, Instant::now()).is_some());
        assert_eq!(w.window_start, 3);
        assert!(!w.has_outstanding());
    }

    #[test]
    fn out_of_order_ack_accepted_but_window_stalls() {
        let mut w = SendWindow::new(10, 3);
        fill(&mut w); // 0, 1, 2

        // ACKs 1 and 2 arrive; 0 is lost.  Selective acceptance records both,
        // but the left edge stalls at the unacknowledged 0.
        assert!(w.on_ack(1, Instant::now()).is_some());
        assert!(w.on_ack(2, Instant::now()).is_some());
        assert_eq!(w.window_start, 0);
        assert_eq!(w.acknowledged_count(), 2);
        assert!(w.has_outstanding());

        // The late ACK for 0 releases the whole run at once.
        assert!(w.on_ack(0, Instant::now()).is_some());
        assert_eq!(w.window_start, 3);
        assert!(!w.has_outstanding());
    }

    #[test]
    fn duplicate_ack_ignored() {
        let mut w = SendWindow::new(10, 3);
        fill(&mut w);

        assert!(w.on_ack(0, Instant::now()).is_some());
        assert!(w.on_ack(0, Instant::now()).is_none());
        assert_eq!(w.acknowledged_count(), 1);
    }

    #[test]
    fn unsolicited_ack_ignored() {
        let mut w = SendWindow::new(10, 3);
        fill(&mut w); // transmit records exist for 0..3 only

        assert!(w.on_ack(7, Instant::now()).is_none());
        assert_eq!(w.acknowledged_count(), 0);
        assert_eq!(w.window_start, 0);
    }

    #[test]
    fn outstanding_is_unacked_window_range() {
        let mut w = SendWindow::new(10, 3);
        fill(&mut w); // 0, 1, 2
        w.on_ack(1, Instant::now());

        assert_eq!(w.outstanding(), vec![0, 2]);
    }

    #[test]
    fn outstanding_extends_past_next_to_send_after_slide() {
        let mut w = SendWindow::new(10, 3);
        fill(&mut w); // 0, 1, 2
        w.on_ack(0, Instant::now()); // window is now [1, 4)

        // 3 has not been sent yet, but it sits in the stalled window range.
        assert_eq!(w.outstanding(), vec![1, 2, 3]);
    }

    #[test]
    fn rewind_resets_fill_cursor() {
        let mut w = SendWindow::new(10, 3);
        fill(&mut w);
        w.on_ack(1, Instant::now());
        w.rewind();

        assert_eq!(w.next_to_send, 0);
        // Refill skips the acknowledged 1.
        assert_eq!(fill(&mut w), vec![0, 2]);
    }

    #[test]
    fn ack_yields_rtt_from_last_transmission() {
        let mut w = SendWindow::new(5, 5);
        let sent_at = send(&mut w, 0);

        let rtt = w.on_ack(0, sent_at + Duration::from_millis(40)).unwrap();
        assert_eq!(rtt, Duration::from_millis(40));
    }

    #[test]
    fn retransmission_refreshes_rtt_base() {
        let mut w = SendWindow::new(5, 5);
        let first = send(&mut w, 0);

        // Retransmit 10ms later; the ACK 5ms after that measures against the
        // refreshed timestamp, not the original send.
        let resent = first + Duration::from_millis(10);
        w.record_sent(0, resent);
        let rtt = w.on_ack(0, resent + Duration::from_millis(5)).unwrap();
        assert_eq!(rtt, Duration::from_millis(5));
    }

    #[test]
    fn completion_requires_every_sequence() {
        let mut w = SendWindow::new(3, 3);
        fill(&mut w);
        w.on_ack(0, Instant::now());
        w.on_ack(2, Instant::now());
        assert!(!w.is_complete());

        w.on_ack(1, Instant::now());
        assert!(w.is_complete());
        assert_eq!(w.acknowledged_count(), 3);
    }

    #[test]
    fn zero_total_is_immediately_complete() {
        let w = SendWindow::new(0, 4);
        assert!(w.is_complete());
        assert!(!w.can_fill());
    }

    #[test]
    fn window_edge_arithmetic_near_u16_max() {
        let mut w = SendWindow::new(u16::MAX, 8);
        w.window_start = u16::MAX - 3;
        w.next_to_send = u16::MAX - 3;

        // window_start + capacity would overflow u16; the edge must clamp to
        // total_count instead of wrapping.
        assert!(w.can_fill());
        assert_eq!(w.outstanding(), vec![u16::MAX - 3, u16::MAX - 2, u16::MAX - 1]);
    }
}
