//! Deterministic DATA payload generation.
//!
//! The sender never buffers payloads it has already transmitted.  Instead,
//! the payload for a sequence number is a fixed-size pseudorandom byte string
//! reproducibly derived from that sequence number, so a retransmission can
//! regenerate byte-identical content on demand.  This trades CPU for memory:
//! the retransmit path re-runs the generator instead of keeping every
//! in-flight payload alive.
//!
//! [`payload_for`] is a pure function: it seeds a fresh [`StdRng`] per call
//! and shares no state with any other task, so concurrent callers cannot
//! interfere with each other's byte streams.

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

/// Generate the payload for `sequence`, `size` bytes long.
///
/// Two calls with the same arguments return byte-identical vectors.
pub fn payload_for(sequence: u16, size: u16) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(u64::from(sequence));
    let mut buf = vec![0u8; size as usize];
    rng.fill_bytes(&mut buf);
    buf
}
