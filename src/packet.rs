//! Wire-format definitions for protocol datagrams.
//!
//! Every datagram exchanged between the sender and the receiver is a
//! [`Packet`].  This module is responsible for:
//! - Defining the on-wire binary layout (header fields, payload).
//! - Serialising a [`Packet`] into a byte buffer ready for transmission.
//! - Deserialising a raw byte slice back into a [`Packet`], returning errors
//!   for malformed or truncated input.
//!
//! No I/O happens here — this is pure data transformation.
//!
//! # Wire format
//!
//! All multi-byte integers are **big-endian**.
//!
//! ```text
//!  0               1               2               3               4
//!  0 1 2 3 4 5 6 7 0 1 2 3 4 5 6 7 0 1 2 3 4 5 6 7 0 1 2 3 4 5 6 7 0 ...
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |     Kind      |        Sequence Number        |     Payload Length    |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                              Payload ...                              |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```
//!
//! Total header size: [`HEADER_LEN`] = 5 bytes.
//! kind(1) + sequence(2) + length(2)
//!
//! SYN and ACK packets carry an empty payload; the `length` field is only
//! nonzero for DATA packets.

use thiserror::Error;

/// Byte length of the fixed-size header on the wire.
pub const HEADER_LEN: usize = 5;

// Byte offsets of each field within the serialised header.
const OFF_KIND: usize = 0;
const OFF_SEQ: usize = 1;
const OFF_LEN: usize = 3;

// ---------------------------------------------------------------------------
// Kind
// ---------------------------------------------------------------------------

/// Discriminant of a protocol datagram.
///
/// The wire encoding is a single byte; any other value is rejected by
/// [`Packet::decode`] with [`PacketError::UnknownKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Kind {
    /// Connection request (handshake initiation).
    Syn = 0,
    /// Data transfer segment.
    Data = 1,
    /// Acknowledgement of a SYN or DATA packet.
    Ack = 2,
}

impl Kind {
    fn from_wire(byte: u8) -> Result<Self, PacketError> {
        match byte {
            0 => Ok(Kind::Syn),
            1 => Ok(Kind::Data),
            2 => Ok(Kind::Ack),
            other => Err(PacketError::UnknownKind(other)),
        }
    }
}

impl std::fmt::Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Kind::Syn => write!(f, "SYN"),
            Kind::Data => write!(f, "DATA"),
            Kind::Ack => write!(f, "ACK"),
        }
    }
}

// ---------------------------------------------------------------------------
// Packet
// ---------------------------------------------------------------------------

/// A complete protocol datagram: header + payload bytes.
///
/// The `length` header field is not stored separately; it is always
/// `payload.len()` on encode and validated against the buffer on decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// Packet discriminant.
    pub kind: Kind,
    /// Sequence number.  `0` for SYN; for ACK it echoes the acknowledged
    /// DATA sequence number.
    pub sequence: u16,
    /// Payload bytes (empty for SYN and ACK).
    pub payload: Vec<u8>,
}

impl Packet {
    /// Build a SYN packet (handshake initiation, sequence 0, no payload).
    pub fn syn() -> Self {
        Self {
            kind: Kind::Syn,
            sequence: 0,
            payload: Vec::new(),
        }
    }

    /// Build a DATA packet carrying `payload` for `sequence`.
    pub fn data(sequence: u16, payload: Vec<u8>) -> Self {
        Self {
            kind: Kind::Data,
            sequence,
            payload,
        }
    }

    /// Build an ACK packet echoing `sequence`.
    pub fn ack(sequence: u16) -> Self {
        Self {
            kind: Kind::Ack,
            sequence,
            payload: Vec::new(),
        }
    }

    /// Serialise this packet into a newly allocated byte vector.
    ///
    /// The `length` field is computed from the actual payload.  The 16-bit
    /// field width is the only limit; callers must keep payloads at or below
    /// 65535 bytes.
    pub fn encode(&self) -> Vec<u8> {
        debug_assert!(
            self.payload.len() <= u16::MAX as usize,
            "payload exceeds the 16-bit length field ({} bytes)",
            self.payload.len()
        );
        let mut buf = vec![0u8; HEADER_LEN + self.payload.len()];

        buf[OFF_KIND] = self.kind as u8;
        buf[OFF_SEQ..OFF_SEQ + 2].copy_from_slice(&self.sequence.to_be_bytes());
        buf[OFF_LEN..OFF_LEN + 2].copy_from_slice(&(self.payload.len() as u16).to_be_bytes());
        buf[HEADER_LEN..].copy_from_slice(&self.payload);

        buf
    }

    /// Parse a [`Packet`] from a raw byte slice.
    ///
    /// Returns [`Err`] if:
    /// - `buf` is shorter than [`HEADER_LEN`] ([`PacketError::MalformedPacket`]),
    /// - the `length` field claims more payload bytes than `buf` actually
    ///   supplies ([`PacketError::TruncatedPayload`]), or
    /// - the kind byte is not a known discriminant ([`PacketError::UnknownKind`]).
    ///
    /// Trailing bytes beyond the declared payload length are tolerated and
    /// ignored; the payload is exactly the first `length` bytes after the
    /// header.
    pub fn decode(buf: &[u8]) -> Result<Self, PacketError> {
        if buf.len() < HEADER_LEN {
            return Err(PacketError::MalformedPacket { got: buf.len() });
        }

        let kind = Kind::from_wire(buf[OFF_KIND])?;
        let sequence = u16::from_be_bytes(buf[OFF_SEQ..OFF_SEQ + 2].try_into().unwrap());
        let length = u16::from_be_bytes(buf[OFF_LEN..OFF_LEN + 2].try_into().unwrap());

        let available = buf.len() - HEADER_LEN;
        if available < length as usize {
            return Err(PacketError::TruncatedPayload {
                declared: length,
                available,
            });
        }

        Ok(Packet {
            kind,
            sequence,
            payload: buf[HEADER_LEN..HEADER_LEN + length as usize].to_vec(),
        })
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can arise when parsing a raw datagram.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PacketError {
    /// Buffer shorter than the fixed header size.
    #[error("datagram too short for a header: got {got} bytes, need {HEADER_LEN}")]
    MalformedPacket { got: usize },

    /// The `length` field declares more payload than the buffer supplies.
    #[error("truncated payload: header declares {declared} bytes, only {available} available")]
    TruncatedPayload { declared: u16, available: usize },

    /// The kind byte is not one of the known discriminants.
    #[error("unknown packet kind {0}")]
    UnknownKind(u8),
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
