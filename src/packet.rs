//! Wire codec for the 10-byte fixed header frame.
//!
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +---------------+---------------+-------------------------------+
//! |              type             |            sequence          ..
//! +---------------+---------------+-------------------------------+
//! ..   sequence (cont.)           |             length           ..
//! +-------------------------------+-------------------------------+
//! ..   length (cont.)             |    payload (length bytes)   ...
//! +-------------------------------+-------------------------------+
//! ```
//!
//! `type`, `sequence`, and `length` are all network byte order (big-endian).

use bytes::Bytes;

use crate::error::RudpError;

/// Size of the fixed header in bytes.
pub const HEADER_LEN: usize = 10;

/// Bit flag types, combinable (`SYN | ACK == SYNACK`).
pub mod packet_type {
    /// Handshake initiation.
    pub const SYN: u16 = 0x01;
    /// Acknowledgement.
    pub const ACK: u16 = 0x02;
    /// Liveness probe.
    pub const PING: u16 = 0x04;
    /// Application message.
    pub const MSG: u16 = 0x08;
    /// Liveness probe reply.
    pub const PONG: u16 = 0x10;
    /// `SYN | ACK`.
    pub const SYNACK: u16 = SYN | ACK;
}

/// A decoded frame: header fields plus an owned, shareable payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// Bit flags over [`packet_type`].
    pub kind: u16,
    /// Sender's sequence cursor at transmit time.
    pub sequence: u32,
    /// Payload bytes (may be empty).
    pub payload: Bytes,
}

impl Packet {
    /// Returns `true` if every bit in `flags` is set on this packet's type.
    #[must_use]
    pub fn has_type(&self, flags: u16) -> bool {
        self.kind & flags == flags
    }
}

/// Serializes a frame into an owned buffer: `10 + payload.len()` bytes.
#[must_use]
pub fn build(kind: u16, sequence: u32, payload: &[u8]) -> Bytes {
    let mut buf = Vec::with_capacity(HEADER_LEN + payload.len());
    #[allow(clippy::cast_possible_truncation, reason = "length already bounded by MAX_PAYLOAD_SIZE")]
    let length = payload.len() as u32;
    buf.extend_from_slice(&kind.to_be_bytes());
    buf.extend_from_slice(&sequence.to_be_bytes());
    buf.extend_from_slice(&length.to_be_bytes());
    buf.extend_from_slice(payload);
    Bytes::from(buf)
}

/// Parses a received datagram into a [`Packet`].
///
/// Fails with [`RudpError::MalformedPacket`] if `bytes` is shorter than the
/// header, or shorter than `10 + declared length`.
pub fn parse(bytes: &[u8]) -> Result<Packet, RudpError> {
    if bytes.len() < HEADER_LEN {
        return Err(RudpError::MalformedPacket);
    }
    let kind = u16::from_be_bytes([bytes[0], bytes[1]]);
    let sequence = u32::from_be_bytes([bytes[2], bytes[3], bytes[4], bytes[5]]);
    let length = u32::from_be_bytes([bytes[6], bytes[7], bytes[8], bytes[9]]) as usize;
    if bytes.len() < HEADER_LEN + length {
        return Err(RudpError::MalformedPacket);
    }
    let payload = Bytes::copy_from_slice(&bytes[HEADER_LEN..HEADER_LEN + length]);
    Ok(Packet { kind, sequence, payload })
}
