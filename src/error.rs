//! Error taxonomy surfaced at API boundaries.
//!
//! Task loops never propagate errors upward; they log and continue (see
//! [`crate::task`]). `RudpError` is only ever produced by `bind`, `listen`,
//! `connect`, `send`, and `receive`.

use std::fmt;
use std::io;
use std::net::SocketAddr;

/// Errors surfaced by [`crate::Endpoint`] API calls.
#[derive(Debug)]
#[non_exhaustive]
pub enum RudpError {
    /// API called before a handshake completed, or after teardown.
    SocketClosed,
    /// The OS rejected the local bind.
    BindError(io::Error),
    /// The handshake exhausted its retry budget without completing.
    HandshakeFail,
    /// A bounded wait elapsed without the expected event.
    Timeout,
    /// The datagram substrate failed to read.
    ReceiveError(io::Error),
    /// The datagram substrate failed to write.
    SendError(io::Error),
    /// A well-formed datagram arrived from an address other than the bound peer.
    UnrecognizedPeer(SocketAddr),
    /// A datagram was shorter than its declared header/payload length.
    MalformedPacket,
    /// A caller-supplied argument violates a documented precondition.
    InvalidParam(&'static str),
}

impl fmt::Display for RudpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SocketClosed => write!(f, "socket is not connected"),
            Self::BindError(e) => write!(f, "bind failed: {e}"),
            Self::HandshakeFail => write!(f, "handshake did not complete"),
            Self::Timeout => write!(f, "operation timed out"),
            Self::ReceiveError(e) => write!(f, "receive failed: {e}"),
            Self::SendError(e) => write!(f, "send failed: {e}"),
            Self::UnrecognizedPeer(addr) => write!(f, "datagram from unrecognized peer {addr}"),
            Self::MalformedPacket => write!(f, "malformed packet"),
            Self::InvalidParam(msg) => write!(f, "invalid parameter: {msg}"),
        }
    }
}

impl std::error::Error for RudpError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::BindError(e) | Self::ReceiveError(e) | Self::SendError(e) => Some(e),
            _ => None,
        }
    }
}

/// Result alias for this crate's public API.
pub type Result<T> = std::result::Result<T, RudpError>;
