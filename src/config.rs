//! Tunable timing and retry constants for a session.
//!
//! Every numeric literal named in the component contracts (handshake
//! retries, task poll intervals, liveness thresholds) lives here instead of
//! being inlined at call sites, so a caller can override them (e.g. to speed
//! up tests) without touching task bodies.

use std::time::Duration;

/// Maximum number of transmit attempts for the handshake and for sender
/// retransmission before a frame is given up on.
pub const MAX_TRIES: u32 = 10;

/// Maximum datagram size in bytes, including the 10-byte header.
pub const MAX_DATAGRAM_SIZE: usize = 2048;

/// Maximum application payload size (`MAX_DATAGRAM_SIZE` minus the header).
pub const MAX_PAYLOAD_SIZE: usize = MAX_DATAGRAM_SIZE - crate::packet::HEADER_LEN;

/// Tunable timing parameters for a [`crate::Endpoint`] session.
///
/// `Default` reproduces the literal constants named throughout the
/// component contracts.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Read/write readiness ceiling used by the handshake and by the
    /// sender/receiver tasks for every blocking socket operation.
    pub io_timeout: Duration,
    /// Maximum handshake attempts on the active (`connect`) side.
    pub connect_max_tries: u32,
    /// Maximum SYN-wait attempts on the passive (`listen`) side.
    pub listen_max_tries: u32,
    /// Maximum retransmit attempts for a single queued frame.
    pub send_max_tries: u32,
    /// How long the send queue blocks waiting for work before re-checking
    /// the connected flag.
    pub send_queue_wait: Duration,
    /// Liveness probe period.
    pub ping_interval: Duration,
    /// Silence duration after which the liveness task trips disconnection.
    pub liveness_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            io_timeout: Duration::from_secs(2),
            connect_max_tries: MAX_TRIES,
            listen_max_tries: 6,
            send_max_tries: MAX_TRIES,
            send_queue_wait: Duration::from_secs(2),
            ping_interval: Duration::from_secs(15),
            liveness_timeout: Duration::from_secs(60),
        }
    }
}
