//! Reliable, message-preserving transport over UDP.
//!
//! [`Endpoint`] is a bidirectional session with exactly one remote peer: it
//! performs a three-way handshake ([`connect`](Endpoint::connect) /
//! [`listen`](Endpoint::listen)), exchanges messages with acknowledgement
//! and retransmission ([`send`](Endpoint::send) / [`receive`](Endpoint::receive)),
//! probes liveness with periodic pings, and tears down cleanly on `Drop`.
//!
//! Explicitly out of scope: congestion control, flow control, windowing,
//! RTT estimation, ordered delivery, fragmentation, multi-peer sessions,
//! NAT traversal, authentication, and encryption.

pub mod config;
pub mod error;
mod handshake;
pub mod packet;
mod queue;
mod shared;
mod substrate;
mod task;
mod unacked;

mod endpoint;

pub use config::SessionConfig;
pub use endpoint::Endpoint;
pub use error::{Result, RudpError};
