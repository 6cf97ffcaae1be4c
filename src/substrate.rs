//! The datagram substrate: a thin wrapper over [`std::net::UdpSocket`]
//! expressing the `bind` / `send_to` / `recv_from` contract with readiness
//! timeouts. Kept separate from [`crate::endpoint`] so the session core only
//! ever talks to this narrow interface, matching the "treat the datagram
//! layer as an external collaborator" boundary.

use std::net::{SocketAddr, UdpSocket};
use std::time::Duration;

use crate::config::MAX_DATAGRAM_SIZE;
use crate::error::RudpError;

/// A bound UDP handle used for both reading and writing.
#[derive(Debug)]
pub struct Substrate {
    socket: UdpSocket,
}

impl Substrate {
    /// Binds a local UDP socket.
    pub fn bind(local: SocketAddr) -> Result<Self, RudpError> {
        let socket = UdpSocket::bind(local).map_err(RudpError::BindError)?;
        Ok(Self { socket })
    }

    /// The bound local address.
    pub fn local_addr(&self) -> Result<SocketAddr, RudpError> {
        self.socket.local_addr().map_err(RudpError::BindError)
    }

    /// Sends `bytes` to `peer`, waiting up to `timeout` for write readiness.
    /// UDP sockets are effectively always write-ready; the timeout bounds
    /// the syscall rather than a queueing delay.
    pub fn send_to(&self, bytes: &[u8], peer: SocketAddr, timeout: Duration) -> Result<usize, RudpError> {
        self.socket.set_write_timeout(Some(timeout)).map_err(RudpError::SendError)?;
        self.socket.send_to(bytes, peer).map_err(RudpError::SendError)
    }

    /// Waits up to `timeout` for a datagram, returning its bytes and source
    /// address. Returns [`RudpError::Timeout`] if none arrives.
    pub fn recv_from(&self, timeout: Duration) -> Result<(Vec<u8>, SocketAddr), RudpError> {
        self.socket.set_read_timeout(Some(timeout)).map_err(RudpError::ReceiveError)?;
        let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];
        match self.socket.recv_from(&mut buf) {
            Ok((len, addr)) => {
                buf.truncate(len);
                Ok((buf, addr))
            }
            Err(e) if matches!(e.kind(), std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut) => {
                Err(RudpError::Timeout)
            }
            Err(e) => Err(RudpError::ReceiveError(e)),
        }
    }
}
