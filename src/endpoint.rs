//! Component B: the public session endpoint.

use std::net::{IpAddr, SocketAddr};
use std::sync::atomic::Ordering;
use std::sync::Arc;

use bytes::Bytes;

use crate::config::{SessionConfig, MAX_PAYLOAD_SIZE};
use crate::error::{RudpError, Result};
use crate::handshake;
use crate::queue::PopResult;
use crate::shared::Shared;
use crate::substrate::Substrate;
use crate::task::TaskHandles;

enum State {
    /// Bound, no peer yet; handshake not attempted.
    Bound { substrate: Substrate, config: SessionConfig },
    /// Handshake completed; D/E/F are running against `shared`.
    Connected { shared: Arc<Shared>, tasks: TaskHandles },
    /// Torn down (teardown already ran, or handshake failed).
    Closed,
}

/// A bound UDP endpoint maintaining at most one peer session.
///
/// Not copyable; ordinarily movable. Because the sender/receiver/liveness
/// tasks only ever hold a cloned `Arc<Shared>` — never a reference to the
/// `Endpoint` itself — moving an `Endpoint` carries no risk of a task
/// outliving or referencing a stale address; see `shared.rs`.
pub struct Endpoint {
    state: State,
}

impl Endpoint {
    /// Binds a local UDP socket. Does not spawn any tasks.
    pub fn bind(local_ip: IpAddr, local_port: u16) -> Result<Self> {
        Self::bind_with_config(local_ip, local_port, SessionConfig::default())
    }

    /// As [`Self::bind`], with caller-supplied timing configuration.
    pub fn bind_with_config(local_ip: IpAddr, local_port: u16, config: SessionConfig) -> Result<Self> {
        let substrate = Substrate::bind(SocketAddr::new(local_ip, local_port))?;
        Ok(Self { state: State::Bound { substrate, config } })
    }

    /// The locally bound address.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        match &self.state {
            State::Bound { substrate, .. } => substrate.local_addr(),
            State::Connected { shared, .. } => shared.substrate.local_addr(),
            State::Closed => Err(RudpError::SocketClosed),
        }
    }

    /// Drives the passive side of the handshake against `peer_ip:peer_port`,
    /// then spawns the sender/receiver/liveness tasks. Blocks until the
    /// handshake completes or its retry budget is exhausted.
    pub fn listen(&mut self, peer_ip: IpAddr, peer_port: u16) -> Result<()> {
        self.establish(peer_ip, peer_port, handshake::listen_passive)
    }

    /// Drives the active side of the handshake against `peer_ip:peer_port`,
    /// then spawns the sender/receiver/liveness tasks. Blocks until the
    /// handshake completes or its retry budget is exhausted.
    pub fn connect(&mut self, peer_ip: IpAddr, peer_port: u16) -> Result<()> {
        self.establish(peer_ip, peer_port, handshake::connect_active)
    }

    fn establish(
        &mut self,
        peer_ip: IpAddr,
        peer_port: u16,
        drive: impl FnOnce(&Shared) -> Result<()>,
    ) -> Result<()> {
        let State::Bound { substrate, config } = std::mem::replace(&mut self.state, State::Closed) else {
            return Err(RudpError::SocketClosed);
        };
        let peer_addr = SocketAddr::new(peer_ip, peer_port);
        let shared = Arc::new(Shared::new(substrate, peer_addr, config, 0));

        match drive(&shared) {
            Ok(()) => {
                shared.connected.store(true, Ordering::SeqCst);
                *shared.last_pong_at.lock().unwrap_or_else(std::sync::PoisonError::into_inner) =
                    std::time::Instant::now();
                let tasks = TaskHandles::spawn(Arc::clone(&shared));
                self.state = State::Connected { shared, tasks };
                Ok(())
            }
            Err(e) => {
                self.state = State::Closed;
                Err(e)
            }
        }
    }

    /// Enqueues `payload` as a MSG frame. Fails immediately if not
    /// connected; does not wait for acknowledgement.
    pub fn send(&self, payload: &[u8]) -> Result<()> {
        let State::Connected { shared, .. } = &self.state else {
            return Err(RudpError::SocketClosed);
        };
        if !shared.is_connected() {
            return Err(RudpError::SocketClosed);
        }
        if payload.len() > MAX_PAYLOAD_SIZE {
            return Err(RudpError::InvalidParam("payload exceeds MAX_PAYLOAD_SIZE"));
        }
        shared.enqueue_send(payload);
        Ok(())
    }

    /// Blocks until a MSG payload is available or the session is torn down.
    pub fn receive(&self) -> Result<Bytes> {
        let State::Connected { shared, .. } = &self.state else {
            return Err(RudpError::SocketClosed);
        };
        match shared.recv_queue.pop_wait() {
            PopResult::Item(payload) => Ok(payload),
            PopResult::Released => Err(RudpError::SocketClosed),
            PopResult::Timeout => Err(RudpError::SocketClosed),
        }
    }

    /// As [`Self::receive`], with a bounded wait.
    pub fn receive_timeout(&self, timeout: std::time::Duration) -> Result<Bytes> {
        let State::Connected { shared, .. } = &self.state else {
            return Err(RudpError::SocketClosed);
        };
        match shared.recv_queue.pop_wait_for(timeout) {
            PopResult::Item(payload) => Ok(payload),
            PopResult::Released => Err(RudpError::SocketClosed),
            PopResult::Timeout => Err(RudpError::Timeout),
        }
    }

    /// `true` once a handshake has completed and the session has not since
    /// been torn down.
    pub fn is_connected(&self) -> bool {
        match &self.state {
            State::Connected { shared, .. } => shared.is_connected(),
            _ => false,
        }
    }
}

impl Drop for Endpoint {
    fn drop(&mut self) {
        if let State::Connected { shared, tasks } = &mut self.state {
            shared.disconnect();
            tasks.join();
            log::info!("endpoint torn down for peer {}", shared.peer_addr);
        }
    }
}
