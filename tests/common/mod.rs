//! Shared scaffolding for the end-to-end scenario tests: a tiny loopback
//! relay that can selectively drop datagrams by inspecting the parsed
//! packet, so a scenario can simulate "the SYN never arrives" without the
//! library itself needing any test-only hooks.

use std::net::{SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use rudp::packet;

/// Installs a `log` backend for the duration of the test binary. Safe to
/// call from every test; only the first call takes effect.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Sits between a connecting endpoint and a real peer. The connecting side
/// targets [`Relay::front_addr`] instead of the peer directly, and the real
/// peer must be told to reply to [`Relay::back_addr`] instead of the
/// connecting side's real address, so that both directions actually flow
/// through the relay's drop rule.
///
/// Every datagram that passes through the relay (in either direction, before
/// the drop rule is applied) is recorded in arrival order and available via
/// [`Relay::captured`], so a scenario can assert the exact wire trace.
pub struct Relay {
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
    front_addr: SocketAddr,
    back_addr: SocketAddr,
    captured: Arc<Mutex<Vec<(u16, u32)>>>,
}

impl Relay {
    /// `should_drop` is evaluated against every datagram travelling from the
    /// connecting side toward `real_peer`; returning `true` silently drops
    /// it. Datagrams in the other direction always pass through.
    pub fn new(real_peer: SocketAddr, should_drop: impl Fn(&packet::Packet) -> bool + Send + 'static) -> Self {
        let front = UdpSocket::bind("127.0.0.1:0").expect("bind relay front");
        let front_addr = front.local_addr().expect("relay front has a local addr");
        let back = UdpSocket::bind("127.0.0.1:0").expect("bind relay back");
        let back_addr = back.local_addr().expect("relay back has a local addr");
        front.set_read_timeout(Some(Duration::from_millis(50))).unwrap();
        back.set_read_timeout(Some(Duration::from_millis(50))).unwrap();

        let running = Arc::new(AtomicBool::new(true));
        let captured = Arc::new(Mutex::new(Vec::new()));
        let handle = {
            let running = Arc::clone(&running);
            let captured = Arc::clone(&captured);
            std::thread::spawn(move || {
                let mut client_addr: Option<SocketAddr> = None;
                let mut buf = [0u8; 2048];
                while running.load(Ordering::SeqCst) {
                    if let Ok((n, from)) = front.recv_from(&mut buf) {
                        client_addr = Some(from);
                        if let Ok(parsed) = packet::parse(&buf[..n]) {
                            captured.lock().unwrap_or_else(std::sync::PoisonError::into_inner).push((parsed.kind, parsed.sequence));
                            if !should_drop(&parsed) {
                                let _ = back.send_to(&buf[..n], real_peer);
                            }
                        }
                    }
                    if let Ok((n, _)) = back.recv_from(&mut buf) {
                        if let Ok(parsed) = packet::parse(&buf[..n]) {
                            captured.lock().unwrap_or_else(std::sync::PoisonError::into_inner).push((parsed.kind, parsed.sequence));
                        }
                        if let Some(addr) = client_addr {
                            let _ = front.send_to(&buf[..n], addr);
                        }
                    }
                }
            })
        };

        Self { running, handle: Some(handle), front_addr, back_addr, captured }
    }

    pub fn front_addr(&self) -> SocketAddr {
        self.front_addr
    }

    pub fn back_addr(&self) -> SocketAddr {
        self.back_addr
    }

    /// `(kind, sequence)` for every datagram seen so far, in arrival order.
    pub fn captured(&self) -> Vec<(u16, u32)> {
        self.captured.lock().unwrap_or_else(std::sync::PoisonError::into_inner).clone()
    }
}

impl Drop for Relay {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

pub fn loopback_ip() -> std::net::IpAddr {
    std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST)
}

pub fn fast_config() -> rudp::SessionConfig {
    rudp::SessionConfig {
        io_timeout: Duration::from_millis(150),
        connect_max_tries: 15,
        listen_max_tries: 15,
        send_max_tries: 3,
        send_queue_wait: Duration::from_millis(150),
        ping_interval: Duration::from_secs(5),
        liveness_timeout: Duration::from_secs(20),
    }
}
