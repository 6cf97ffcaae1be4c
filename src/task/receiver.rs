//! Component E: pulls datagrams, classifies by type, dispatches.

use std::sync::atomic::Ordering;

use crate::error::RudpError;
use crate::packet::{self, packet_type};
use crate::shared::Shared;

/// Runs until `connected` is false.
pub(crate) fn run(shared: &Shared) {
    log::debug!("receiver task started for peer {}", shared.peer_addr);
    while shared.is_connected() {
        let (bytes, from) = match shared.substrate.recv_from(shared.config.io_timeout) {
            Ok(pair) => pair,
            Err(RudpError::Timeout) => continue,
            Err(e) => {
                log::debug!("receiver: recv failed: {e}");
                continue;
            }
        };

        if from.ip() != shared.peer_addr.ip() {
            log::debug!("receiver: discarding datagram from unrecognized peer {from}");
            continue;
        }

        let packet = match packet::parse(&bytes) {
            Ok(packet) => packet,
            Err(_) => {
                log::debug!("receiver: discarding malformed datagram from {from}");
                continue;
            }
        };

        if packet.has_type(packet_type::SYNACK) {
            let local_sequence = shared.sequence.load(Ordering::SeqCst);
            if packet.sequence < local_sequence {
                let retransmits = shared.unacked.scan_matching(|seq| seq > packet.sequence);
                log::debug!(
                    "receiver: SYNACK retrigger, retransmitting {} unacked entries",
                    retransmits.len()
                );
                for (seq, entry) in retransmits {
                    shared.queue_retransmit(entry.bytes, seq);
                }
            }
        } else if packet.has_type(packet_type::PING) {
            shared.queue_pong();
        } else if packet.has_type(packet_type::PONG) {
            shared.ponged.store(true, Ordering::SeqCst);
        } else {
            // MSG: neither SYNACK, PING, nor PONG bits set.
            #[allow(clippy::cast_possible_truncation, reason = "payload already bounded by MAX_PAYLOAD_SIZE")]
            let length = packet.payload.len() as u32;
            shared.queue_ack(packet.sequence, length);
            shared.recv_queue.push(packet.payload);
        }
    }
    log::debug!("receiver task stopped for peer {}", shared.peer_addr);
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;
    use std::sync::atomic::Ordering;
    use std::sync::Arc;
    use std::time::Duration;

    use crate::config::SessionConfig;
    use crate::packet::{self, packet_type};
    use crate::queue::PopResult;
    use crate::shared::Shared;
    use crate::substrate::Substrate;
    use crate::unacked::UnackedEntry;

    fn loopback() -> SocketAddr {
        "127.0.0.1:0".parse().unwrap()
    }

    fn make_shared(peer_addr: SocketAddr) -> Arc<Shared> {
        let local = Substrate::bind(loopback()).unwrap();
        let shared = Arc::new(Shared::new(local, peer_addr, SessionConfig::default(), 1));
        shared.connected.store(true, Ordering::SeqCst);
        shared
    }

    #[test]
    fn msg_frame_is_acked_and_delivered() {
        let peer_sub = Substrate::bind(loopback()).unwrap();
        let peer_addr = peer_sub.local_addr().unwrap();
        let shared = make_shared(peer_addr);
        let local_addr = shared.substrate.local_addr().unwrap();

        let handle = {
            let shared = Arc::clone(&shared);
            std::thread::spawn(move || super::run(&shared))
        };

        let wire = packet::build(packet_type::MSG, 1, b"hello");
        peer_sub.send_to(&wire, local_addr, Duration::from_secs(1)).unwrap();

        let delivered = shared.recv_queue.pop_wait_for(Duration::from_secs(1));
        assert_eq!(delivered, PopResult::Item(bytes::Bytes::from_static(b"hello")));

        // The receiver only enqueues the ACK; component D is what would
        // actually transmit it, so inspect the send queue directly here.
        let queued = shared.send_queue.pop_wait_for(Duration::from_secs(1));
        let PopResult::Item(item) = queued else { panic!("expected a queued ACK") };
        let ack = packet::parse(&item.bytes).unwrap();
        assert!(ack.has_type(packet_type::ACK));
        assert_eq!(ack.sequence, 1 + 5);

        shared.disconnect();
        handle.join().unwrap();
    }

    #[test]
    fn unrecognized_peer_is_discarded() {
        let peer_sub = Substrate::bind(loopback()).unwrap();
        let peer_addr = peer_sub.local_addr().unwrap();
        let shared = make_shared(peer_addr);
        let local_addr = shared.substrate.local_addr().unwrap();

        let spoofer = Substrate::bind(loopback()).unwrap();

        let handle = {
            let shared = Arc::clone(&shared);
            std::thread::spawn(move || super::run(&shared))
        };

        let wire = packet::build(packet_type::MSG, 1, b"spoofed");
        spoofer.send_to(&wire, local_addr, Duration::from_secs(1)).unwrap();

        let result = shared.recv_queue.pop_wait_for(Duration::from_millis(300));
        assert_eq!(result, PopResult::Timeout);

        shared.disconnect();
        handle.join().unwrap();
    }

    #[test]
    fn ping_triggers_pong_reply() {
        let peer_sub = Substrate::bind(loopback()).unwrap();
        let peer_addr = peer_sub.local_addr().unwrap();
        let shared = make_shared(peer_addr);
        let local_addr = shared.substrate.local_addr().unwrap();

        let handle = {
            let shared = Arc::clone(&shared);
            std::thread::spawn(move || super::run(&shared))
        };

        let wire = packet::build(packet_type::PING, 0, &[]);
        peer_sub.send_to(&wire, local_addr, Duration::from_secs(1)).unwrap();

        let queued = shared.send_queue.pop_wait_for(Duration::from_secs(1));
        let PopResult::Item(item) = queued else { panic!("expected a queued PONG") };
        let reply = packet::parse(&item.bytes).unwrap();
        assert!(reply.has_type(packet_type::PONG));

        shared.disconnect();
        handle.join().unwrap();
    }

    #[test]
    fn pong_sets_ponged_flag() {
        let peer_sub = Substrate::bind(loopback()).unwrap();
        let peer_addr = peer_sub.local_addr().unwrap();
        let shared = make_shared(peer_addr);
        let local_addr = shared.substrate.local_addr().unwrap();

        let handle = {
            let shared = Arc::clone(&shared);
            std::thread::spawn(move || super::run(&shared))
        };

        let wire = packet::build(packet_type::PONG, 0, &[]);
        peer_sub.send_to(&wire, local_addr, Duration::from_secs(1)).unwrap();

        std::thread::sleep(Duration::from_millis(100));
        assert!(shared.ponged.load(Ordering::SeqCst));

        shared.disconnect();
        handle.join().unwrap();
    }

    #[test]
    fn synack_retrigger_retransmits_only_greater_sequences() {
        let peer_sub = Substrate::bind(loopback()).unwrap();
        let peer_addr = peer_sub.local_addr().unwrap();
        let shared = make_shared(peer_addr);
        let local_addr = shared.substrate.local_addr().unwrap();

        shared.sequence.store(20, Ordering::SeqCst);
        shared.unacked.insert(5, UnackedEntry { bytes: packet::build(packet_type::MSG, 5, b"low") });
        shared.unacked.insert(15, UnackedEntry { bytes: packet::build(packet_type::MSG, 15, b"high") });

        let handle = {
            let shared = Arc::clone(&shared);
            std::thread::spawn(move || super::run(&shared))
        };

        let wire = packet::build(packet_type::SYNACK, 10, &[]);
        peer_sub.send_to(&wire, local_addr, Duration::from_secs(1)).unwrap();

        let queued = shared.send_queue.pop_wait_for(Duration::from_secs(1));
        let PopResult::Item(item) = queued else { panic!("expected a queued retransmit") };
        let retransmit = packet::parse(&item.bytes).unwrap();
        assert_eq!(retransmit.sequence, 15);
        assert_eq!(&retransmit.payload[..], b"high");

        let second = shared.send_queue.pop_wait_for(Duration::from_millis(200));
        assert!(matches!(second, PopResult::Timeout), "sequence 5 must not be retransmitted");

        shared.disconnect();
        handle.join().unwrap();
    }
}
