//! Component C: the three-way handshake.
//!
//! Runs synchronously on the calling thread, before the sender/receiver/
//! liveness tasks exist — `send_and_wait` is the only place in the crate
//! that transmits and reads on the same thread.

use std::sync::atomic::Ordering;
use std::time::Duration;

use bytes::Bytes;

use crate::error::RudpError;
use crate::packet::{self, packet_type, Packet};
use crate::shared::Shared;

/// Transmits `frame` and waits up to `shared.config.io_timeout` for a
/// datagram from the bound peer that satisfies `expect`. Retries up to
/// `max_tries` times.
fn send_and_wait(
    shared: &Shared,
    frame: &Bytes,
    max_tries: u32,
    io_timeout: Duration,
    expect: impl Fn(&Packet) -> bool,
) -> Result<Packet, RudpError> {
    for attempt in 1..=max_tries {
        if let Err(e) = shared.substrate.send_to(frame, shared.peer_addr, io_timeout) {
            log::debug!("handshake: send attempt {attempt} failed: {e}");
            continue;
        }
        match shared.substrate.recv_from(io_timeout) {
            Ok((bytes, from)) if from.ip() == shared.peer_addr.ip() => match packet::parse(&bytes) {
                Ok(packet) if expect(&packet) => return Ok(packet),
                Ok(_) => log::debug!("handshake: unexpected frame from peer, retrying"),
                Err(_) => log::debug!("handshake: malformed frame from peer, retrying"),
            },
            Ok((_, from)) => log::debug!("handshake: datagram from unrecognized peer {from}, retrying"),
            Err(RudpError::Timeout) => log::debug!("handshake: attempt {attempt} timed out"),
            Err(e) => log::debug!("handshake: attempt {attempt} recv failed: {e}"),
        }
    }
    Err(RudpError::HandshakeFail)
}

/// Active side: send SYN(seq=1), wait for SYNACK, ack once best-effort.
pub(crate) fn connect_active(shared: &Shared) -> Result<(), RudpError> {
    let cfg = &shared.config;
    shared.sequence.store(1, Ordering::SeqCst);
    let syn = packet::build(packet_type::SYN, 1, &[]);

    let result = send_and_wait(shared, &syn, cfg.connect_max_tries, cfg.io_timeout, |p| {
        p.has_type(packet_type::SYNACK)
    });

    match result {
        Ok(_synack) => {
            let ack = packet::build(packet_type::ACK, 2, &[]);
            // Best-effort: the spec requires one send, no wait.
            if let Err(e) = shared.substrate.send_to(&ack, shared.peer_addr, cfg.io_timeout) {
                log::debug!("connect: final ACK send failed (best-effort): {e}");
            }
            // `sequence` stays at 1: the handshake's final ACK(seq=2) is a
            // one-off protocol constant, not a data byte-cursor advance. The
            // first real MSG must still start at seq=1.
            log::info!("connect: handshake complete with {}", shared.peer_addr);
            Ok(())
        }
        Err(e) => {
            log::warn!("connect: handshake failed with {}: {e}", shared.peer_addr);
            Err(e)
        }
    }
}

/// Passive side: wait for SYN (adopting its sequence), then SYNACK/wait-ACK.
pub(crate) fn listen_passive(shared: &Shared) -> Result<(), RudpError> {
    let cfg = &shared.config;

    let mut adopted_seq = None;
    for attempt in 1..=cfg.listen_max_tries {
        match shared.substrate.recv_from(cfg.io_timeout) {
            Ok((bytes, from)) if from.ip() == shared.peer_addr.ip() => match packet::parse(&bytes) {
                Ok(packet) if packet.kind == packet_type::SYN => {
                    adopted_seq = Some(packet.sequence);
                    break;
                }
                Ok(_) => log::debug!("listen: non-SYN frame while waiting for SYN, retrying"),
                Err(_) => log::debug!("listen: malformed frame while waiting for SYN, retrying"),
            },
            Ok((_, from)) => log::debug!("listen: datagram from unrecognized peer {from}, retrying"),
            Err(RudpError::Timeout) => log::debug!("listen: attempt {attempt} timed out waiting for SYN"),
            Err(e) => log::debug!("listen: attempt {attempt} recv failed: {e}"),
        }
    }

    let Some(seq) = adopted_seq else {
        log::warn!("listen: no SYN received from {}", shared.peer_addr);
        return Err(RudpError::HandshakeFail);
    };
    shared.sequence.store(seq, Ordering::SeqCst);

    let synack = packet::build(packet_type::SYNACK, seq, &[]);
    let result = send_and_wait(shared, &synack, cfg.connect_max_tries, cfg.io_timeout, |p| {
        p.has_type(packet_type::ACK)
    });

    match result {
        Ok(_ack) => {
            log::info!("listen: handshake complete with {}", shared.peer_addr);
            Ok(())
        }
        Err(e) => {
            log::warn!("listen: handshake failed with {}: {e}", shared.peer_addr);
            Err(e)
        }
    }
}
