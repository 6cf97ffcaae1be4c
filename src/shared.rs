//! State shared by the application thread and the three session tasks.
//!
//! Holding this behind a single `Arc` (rather than letting the tasks borrow
//! the `Endpoint` itself) is what makes the "move semantics on a live
//! session" note in the design notes a non-issue in Rust: the tasks only
//! ever capture a cloned `Arc<Shared>`, never the `Endpoint`'s own address,
//! so moving an `Endpoint` is an ordinary Rust move with no threads to stop
//! and restart.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Instant;

use bytes::Bytes;

use crate::config::SessionConfig;
use crate::queue::BlockingQueue;
use crate::substrate::Substrate;
use crate::unacked::UnackedTable;

/// One item in the send queue: a fully built wire frame plus enough
/// bookkeeping for the sender task to record it in the unacked table.
#[derive(Debug, Clone)]
pub(crate) struct SendItem {
    /// The complete wire frame (header + payload) as built by
    /// [`crate::packet::build`].
    pub bytes: Bytes,
    /// Sequence this frame was built with; used as the unacked-table key.
    pub sequence: u32,
    /// Whether the sender should record this frame in the unacked table on
    /// successful transmit. `true` for originated MSG/SYN frames, `false`
    /// for ACK/PING/PONG and for retransmits (already tracked).
    pub trackable: bool,
}

/// Everything the three tasks and the application thread share.
pub(crate) struct Shared {
    pub substrate: Substrate,
    pub peer_addr: SocketAddr,
    pub config: SessionConfig,
    pub sequence: AtomicU32,
    pub connected: AtomicBool,
    pub ponged: AtomicBool,
    pub last_pong_at: Mutex<Instant>,
    pub send_queue: BlockingQueue<SendItem>,
    pub recv_queue: BlockingQueue<Bytes>,
    pub unacked: UnackedTable,
}

impl Shared {
    pub fn new(substrate: Substrate, peer_addr: SocketAddr, config: SessionConfig, initial_sequence: u32) -> Self {
        Self {
            substrate,
            peer_addr,
            config,
            sequence: AtomicU32::new(initial_sequence),
            connected: AtomicBool::new(false),
            ponged: AtomicBool::new(false),
            last_pong_at: Mutex::new(Instant::now()),
            send_queue: BlockingQueue::new(),
            recv_queue: BlockingQueue::new(),
            unacked: UnackedTable::new(),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Tears down the session: flips the cancellation token and wakes any
    /// thread blocked in `receive()`. Idempotent.
    pub fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
        self.recv_queue.release_all_blocks();
    }

    /// Enqueues an application payload as a MSG frame, advancing `sequence`
    /// by the payload length (the byte-cursor discipline from the design
    /// notes).
    pub fn enqueue_send(&self, payload: &[u8]) {
        let sequence = self.sequence.fetch_add(payload.len() as u32, Ordering::SeqCst);
        let bytes = crate::packet::build(crate::packet::packet_type::MSG, sequence, payload);
        self.send_queue.push(SendItem { bytes, sequence, trackable: true });
    }

    /// Enqueues an ACK for a received frame. Per the design notes this
    /// consumes a sequence slot derived from the *received* frame, not from
    /// the local `sequence` counter.
    pub fn queue_ack(&self, received_seq: u32, received_len: u32) {
        let ack_seq = received_seq.wrapping_add(received_len);
        let bytes = crate::packet::build(crate::packet::packet_type::ACK, ack_seq, &[]);
        self.send_queue.push(SendItem { bytes, sequence: ack_seq, trackable: false });
    }

    /// Re-enqueues an already-built frame without rebuilding it or touching
    /// `sequence`. Used to retransmit unacked entries on a SYNACK retrigger.
    pub fn queue_retransmit(&self, bytes: Bytes, sequence: u32) {
        self.send_queue.push(SendItem { bytes, sequence, trackable: false });
    }

    /// Enqueues a PING frame (component F).
    pub fn queue_ping(&self) {
        let bytes = crate::packet::build(crate::packet::packet_type::PING, 0, &[]);
        self.send_queue.push(SendItem { bytes, sequence: 0, trackable: false });
    }

    /// Enqueues a PONG frame (receiver's reply to an incoming PING).
    pub fn queue_pong(&self) {
        let bytes = crate::packet::build(crate::packet::packet_type::PONG, 0, &[]);
        self.send_queue.push(SendItem { bytes, sequence: 0, trackable: false });
    }
}
