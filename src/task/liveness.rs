//! Component F: periodic PING probe and silence-triggered disconnection.
//!
//! Directly grounded on `HeartbeatWorker`'s fixed-interval send loop; the
//! 15s ping / 60s timeout figures come from [`crate::config::SessionConfig`]
//! rather than the teacher's hard-coded 30s, since the session core makes
//! these tunable.

use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

use crate::shared::Shared;

/// Runs until `connected` is false, sleeping in short increments so
/// teardown is observed promptly rather than only at each tick boundary.
pub(crate) fn run(shared: &Shared) {
    log::debug!("liveness task started for peer {}", shared.peer_addr);
    const POLL_GRANULARITY: Duration = Duration::from_millis(100);

    while shared.is_connected() {
        tick(shared);

        let mut slept = Duration::ZERO;
        while slept < shared.config.ping_interval {
            if !shared.is_connected() {
                break;
            }
            std::thread::sleep(POLL_GRANULARITY);
            slept += POLL_GRANULARITY;
        }
    }
    log::debug!("liveness task stopped for peer {}", shared.peer_addr);
}

fn tick(shared: &Shared) {
    if shared.ponged.swap(false, Ordering::SeqCst) {
        let mut last_pong = shared.last_pong_at.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        *last_pong = Instant::now();
    } else {
        let last_pong = *shared.last_pong_at.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        if last_pong.elapsed() > shared.config.liveness_timeout {
            log::warn!("liveness: peer {} silent for {:?}, disconnecting", shared.peer_addr, last_pong.elapsed());
            shared.disconnect();
        }
    }
    // Unconditional: enqueued even on the tick that just disconnected, per
    // the step list. The sender task drains the queue before exiting, so
    // this one last PING still goes out.
    shared.queue_ping();
}
