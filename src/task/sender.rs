//! Component D: drains the send queue, transmits, records unacked frames.

use crate::queue::PopResult;
use crate::shared::Shared;
use crate::unacked::UnackedEntry;

/// Runs until `connected` is false and the send queue has drained.
pub(crate) fn run(shared: &Shared) {
    log::debug!("sender task started for peer {}", shared.peer_addr);
    loop {
        let item = match shared.send_queue.pop_wait_for(shared.config.send_queue_wait) {
            PopResult::Item(item) => item,
            PopResult::Timeout => {
                if !shared.is_connected() && shared.send_queue.is_empty() {
                    break;
                }
                continue;
            }
            PopResult::Released => break,
        };

        let mut transmitted = false;
        for attempt in 1..=shared.config.send_max_tries {
            match shared.substrate.send_to(&item.bytes, shared.peer_addr, shared.config.io_timeout) {
                Ok(_) => {
                    transmitted = true;
                    break;
                }
                Err(e) => {
                    log::debug!("sender: attempt {attempt} for seq {} failed: {e}", item.sequence);
                }
            }
        }

        if transmitted {
            if item.trackable {
                shared.unacked.insert(item.sequence, UnackedEntry { bytes: item.bytes.clone() });
            }
        } else {
            log::warn!(
                "sender: dropping seq {} after {} failed attempts",
                item.sequence,
                shared.config.send_max_tries
            );
        }

        if !shared.is_connected() && shared.send_queue.is_empty() {
            break;
        }
    }
    log::debug!("sender task stopped for peer {}", shared.peer_addr);
}
