//! Components D, E, F: the sender, receiver, and liveness tasks.
//!
//! Each task is a dedicated OS thread that loops on `shared.connected`; the
//! worker-thread-plus-shared-cancellation-flag shape follows
//! `HeartbeatWorker`/`PollingWorker`'s pattern, generalized from a private
//! per-worker flag to the single shared `connected` token the design notes
//! call for.

pub mod liveness;
pub mod receiver;
pub mod sender;

use std::sync::Arc;
use std::thread::JoinHandle;

use crate::shared::Shared;

/// Join handles for the three tasks of a connected session. Dropped by the
/// endpoint's teardown after `shared.disconnect()` flips the cancellation
/// token, so each loop observes it and exits before the join completes.
pub(crate) struct TaskHandles {
    pub sender: Option<JoinHandle<()>>,
    pub receiver: Option<JoinHandle<()>>,
    pub liveness: Option<JoinHandle<()>>,
}

impl TaskHandles {
    /// Spawns D, E, and F bound to `shared`.
    pub fn spawn(shared: Arc<Shared>) -> Self {
        let sender = {
            let shared = Arc::clone(&shared);
            std::thread::spawn(move || sender::run(&shared))
        };
        let receiver = {
            let shared = Arc::clone(&shared);
            std::thread::spawn(move || receiver::run(&shared))
        };
        let liveness = std::thread::spawn(move || liveness::run(&shared));

        Self { sender: Some(sender), receiver: Some(receiver), liveness: Some(liveness) }
    }

    /// Joins all three tasks. Assumes the cancellation token has already
    /// been flipped by the caller; otherwise this blocks indefinitely.
    pub fn join(&mut self) {
        for handle in [self.sender.take(), self.receiver.take(), self.liveness.take()].into_iter().flatten() {
            if handle.join().is_err() {
                log::warn!("session task panicked during shutdown");
            }
        }
    }
}
