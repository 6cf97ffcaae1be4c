//! Thread-safe blocking FIFO queue.
//!
//! Backs the send queue and the receive queue. A plain `mpsc::channel` gives
//! one-shot receive semantics but no bounded wait and no way to wake every
//! blocked waiter at once on teardown, so this is a small condvar-guarded
//! queue instead, in the spirit of `Hev::TSQueue`.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

/// Outcome of a blocking pop.
#[derive(Debug, PartialEq, Eq)]
pub enum PopResult<T> {
    /// An item was dequeued.
    Item(T),
    /// The wait elapsed with nothing available.
    Timeout,
    /// [`BlockingQueue::release_all_blocks`] woke this waiter; the queue is
    /// being torn down.
    Released,
}

struct State<T> {
    items: VecDeque<T>,
    released: bool,
}

/// A multi-producer, multi-consumer FIFO queue with bounded and unbounded
/// blocking pop, plus a broadcast release for shutdown.
pub struct BlockingQueue<T> {
    state: Mutex<State<T>>,
    not_empty: Condvar,
}

impl<T> Default for BlockingQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> BlockingQueue<T> {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State { items: VecDeque::new(), released: false }),
            not_empty: Condvar::new(),
        }
    }

    /// Pushes an item and wakes one waiter.
    pub fn push(&self, item: T) {
        let mut state = self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        state.items.push_back(item);
        self.not_empty.notify_one();
    }

    /// Blocks until an item is available or the queue is released.
    pub fn pop_wait(&self) -> PopResult<T> {
        let mut state = self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        loop {
            if let Some(item) = state.items.pop_front() {
                return PopResult::Item(item);
            }
            if state.released {
                return PopResult::Released;
            }
            state = self.not_empty.wait(state).unwrap_or_else(std::sync::PoisonError::into_inner);
        }
    }

    /// Blocks until an item is available, the queue is released, or
    /// `timeout` elapses. Robust against spurious wakeups.
    pub fn pop_wait_for(&self, timeout: Duration) -> PopResult<T> {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        loop {
            if let Some(item) = state.items.pop_front() {
                return PopResult::Item(item);
            }
            if state.released {
                return PopResult::Released;
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return PopResult::Timeout;
            }
            let (guard, result) = self
                .not_empty
                .wait_timeout(state, remaining)
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            state = guard;
            if result.timed_out() && state.items.is_empty() && !state.released {
                return PopResult::Timeout;
            }
        }
    }

    /// Wakes every blocked waiter with [`PopResult::Released`]. Idempotent.
    /// Used on teardown so no `receive()` call blocks forever.
    pub fn release_all_blocks(&self) {
        let mut state = self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        state.released = true;
        self.not_empty.notify_all();
    }

    /// Number of items currently queued (does not block).
    pub fn len(&self) -> usize {
        self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner).items.len()
    }

    /// `true` if no items are queued.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
