//! Sharded thread-safe map of in-flight frames awaiting acknowledgement.
//!
//! Grounded on `Hev::TSMap`'s bucket-by-hash sharding, re-expressed with
//! per-shard `Mutex`es instead of a C++ `shared_mutex` vector. The buggy
//! "greater than" vs "less than" scan from the original is not reproduced;
//! [`UnackedTable::scan_matching`] takes an explicit predicate so callers
//! state their own comparison (see [`crate::task::receiver`]).

use std::collections::HashMap;
use std::sync::Mutex;

use bytes::Bytes;

/// Number of shards. Fixed; chosen to match the reference sharded map.
const NUM_SHARDS: usize = 64;

/// A frame recorded as sent but not yet acknowledged.
#[derive(Debug, Clone)]
pub struct UnackedEntry {
    /// The exact bytes that were transmitted (shared with any retransmit in
    /// the send queue).
    pub bytes: Bytes,
}

/// Sharded `sequence -> UnackedEntry` map.
pub struct UnackedTable {
    shards: Vec<Mutex<HashMap<u32, UnackedEntry>>>,
}

impl Default for UnackedTable {
    fn default() -> Self {
        Self::new()
    }
}

impl UnackedTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            shards: (0..NUM_SHARDS).map(|_| Mutex::new(HashMap::new())).collect(),
        }
    }

    fn shard_for(&self, key: u32) -> &Mutex<HashMap<u32, UnackedEntry>> {
        &self.shards[key as usize % NUM_SHARDS]
    }

    /// Records a sent frame.
    pub fn insert(&self, sequence: u32, entry: UnackedEntry) {
        self.shard_for(sequence)
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(sequence, entry);
    }

    /// Returns a copy of the entry for `sequence`, if still unacked.
    pub fn get(&self, sequence: u32) -> Option<UnackedEntry> {
        self.shard_for(sequence)
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(&sequence)
            .cloned()
    }

    /// Removes `sequence`; returns `true` if it was present.
    pub fn remove(&self, sequence: u32) -> bool {
        self.shard_for(sequence)
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .remove(&sequence)
            .is_some()
    }

    /// Collects `(sequence, entry)` pairs for which `predicate(sequence)`
    /// holds, scanning every shard. Used by the receiver to select
    /// retransmit candidates on a SYNACK retrigger.
    pub fn scan_matching(&self, predicate: impl Fn(u32) -> bool) -> Vec<(u32, UnackedEntry)> {
        let mut out = Vec::new();
        for shard in &self.shards {
            let guard = shard.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            out.extend(
                guard
                    .iter()
                    .filter(|(seq, _)| predicate(**seq))
                    .map(|(seq, entry)| (*seq, entry.clone())),
            );
        }
        out
    }

    /// Total number of unacked entries across all shards.
    pub fn len(&self) -> usize {
        self.shards
            .iter()
            .map(|s| s.lock().unwrap_or_else(std::sync::PoisonError::into_inner).len())
            .sum()
    }

    /// `true` if no entries are unacked.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
