//! Cache Store Module
//!
//! The store contract consumed by the interceptor and its in-memory backing.

use dashmap::DashMap;
use tracing::debug;

use crate::cache::{CacheEntry, CacheStats, CacheStatsSnapshot};

// == Output Store Contract ==
/// Key-value store holding captured responses.
///
/// Implementations must tolerate concurrent reads and writes from every
/// in-flight request. Expired entries must never be returned.
pub trait OutputStore: Send + Sync {
    /// Returns true if a live entry exists for `key`.
    fn contains(&self, key: &str) -> bool;

    /// Returns the live entry for `key`, if any.
    fn get(&self, key: &str) -> Option<CacheEntry>;

    /// Inserts `entry` under `key`, replacing any previous entry.
    fn add(&self, key: &str, entry: CacheEntry);
}

// == Memory Store ==
/// Process-wide in-memory store with lazy expiry.
///
/// Expired entries are removed when they are next looked up; there is no
/// background sweep.
#[derive(Debug, Default)]
pub struct MemoryStore {
    /// Captured responses keyed by rendered cache key
    entries: DashMap<String, CacheEntry>,
    /// Lookup statistics
    stats: CacheStats,
}

impl MemoryStore {
    // == Constructor ==
    pub fn new() -> Self {
        Self::default()
    }

    // == Stats ==
    /// Returns current store statistics.
    pub fn stats(&self) -> CacheStatsSnapshot {
        self.stats.snapshot(self.entries.len())
    }

    // == Length ==
    /// Returns the number of entries, including expired ones not yet evicted.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops `key` if its entry has expired. Returns true if it was dropped.
    fn evict_if_expired(&self, key: &str) -> bool {
        let evicted = self
            .entries
            .remove_if(key, |_, entry| entry.is_expired())
            .is_some();

        if evicted {
            self.stats.record_expired();
            debug!("Evicted expired entry {}", key);
        }
        evicted
    }
}

impl OutputStore for MemoryStore {
    fn contains(&self, key: &str) -> bool {
        if self.evict_if_expired(key) {
            return false;
        }
        self.entries.contains_key(key)
    }

    fn get(&self, key: &str) -> Option<CacheEntry> {
        if self.evict_if_expired(key) {
            self.stats.record_miss();
            return None;
        }

        match self.entries.get(key) {
            Some(entry) => {
                // An empty body is never served, so it counts as a miss.
                if entry.body.is_empty() {
                    self.stats.record_miss();
                } else {
                    self.stats.record_hit();
                }
                Some(entry.value().clone())
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    fn add(&self, key: &str, entry: CacheEntry) {
        self.entries.insert(key.to_string(), entry);
        self.stats.record_store();
    }
}
