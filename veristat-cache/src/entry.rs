//! Cache entries and eviction priority.

use serde::Serialize;
use std::time::{Duration, Instant};

/// Fixed per-entry bookkeeping overhead added to the serialized size estimate
pub(crate) const ENTRY_OVERHEAD_BYTES: usize = 64;

/// Eviction priority hint
///
/// Lower priorities are evicted first when recency ties; this is a hint,
/// not a pin — high-priority entries still expire and can still be evicted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
pub enum Priority {
    /// Evict first
    Low,
    /// Default
    #[default]
    Normal,
    /// Evict last
    High,
}

/// One cached value with its bookkeeping
///
/// Owned exclusively by the cache; mutated on every read (recency, access
/// count) and replaced wholesale on write.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The cached value
    pub value: V,
    /// When the entry was stored
    pub created_at: Instant,
    /// Last read, drives LRU eviction
    pub last_accessed: Instant,
    /// Number of reads since insertion
    pub access_count: u64,
    /// How long the original computation took
    pub compute_duration: Duration,
    /// Serialization-based size estimate, including overhead
    pub size_bytes: usize,
    /// Time-to-live resolved at insertion
    pub time_to_live: Duration,
    /// Eviction priority hint
    pub priority: Priority,
}

impl<V> CacheEntry<V> {
    /// Whether the entry has outlived its time-to-live as of `now`
    pub fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.created_at) > self.time_to_live
    }
}

/// Estimate a value's in-cache footprint via its JSON serialization length
///
/// Falls back to the in-memory size of `V` when serialization fails; the
/// estimate only steers eviction, it never affects correctness.
pub(crate) fn estimate_size<V: Serialize>(value: &V) -> usize {
    let payload = serde_json::to_vec(value)
        .map(|bytes| bytes.len())
        .unwrap_or_else(|_| std::mem::size_of::<V>());
    payload + ENTRY_OVERHEAD_BYTES
}
