//! The memoizing store.

use crate::config::CacheConfig;
use crate::entry::{estimate_size, CacheEntry, Priority};
use fxhash::FxHashMap;
use serde::Serialize;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{debug, trace};

/// Telemetry snapshot for a [`ResultCache`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheStats {
    /// Reads that found a live entry
    pub hits: u64,
    /// Reads that found nothing, or an expired entry
    pub misses: u64,
    /// `hits + misses`
    pub total_requests: u64,
    /// `hits / total_requests`, or 0 before the first read
    pub hit_rate: f64,
    /// Live entries at snapshot time
    pub entry_count: usize,
    /// Estimated total size of live entries, in bytes
    pub memory_usage_bytes: usize,
    /// Rolling average of durations fed to `record_access_duration`,
    /// in milliseconds; `None` before the first sample
    pub avg_access_duration_ms: Option<f64>,
}

struct Inner<K, V> {
    entries: FxHashMap<K, CacheEntry<V>>,
    config: CacheConfig,
    total_bytes: usize,
    hits: u64,
    misses: u64,
    access_duration_sum: Duration,
    access_duration_samples: u64,
}

/// TTL + LRU memoizing store with dual-axis capacity and telemetry
///
/// All state lives behind a single mutex; the lock is never held across a
/// compute closure or an `.await` point. A poisoned lock is recovered rather
/// than propagated, since every critical section leaves the map consistent.
pub struct ResultCache<K, V> {
    inner: Mutex<Inner<K, V>>,
    cleanup: Mutex<Option<JoinHandle<()>>>,
}

impl<K, V> ResultCache<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone + Serialize,
{
    /// Create a cache with the given policy
    pub fn new(config: CacheConfig) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: FxHashMap::default(),
                config,
                total_bytes: 0,
                hits: 0,
                misses: 0,
                access_duration_sum: Duration::ZERO,
                access_duration_samples: 0,
            }),
            cleanup: Mutex::new(None),
        }
    }

    /// Create a cache with [`CacheConfig::default`]
    pub fn with_default_config() -> Self {
        Self::new(CacheConfig::default())
    }

    fn lock(&self) -> MutexGuard<'_, Inner<K, V>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Look up `key`, counting a hit or miss
    ///
    /// An expired entry is removed on sight and counted as a miss.
    pub fn get(&self, key: &K) -> Option<V> {
        let now = Instant::now();
        let mut guard = self.lock();
        let inner = &mut *guard;

        match inner.entries.get_mut(key) {
            Some(entry) if !entry.is_expired(now) => {
                entry.last_accessed = now;
                entry.access_count += 1;
                let value = entry.value.clone();
                inner.hits += 1;
                Some(value)
            }
            Some(_) => {
                if let Some(entry) = inner.entries.remove(key) {
                    inner.total_bytes = inner.total_bytes.saturating_sub(entry.size_bytes);
                    trace!(
                        age_ms = entry.created_at.elapsed().as_millis() as u64,
                        "expired on read"
                    );
                }
                inner.misses += 1;
                None
            }
            None => {
                inner.misses += 1;
                None
            }
        }
    }

    /// Whether a live entry exists for `key`
    ///
    /// Does not count as an access: telemetry and recency are untouched.
    pub fn contains_key(&self, key: &K) -> bool {
        let now = Instant::now();
        self.lock()
            .entries
            .get(key)
            .map_or(false, |entry| !entry.is_expired(now))
    }

    /// Insert with the default TTL and normal priority
    pub fn insert(&self, key: K, value: V) {
        self.insert_with(key, value, Duration::ZERO, None, Priority::Normal);
    }

    /// Insert with full control over bookkeeping
    ///
    /// `time_to_live: None` uses the configured default. An entry whose
    /// estimated size alone exceeds `max_bytes` is not admitted at all.
    pub fn insert_with(
        &self,
        key: K,
        value: V,
        compute_duration: Duration,
        time_to_live: Option<Duration>,
        priority: Priority,
    ) {
        let size_bytes = estimate_size(&value);
        let now = Instant::now();
        let mut inner = self.lock();

        // An entry that cannot satisfy both limits even against an empty
        // map is never admitted
        if inner.config.max_entries == 0 || size_bytes > inner.config.max_bytes {
            debug!(
                size_bytes,
                max_bytes = inner.config.max_bytes,
                max_entries = inner.config.max_entries,
                "value cannot fit under capacity limits"
            );
            return;
        }

        // Replacing an existing key first, so its old size does not count
        // against the capacity check
        if let Some(old) = inner.entries.remove(&key) {
            inner.total_bytes = inner.total_bytes.saturating_sub(old.size_bytes);
        }

        evict_until_fits(&mut inner, 1, size_bytes);

        let ttl = time_to_live.unwrap_or(inner.config.time_to_live);
        inner.total_bytes += size_bytes;
        inner.entries.insert(
            key,
            CacheEntry {
                value,
                created_at: now,
                last_accessed: now,
                access_count: 0,
                compute_duration,
                size_bytes,
                time_to_live: ttl,
                priority,
            },
        );
    }

    /// Remove `key`, returning the value if it was present
    pub fn remove(&self, key: &K) -> Option<V> {
        let mut inner = self.lock();
        let entry = inner.entries.remove(key)?;
        inner.total_bytes = inner.total_bytes.saturating_sub(entry.size_bytes);
        Some(entry.value)
    }

    /// Drop every entry; telemetry counters are kept
    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.entries.clear();
        inner.total_bytes = 0;
    }

    /// Number of live entries (expired-but-unswept entries included)
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// Whether the cache holds no entries
    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    /// Return the cached value for `key`, or compute, store, and return it
    ///
    /// The second element of the pair is `true` on a cache hit. The lock is
    /// released while `compute` runs, so concurrent misses for the same key
    /// all compute; the last writer wins. Errors are propagated and nothing
    /// is cached for them.
    pub fn get_or_compute<E>(
        &self,
        key: K,
        time_to_live: Option<Duration>,
        priority: Priority,
        compute: impl FnOnce() -> Result<V, E>,
    ) -> Result<(V, bool), E> {
        if let Some(value) = self.get(&key) {
            return Ok((value, true));
        }
        let started = Instant::now();
        let value = compute()?;
        self.insert_with(key, value.clone(), started.elapsed(), time_to_live, priority);
        Ok((value, false))
    }

    /// Async twin of [`get_or_compute`](Self::get_or_compute)
    ///
    /// The lock is never held across the `.await`; the same thundering-herd
    /// caveat applies.
    pub async fn get_or_compute_async<E, F>(
        &self,
        key: K,
        time_to_live: Option<Duration>,
        priority: Priority,
        compute: F,
    ) -> Result<(V, bool), E>
    where
        F: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get(&key) {
            return Ok((value, true));
        }
        let started = Instant::now();
        let value = compute.await?;
        self.insert_with(key, value.clone(), started.elapsed(), time_to_live, priority);
        Ok((value, false))
    }

    /// Remove every expired entry, returning how many were dropped
    pub fn sweep_expired(&self) -> usize {
        let now = Instant::now();
        let mut inner = self.lock();

        let expired: Vec<K> = inner
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            if let Some(entry) = inner.entries.remove(key) {
                inner.total_bytes = inner.total_bytes.saturating_sub(entry.size_bytes);
            }
        }
        if !expired.is_empty() {
            debug!(swept = expired.len(), remaining = inner.entries.len(), "expiry sweep");
        }
        expired.len()
    }

    /// Telemetry snapshot
    pub fn stats(&self) -> CacheStats {
        let inner = self.lock();
        let total = inner.hits + inner.misses;
        CacheStats {
            hits: inner.hits,
            misses: inner.misses,
            total_requests: total,
            hit_rate: if total == 0 {
                0.0
            } else {
                inner.hits as f64 / total as f64
            },
            entry_count: inner.entries.len(),
            memory_usage_bytes: inner.total_bytes,
            avg_access_duration_ms: (inner.access_duration_samples > 0).then(|| {
                inner.access_duration_sum.as_secs_f64() * 1_000.0
                    / inner.access_duration_samples as f64
            }),
        }
    }

    /// Current policy
    pub fn config(&self) -> CacheConfig {
        self.lock().config.clone()
    }

    /// Feed one observed access duration into the rolling average
    pub fn record_access_duration(&self, duration: Duration) {
        let mut inner = self.lock();
        inner.access_duration_sum += duration;
        inner.access_duration_samples += 1;
    }
}

impl<K, V> ResultCache<K, V>
where
    K: Hash + Eq + Clone + Send + 'static,
    V: Clone + Serialize + Send + 'static,
{
    /// Replace the policy, shrinking to the new capacity immediately and
    /// restarting the cleanup task if one was running
    ///
    /// Must be called from within a tokio runtime when a cleanup task is
    /// active.
    pub fn reconfigure(self: &Arc<Self>, config: CacheConfig) {
        let restart = {
            let mut inner = self.lock();
            inner.config = config;
            evict_until_fits(&mut inner, 0, 0);
            self.cleanup
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .is_some()
        };
        if restart {
            self.start_cleanup();
        }
    }

    /// Spawn (or respawn) the periodic expiry sweep on the current runtime
    ///
    /// The task holds only a weak reference, so dropping the last cache
    /// handle ends it on its own.
    pub fn start_cleanup(self: &Arc<Self>) {
        let interval = self.lock().config.cleanup_interval.max(Duration::from_millis(1));
        let weak = Arc::downgrade(self);
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // the first tick fires immediately, skip it
            ticker.tick().await;
            loop {
                ticker.tick().await;
                match weak.upgrade() {
                    Some(cache) => {
                        cache.sweep_expired();
                    }
                    None => break,
                }
            }
        });
        let mut slot = self.cleanup.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(old) = slot.replace(task) {
            old.abort();
        }
    }

    /// Stop the cleanup task, if running
    pub fn stop_cleanup(&self) {
        let mut slot = self.cleanup.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(task) = slot.take() {
            task.abort();
        }
    }
}

impl<K, V> Drop for ResultCache<K, V> {
    fn drop(&mut self) {
        if let Ok(mut slot) = self.cleanup.lock() {
            if let Some(task) = slot.take() {
                task.abort();
            }
        }
    }
}

/// Evict until `incoming_entries` more entries of `incoming_bytes` total
/// fit under both capacity axes
///
/// Victim selection scans every entry for the least recently used one,
/// priority breaking exact recency ties; linear in cache size, which the
/// entry cap keeps small.
fn evict_until_fits<K, V>(inner: &mut Inner<K, V>, incoming_entries: usize, incoming_bytes: usize)
where
    K: Hash + Eq + Clone,
{
    while !inner.entries.is_empty()
        && (inner.entries.len() + incoming_entries > inner.config.max_entries
            || inner.total_bytes + incoming_bytes > inner.config.max_bytes)
    {
        let victim = inner
            .entries
            .iter()
            .min_by_key(|(_, entry)| (entry.last_accessed, entry.priority))
            .map(|(key, _)| key.clone());
        match victim {
            Some(key) => {
                if let Some(entry) = inner.entries.remove(&key) {
                    inner.total_bytes = inner.total_bytes.saturating_sub(entry.size_bytes);
                    debug!(
                        size_bytes = entry.size_bytes,
                        access_count = entry.access_count,
                        priority = ?entry.priority,
                        "evicted"
                    );
                }
            }
            None => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn tiny(max_entries: usize) -> CacheConfig {
        CacheConfig {
            max_entries,
            ..CacheConfig::small()
        }
    }

    #[test]
    fn test_hit_and_miss_counters() {
        let cache: ResultCache<&str, f64> = ResultCache::new(CacheConfig::small());
        assert_eq!(cache.get(&"a"), None);
        cache.insert("a", 1.5);
        assert_eq!(cache.get(&"a"), Some(1.5));
        assert_eq!(cache.get(&"a"), Some(1.5));

        let stats = cache.stats();
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.total_requests, 3);
        assert!((stats.hit_rate - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_ttl_expiry_on_read() {
        let cache: ResultCache<u32, u32> = ResultCache::new(CacheConfig::small());
        cache.insert_with(
            1,
            100,
            Duration::ZERO,
            Some(Duration::from_millis(10)),
            Priority::Normal,
        );
        assert_eq!(cache.get(&1), Some(100));
        assert!(cache.contains_key(&1));
        thread::sleep(Duration::from_millis(30));
        assert!(!cache.contains_key(&1));
        assert_eq!(cache.get(&1), None);
        assert_eq!(cache.len(), 0);
        assert_eq!(cache.stats().memory_usage_bytes, 0);
    }

    #[test]
    fn test_sweep_expired() {
        let cache: ResultCache<u32, u32> = ResultCache::new(CacheConfig::small());
        for key in 0..4 {
            cache.insert_with(
                key,
                key,
                Duration::ZERO,
                Some(Duration::from_millis(10)),
                Priority::Normal,
            );
        }
        cache.insert(99, 99);
        thread::sleep(Duration::from_millis(30));
        assert_eq!(cache.sweep_expired(), 4);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&99), Some(99));
    }

    #[test]
    fn test_entry_cap_never_exceeded() {
        let cache: ResultCache<u32, u32> = ResultCache::new(tiny(4));
        for key in 0..20 {
            cache.insert(key, key);
            assert!(cache.len() <= 4);
        }
    }

    #[test]
    fn test_lru_eviction_keeps_recently_read() {
        let cache: ResultCache<u32, u32> = ResultCache::new(tiny(3));
        cache.insert(1, 1);
        thread::sleep(Duration::from_millis(2));
        cache.insert(2, 2);
        thread::sleep(Duration::from_millis(2));
        cache.insert(3, 3);
        thread::sleep(Duration::from_millis(2));

        // Touch 1 so that 2 becomes the oldest
        assert_eq!(cache.get(&1), Some(1));
        cache.insert(4, 4);

        assert_eq!(cache.get(&2), None);
        assert_eq!(cache.get(&1), Some(1));
        assert_eq!(cache.get(&3), Some(3));
        assert_eq!(cache.get(&4), Some(4));
    }

    #[test]
    fn test_recency_outranks_priority() {
        let cache: ResultCache<u32, u32> = ResultCache::new(tiny(2));
        cache.insert_with(1, 1, Duration::ZERO, None, Priority::Normal);
        thread::sleep(Duration::from_millis(2));
        cache.insert_with(2, 2, Duration::ZERO, None, Priority::Low);
        thread::sleep(Duration::from_millis(2));

        // Refresh the low-priority entry; key 1 is now the true LRU victim
        assert_eq!(cache.get(&2), Some(2));
        cache.insert(3, 3);

        assert!(cache.contains_key(&2));
        assert!(!cache.contains_key(&1));
        assert!(cache.contains_key(&3));
    }

    #[test]
    fn test_byte_cap_evicts() {
        let config = CacheConfig {
            max_bytes: 600,
            max_entries: 100,
            ..CacheConfig::small()
        };
        let cache: ResultCache<u32, Vec<f64>> = ResultCache::new(config);
        for key in 0..10 {
            cache.insert(key, vec![1.0; 20]);
        }
        let stats = cache.stats();
        assert!(stats.memory_usage_bytes <= 600);
        assert!(stats.entry_count < 10);
        assert!(stats.entry_count >= 1);
    }

    #[test]
    fn test_oversized_value_not_admitted() {
        let config = CacheConfig {
            max_bytes: 100,
            ..CacheConfig::small()
        };
        let cache: ResultCache<u32, Vec<f64>> = ResultCache::new(config);
        cache.insert(1, vec![1.0; 1_000]);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_zero_entry_cap_admits_nothing() {
        let cache: ResultCache<u32, u32> = ResultCache::new(tiny(0));
        cache.insert(1, 1);
        assert!(cache.is_empty());
        assert_eq!(cache.get(&1), None);
    }

    #[test]
    fn test_replacing_key_updates_bytes() {
        let cache: ResultCache<u32, Vec<f64>> = ResultCache::new(CacheConfig::small());
        cache.insert(1, vec![1.0; 50]);
        let before = cache.stats().memory_usage_bytes;
        cache.insert(1, vec![1.0; 2]);
        let after = cache.stats().memory_usage_bytes;
        assert_eq!(cache.len(), 1);
        assert!(after < before);
    }

    #[test]
    fn test_get_or_compute() {
        let cache: ResultCache<&str, u32> = ResultCache::new(CacheConfig::small());
        let mut calls = 0;

        let (value, hit) = cache
            .get_or_compute("k", None, Priority::Normal, || {
                calls += 1;
                Ok::<_, StringError>(7)
            })
            .unwrap();
        assert_eq!((value, hit), (7, false));

        let (value, hit) = cache
            .get_or_compute("k", None, Priority::Normal, || {
                calls += 1;
                Ok::<_, StringError>(7)
            })
            .unwrap();
        assert_eq!((value, hit), (7, true));
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_get_or_compute_error_not_cached() {
        let cache: ResultCache<&str, u32> = ResultCache::new(CacheConfig::small());
        let result = cache.get_or_compute("k", None, Priority::Normal, || {
            Err::<u32, _>(StringError)
        });
        assert!(result.is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_access_duration_average() {
        let cache: ResultCache<u32, u32> = ResultCache::new(CacheConfig::small());
        assert_eq!(cache.stats().avg_access_duration_ms, None);
        cache.record_access_duration(Duration::from_millis(10));
        cache.record_access_duration(Duration::from_millis(20));
        let avg = cache.stats().avg_access_duration_ms.unwrap();
        assert!((avg - 15.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_get_or_compute_async() {
        let cache: ResultCache<&str, u32> = ResultCache::new(CacheConfig::small());
        let (value, hit) = cache
            .get_or_compute_async("k", None, Priority::Normal, async {
                Ok::<_, StringError>(11)
            })
            .await
            .unwrap();
        assert_eq!((value, hit), (11, false));

        let (value, hit) = cache
            .get_or_compute_async("k", None, Priority::Normal, async {
                Ok::<_, StringError>(99)
            })
            .await
            .unwrap();
        assert_eq!((value, hit), (11, true));
    }

    #[tokio::test]
    async fn test_cleanup_task_sweeps() {
        let config = CacheConfig {
            cleanup_interval: Duration::from_millis(20),
            ..CacheConfig::small()
        };
        let cache: Arc<ResultCache<u32, u32>> = Arc::new(ResultCache::new(config));
        cache.insert_with(
            1,
            1,
            Duration::ZERO,
            Some(Duration::from_millis(5)),
            Priority::Normal,
        );
        cache.start_cleanup();

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(cache.is_empty());
        cache.stop_cleanup();
    }

    #[tokio::test]
    async fn test_reconfigure_shrinks() {
        let cache: Arc<ResultCache<u32, u32>> = Arc::new(ResultCache::new(tiny(8)));
        for key in 0..8 {
            cache.insert(key, key);
        }
        cache.reconfigure(tiny(2));
        assert!(cache.len() <= 2);
        assert_eq!(cache.config().max_entries, 2);
    }

    #[derive(Debug)]
    struct StringError;
}
