//! Bounded LRU cache of formatted search results.
//!
//! Entries are keyed by a SHA-256 fingerprint of the query text together with
//! the requested result count, so `("foo", 5)` and `("foo", 10)` never share
//! an entry. Access order drives eviction: a `get` hit promotes the entry the
//! same way a `put` does.

use crate::types::SearchHit;
use lru::LruCache;
use parking_lot::Mutex;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::num::NonZeroUsize;
use std::sync::Arc;

/// Fingerprint of a `(query, top_k)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(query: &str, top_k: usize) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(format!("{query}:{top_k}").as_bytes());
        Self(format!("{:x}", hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A stored result set together with the latency of the computation that produced it.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub results: Arc<Vec<SearchHit>>,
    pub search_time_ms: f64,
}

/// Point-in-time cache efficiency figures.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub total_queries: u64,
    /// Percentage in [0, 100]; zero before the first access
    pub hit_rate: f64,
    pub cache_size: usize,
}

struct CacheState {
    entries: LruCache<CacheKey, CacheEntry>,
    hits: u64,
    misses: u64,
}

/// Thread-safe LRU result cache. One lock guards entries and counters together.
pub struct ResultCache {
    state: Mutex<CacheState>,
    capacity: NonZeroUsize,
}

impl ResultCache {
    /// Create a cache holding at most `capacity` entries. A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            state: Mutex::new(CacheState {
                entries: LruCache::new(capacity),
                hits: 0,
                misses: 0,
            }),
            capacity,
        }
    }

    /// Look up an entry, promoting it to most-recently-used on hit.
    pub fn get(&self, key: &CacheKey) -> Option<CacheEntry> {
        let mut state = self.state.lock();
        match state.entries.get(key).cloned() {
            Some(entry) => {
                state.hits += 1;
                Some(entry)
            }
            None => {
                state.misses += 1;
                None
            }
        }
    }

    /// Insert or refresh an entry. Evicts the least-recently-used entry when full.
    pub fn put(&self, key: CacheKey, entry: CacheEntry) {
        let mut state = self.state.lock();
        if let Some((evicted, _)) = state.entries.push(key.clone(), entry) {
            if evicted != key {
                tracing::debug!("[cache] evicted {}", evicted.as_str());
            }
        }
    }

    pub fn get_stats(&self) -> CacheStats {
        let state = self.state.lock();
        let total = state.hits + state.misses;
        let hit_rate = if total == 0 {
            0.0
        } else {
            state.hits as f64 / total as f64 * 100.0
        };

        CacheStats {
            hits: state.hits,
            misses: state.misses,
            total_queries: total,
            hit_rate,
            cache_size: state.entries.len(),
        }
    }

    /// Drop every entry. Hit and miss counters are kept.
    pub fn clear(&self) {
        self.state.lock().entries.clear();
    }

    /// Check membership without touching recency or counters.
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.state.lock().entries.contains(key)
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new(1000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(ms: f64) -> CacheEntry {
        CacheEntry {
            results: Arc::new(Vec::new()),
            search_time_ms: ms,
        }
    }

    fn key(i: usize) -> CacheKey {
        CacheKey::new(&format!("query {i}"), 10)
    }

    #[test]
    fn test_key_includes_top_k() {
        assert_eq!(CacheKey::new("parse json", 5), CacheKey::new("parse json", 5));
        assert_ne!(CacheKey::new("parse json", 5), CacheKey::new("parse json", 10));
        // sha256 hex digest
        assert_eq!(CacheKey::new("x", 1).as_str().len(), 64);
    }

    #[test]
    fn test_capacity_plus_one_evicts_oldest() {
        let cache = ResultCache::new(3);
        for i in 0..4 {
            cache.put(key(i), entry(i as f64));
        }

        assert_eq!(cache.len(), 3);
        assert!(!cache.contains(&key(0)));
        for i in 1..4 {
            assert!(cache.contains(&key(i)));
        }
    }

    #[test]
    fn test_get_promotes_entry() {
        let cache = ResultCache::new(3);
        for i in 0..3 {
            cache.put(key(i), entry(1.0));
        }

        // Touch the oldest key, then push two new keys
        assert!(cache.get(&key(0)).is_some());
        cache.put(key(3), entry(1.0));
        cache.put(key(4), entry(1.0));

        assert!(cache.contains(&key(0)));
        assert!(!cache.contains(&key(1)));
        assert!(!cache.contains(&key(2)));
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn test_put_refreshes_existing_key() {
        let cache = ResultCache::new(2);
        cache.put(key(0), entry(1.0));
        cache.put(key(1), entry(1.0));
        cache.put(key(0), entry(9.0));
        cache.put(key(2), entry(1.0));

        assert!(!cache.contains(&key(1)));
        assert_eq!(cache.get(&key(0)).unwrap().search_time_ms, 9.0);
    }

    #[test]
    fn test_stats_track_hits_and_misses() {
        let cache = ResultCache::new(10);
        let empty = cache.get_stats();
        assert_eq!(empty.total_queries, 0);
        assert_eq!(empty.hit_rate, 0.0);

        cache.put(key(0), entry(1.0));
        cache.get(&key(0));
        cache.get(&key(0));
        cache.get(&key(0));
        cache.get(&key(1));

        let stats = cache.get_stats();
        assert_eq!(stats.hits, 3);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.total_queries, 4);
        assert_eq!(stats.hit_rate, 75.0);
        assert_eq!(stats.cache_size, 1);

        // Reading stats does not count as an access
        assert_eq!(cache.get_stats(), stats);
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let cache = ResultCache::new(0);
        assert_eq!(cache.capacity(), 1);
        cache.put(key(0), entry(1.0));
        cache.put(key(1), entry(1.0));
        assert_eq!(cache.len(), 1);
        assert!(cache.contains(&key(1)));
    }

    #[test]
    fn test_clear_keeps_counters() {
        let cache = ResultCache::new(4);
        cache.put(key(0), entry(1.0));
        cache.get(&key(0));
        cache.clear();

        assert!(cache.is_empty());
        assert_eq!(cache.get_stats().hits, 1);
    }

    #[test]
    fn test_concurrent_access() {
        let cache = Arc::new(ResultCache::new(64));
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    for i in 0..100 {
                        let k = key(t * 100 + i);
                        cache.put(k.clone(), entry(1.0));
                        cache.get(&k);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let stats = cache.get_stats();
        assert_eq!(stats.total_queries, 800);
        assert!(stats.cache_size <= 64);
    }
}
