// src/matching/memo.rs
use log::debug;
use lru::LruCache;
use std::num::NonZeroUsize;

/// Run-scoped cache of edit distances keyed by the unordered name pair.
///
/// Allocated when a run starts and dropped with it; never shared between runs.
pub struct DistanceMemo {
    cache: LruCache<(String, String), usize>,

    // Stats
    pub hits: usize,
    pub misses: usize,
}

impl DistanceMemo {
    pub fn new(capacity: NonZeroUsize) -> Self {
        debug!("Initializing edit distance memo with capacity: {}", capacity);
        Self {
            cache: LruCache::new(capacity),
            hits: 0,
            misses: 0,
        }
    }

    /// Get the cache key for a name pair, independent of argument order
    pub fn get_pair_key(a: &str, b: &str) -> (String, String) {
        if a <= b {
            (a.to_string(), b.to_string())
        } else {
            (b.to_string(), a.to_string())
        }
    }

    /// Distance for the pair, computing and storing it with `compute` on a miss.
    pub fn get_or_compute<F>(&mut self, a: &str, b: &str, compute: F) -> usize
    where
        F: FnOnce(&str, &str) -> usize,
    {
        let key = Self::get_pair_key(a, b);
        if let Some(distance) = self.cache.get(&key) {
            self.hits += 1;
            return *distance;
        }

        self.misses += 1;
        let distance = compute(&key.0, &key.1);
        self.cache.put(key, distance);
        distance
    }

    /// Get cache statistics
    pub fn get_stats(&self) -> (usize, usize) {
        (self.hits, self.misses)
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Clear the cache
    pub fn clear(&mut self) {
        self.cache.clear();
        self.hits = 0;
        self.misses = 0;
    }
}
