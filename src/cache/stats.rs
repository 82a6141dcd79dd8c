//! Cache Statistics Module
//!
//! Tracks read and expiry counters, and reports sizes on demand.

use serde::Serialize;

// == Cache Stats ==
/// Snapshot of cache metrics returned by `Cache::stats`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Number of keys currently stored
    pub keys: usize,
    /// Number of keys with an active TTL
    pub ttl_keys: usize,
    /// Number of `get` calls that found a value
    pub hits: u64,
    /// Number of `get` calls that found nothing
    pub misses: u64,
    /// Number of keys removed by TTL expiry
    pub expirations: u64,
    /// Total bytes used by keys
    pub key_bytes: usize,
    /// Total bytes used by values serialized as JSON
    pub value_bytes: usize,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if no reads have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_expiration(&mut self) {
        self.expirations += 1;
    }

    // == Reset ==
    /// Zeroes the running counters.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
