//! TTL Registry Module
//!
//! Tick-based countdowns for keys carrying a time-to-live.

use std::collections::HashMap;
use std::time::Duration;

// == TTL Entry ==
/// Countdown state for one key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TtlEntry {
    /// Ticks left before the key expires
    pub remaining_ticks: u64,
    /// TTL as requested, reported back by `get_ttl`
    pub ttl: Duration,
}

impl TtlEntry {
    // == Constructor ==
    /// Converts `ttl` into a tick countdown for the given tick interval.
    pub fn new(ttl: Duration, tick_interval: Duration) -> Self {
        Self {
            remaining_ticks: ticks_for(ttl, tick_interval),
            ttl,
        }
    }
}

/// Number of ticks covering `ttl`, rounded to the nearest tick.
///
/// Expiry is therefore accurate to within one tick interval.
pub fn ticks_for(ttl: Duration, tick_interval: Duration) -> u64 {
    (ttl.as_secs_f64() / tick_interval.as_secs_f64()).round() as u64
}

// == TTL Registry ==
/// Mapping from key to its countdown.
#[derive(Debug, Default)]
pub struct TtlRegistry {
    entries: HashMap<String, TtlEntry>,
}

impl TtlRegistry {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    // == Insert ==
    /// Registers or replaces the countdown for `key`.
    pub fn insert(&mut self, key: &str, entry: TtlEntry) -> Option<TtlEntry> {
        self.entries.insert(key.to_string(), entry)
    }

    pub fn get(&self, key: &str) -> Option<&TtlEntry> {
        self.entries.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<TtlEntry> {
        self.entries.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of active countdowns.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // == Tick ==
    /// Advances every countdown by one tick and returns the keys now due.
    ///
    /// Due keys are left in the registry; the caller removes them through
    /// the regular removal path so expiry and explicit removal share it.
    pub fn tick(&mut self) -> Vec<String> {
        let mut due = Vec::new();

        for (key, entry) in self.entries.iter_mut() {
            if entry.remaining_ticks <= 1 {
                due.push(key.clone());
            } else {
                entry.remaining_ticks -= 1;
            }
        }

        due
    }
}
