//! Insertion Order Module
//!
//! Remembers the order in which keys were first stored.

use std::collections::VecDeque;

// == Insertion Order ==
/// Tracks first-insertion order of keys.
///
/// Keys are stored in a VecDeque where:
/// - Front = Oldest key
/// - Back = Newest key
///
/// Re-inserting a key that is already tracked keeps its position.
#[derive(Debug, Default)]
pub struct InsertionOrder {
    /// Keys in insertion order
    order: VecDeque<String>,
}

impl InsertionOrder {
    // == Constructor ==
    pub fn new() -> Self {
        Self {
            order: VecDeque::new(),
        }
    }

    // == Push ==
    /// Appends a newly stored key.
    ///
    /// Callers only push keys that are not tracked yet.
    pub fn push(&mut self, key: &str) {
        self.order.push_back(key.to_string());
    }

    // == Remove ==
    /// Removes a key from the tracker.
    pub fn remove(&mut self, key: &str) {
        self.order.retain(|k| k != key);
    }

    // == Snapshot ==
    /// Returns all keys, oldest first.
    pub fn snapshot(&self) -> Vec<String> {
        self.order.iter().cloned().collect()
    }

    // == Clear ==
    pub fn clear(&mut self) {
        self.order.clear();
    }

    // == Length ==
    /// Returns the number of tracked keys.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
