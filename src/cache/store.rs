//! Key-Value Store Module
//!
//! HashMap storage paired with an insertion-order tracker.

use std::collections::HashMap;

use serde_json::Value;

use crate::cache::{CacheEntry, InsertionOrder};

// == Key-Value Store ==
/// Ordered mapping from key to value.
#[derive(Debug, Default)]
pub struct KeyValueStore {
    /// Key-value storage
    entries: HashMap<String, CacheEntry>,
    /// First-insertion order of keys
    order: InsertionOrder,
}

impl KeyValueStore {
    // == Constructor ==
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            order: InsertionOrder::new(),
        }
    }

    // == Insert ==
    /// Stores a value, returning the one it replaced.
    ///
    /// Overwriting keeps the key's original position.
    pub fn insert(&mut self, key: &str, value: Value) -> Option<Value> {
        let previous = self.entries.insert(key.to_string(), CacheEntry::new(value));
        if previous.is_none() {
            self.order.push(key);
        }
        previous.map(|entry| entry.value)
    }

    // == Get ==
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key).map(|entry| &entry.value)
    }

    // == Remove ==
    /// Removes a key, returning its value if it was present.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let removed = self.entries.remove(key)?;
        self.order.remove(key);
        Some(removed.value)
    }

    // == Contains ==
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    // == Keys ==
    /// Returns a snapshot of all keys in insertion order.
    pub fn keys(&self) -> Vec<String> {
        self.order.snapshot()
    }

    // == Clear ==
    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    // == Sizes ==
    /// Total bytes used by keys.
    pub fn key_bytes(&self) -> usize {
        self.entries.keys().map(String::len).sum()
    }

    /// Total bytes used by values serialized as JSON.
    pub fn value_bytes(&self) -> usize {
        self.entries.values().map(|entry| entry.size).sum()
    }

    // == Length ==
    /// Returns the current number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_store_new() {
        let store = KeyValueStore::new();
        assert_eq!(store.len(), 0);
        assert!(store.is_empty());
    }

    #[test]
    fn test_store_insert_and_get() {
        let mut store = KeyValueStore::new();

        assert!(store.insert("key1", json!("value1")).is_none());

        assert_eq!(store.get("key1"), Some(&json!("value1")));
        assert!(store.contains("key1"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_get_nonexistent() {
        let store = KeyValueStore::new();
        assert!(store.get("nonexistent").is_none());
    }

    #[test]
    fn test_store_overwrite_keeps_position() {
        let mut store = KeyValueStore::new();

        store.insert("a", json!(1));
        store.insert("b", json!(2));
        let previous = store.insert("a", json!(3));

        assert_eq!(previous, Some(json!(1)));
        assert_eq!(store.get("a"), Some(&json!(3)));
        assert_eq!(store.keys(), vec!["a", "b"]);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_store_remove() {
        let mut store = KeyValueStore::new();

        store.insert("key1", json!("value1"));
        assert_eq!(store.remove("key1"), Some(json!("value1")));
        assert!(store.remove("key1").is_none());

        assert!(store.is_empty());
        assert!(store.keys().is_empty());
    }

    #[test]
    fn test_store_sizes() {
        let mut store = KeyValueStore::new();

        store.insert("ab", json!("xy"));
        store.insert("c", json!(10));

        assert_eq!(store.key_bytes(), 3);
        // "\"xy\"" is 4 bytes, "10" is 2
        assert_eq!(store.value_bytes(), 6);
    }

    #[test]
    fn test_store_clear() {
        let mut store = KeyValueStore::new();
        store.insert("a", json!(1));
        store.insert("b", json!(2));

        store.clear();
        assert!(store.is_empty());
        assert!(store.keys().is_empty());
        assert_eq!(store.value_bytes(), 0);
    }
}
