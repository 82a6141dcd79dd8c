//! Cache Entry Module
//!
//! Defines the structure for individual cache entries.

use serde_json::Value;

// == Cache Entry ==
/// Represents a single stored value with bookkeeping metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    /// The stored value
    pub value: Value,
    /// Size of the value once serialized to JSON, in bytes
    pub size: usize,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new cache entry, measuring its serialized size.
    pub fn new(value: Value) -> Self {
        let size = value.to_string().len();
        Self { value, size }
    }

    // == Is Object ==
    /// Returns true if the value is a JSON object.
    pub fn is_object(value: &Value) -> bool {
        value.is_object()
    }
}
