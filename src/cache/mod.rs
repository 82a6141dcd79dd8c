//! Cache Module
//!
//! In-memory key-value storage with tick-driven TTL expiry and a
//! Closed / Open / Ending lifecycle.

mod engine;
mod entry;
mod event;
mod lifecycle;
mod order;
mod stats;
mod store;
mod ttl;


// Re-export public types
pub use engine::{Cache, WeakCache};
pub use entry::CacheEntry;
pub use event::{CacheEvent, EVENT_CHANNEL_CAPACITY};
pub use lifecycle::{drain_complete, plan_end, EndPlan, LifecycleState, PendingEndWaiters};
pub use order::InsertionOrder;
pub use stats::CacheStats;
pub use store::KeyValueStore;
pub use ttl::{ticks_for, TtlEntry, TtlRegistry};
