//! Tick Cache - an in-process TTL cache driven by an external event loop
//!
//! Keys expire on a periodic tick, and a graceful `end()` lets pending TTLs
//! drain before the cache closes.

pub mod api;
pub mod cache;
pub mod completion;
pub mod config;
pub mod error;
pub mod models;
pub mod scheduler;

pub use api::AppState;
pub use cache::{Cache, CacheEvent, CacheStats, LifecycleState, WeakCache};
pub use completion::{Completion, Resolver};
pub use config::{CacheConfig, Config, ShutdownMode, StartMode};
pub use error::{CacheError, ReadError, Result, WriteError};
pub use scheduler::{EventLoop, ManualLoop, TokioLoop};
