//! Lifecycle events broadcast to observers.

use tokio::sync::broadcast;

use crate::cache::engine::WeakCache;

/// Buffered events per subscriber before the oldest are dropped
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

// == Cache Event ==
/// Observation emitted by a cache.
///
/// Lifecycle events carry a weak handle to the emitting cache, so buffered
/// events never keep a dropped cache alive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEvent {
    /// The cache opened
    Started(WeakCache),
    /// The cache closed and dropped its data
    Stopped(WeakCache),
    /// The environment reported a failure
    Error(String),
}

impl CacheEvent {
    /// The emitting cache, if the event names one and it is still alive.
    pub fn cache(&self) -> Option<crate::cache::Cache> {
        match self {
            Self::Started(handle) | Self::Stopped(handle) => handle.upgrade(),
            Self::Error(_) => None,
        }
    }
}

pub(crate) fn channel() -> broadcast::Sender<CacheEvent> {
    broadcast::channel(EVENT_CHANNEL_CAPACITY).0
}
