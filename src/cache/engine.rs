//! Cache Engine Module
//!
//! Combines the key-value store, the TTL registry and the lifecycle state
//! machine behind one handle. Every operation returns a `Completion`; only
//! a deferred `start()` and a draining `end()` can return a pending one.

use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::cache::event::{self, CacheEvent};
use crate::cache::lifecycle::{self, EndPlan, LifecycleState, PendingEndWaiters};
use crate::cache::{CacheEntry, CacheStats, KeyValueStore, TtlEntry, TtlRegistry};
use crate::completion::Completion;
use crate::config::{CacheConfig, StartMode};
use crate::error::{ReadError, WriteError};
use crate::scheduler::{EventLoop, TickCallback, TimerSubscription};

struct CacheInner {
    /// Handle to this cache carried by emitted events
    this: WeakCache,
    config: CacheConfig,
    event_loop: Arc<dyn EventLoop>,
    state: LifecycleState,
    store: KeyValueStore,
    ttls: TtlRegistry,
    stats: CacheStats,
    end_waiters: PendingEndWaiters<Cache>,
    /// Live tick subscription; `None` while paused
    timer: Option<TimerSubscription>,
    events: broadcast::Sender<CacheEvent>,
}

impl CacheInner {
    fn emit(&self, event: CacheEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}

impl Drop for CacheInner {
    fn drop(&mut self) {
        if self.state.is_started() {
            if !self.end_waiters.is_empty() {
                warn!(
                    "Cache dropped with {} pending end waiter(s)",
                    self.end_waiters.len()
                );
            }
            let stopped = CacheEvent::Stopped(self.this.clone());
            self.emit(stopped);
        }
    }
}

// == Cache ==
/// Handle to a TTL-aware cache bound to an event loop.
///
/// Clones share the same cache. The tick timer only holds a weak reference,
/// so dropping the last handle cancels the timer.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use serde_json::json;
/// use tick_cache::{Cache, CacheConfig, ManualLoop};
///
/// let event_loop = ManualLoop::new();
/// let cache = Cache::new(event_loop.clone(), CacheConfig::default());
///
/// let _ = cache.start();
/// let _ = cache.set("greeting", json!("hello"), Some(Duration::from_millis(200)));
/// event_loop.advance(2);
///
/// assert_eq!(cache.get("greeting").take_ready(), Some(Ok(None)));
/// ```
#[derive(Clone)]
pub struct Cache {
    inner: Arc<Mutex<CacheInner>>,
}

impl Cache {
    // == Constructor ==
    /// Creates a closed cache. Call `start()` to open it.
    pub fn new(event_loop: Arc<dyn EventLoop>, config: CacheConfig) -> Self {
        Self {
            inner: Arc::new_cyclic(|weak| {
                Mutex::new(CacheInner {
                    this: WeakCache {
                        inner: weak.clone(),
                    },
                    config: config.normalized(),
                    event_loop,
                    state: LifecycleState::Closed,
                    store: KeyValueStore::new(),
                    ttls: TtlRegistry::new(),
                    stats: CacheStats::new(),
                    end_waiters: PendingEndWaiters::new(),
                    timer: None,
                    events: event::channel(),
                })
            }),
        }
    }

    fn from_weak(weak: &Weak<Mutex<CacheInner>>) -> Option<Self> {
        weak.upgrade().map(|inner| Self { inner })
    }

    /// Creates a handle that does not keep the cache alive.
    pub fn downgrade(&self) -> WeakCache {
        WeakCache {
            inner: Arc::downgrade(&self.inner),
        }
    }

    // == Observation ==
    /// Subscribes to lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<CacheEvent> {
        self.inner.lock().events.subscribe()
    }

    /// Publishes a failure reported by the environment as an `Error` event.
    pub fn report_error(&self, message: impl Into<String>) {
        let message = message.into();
        warn!("Cache error reported: {}", message);
        self.inner.lock().emit(CacheEvent::Error(message));
    }

    pub fn state(&self) -> LifecycleState {
        self.inner.lock().state
    }

    pub fn config(&self) -> CacheConfig {
        self.inner.lock().config.clone()
    }

    /// Number of keys with a live TTL countdown.
    pub fn active_ttl_count(&self) -> usize {
        self.inner.lock().ttls.len()
    }

    // == Lifecycle ==
    /// True while the cache is open or draining.
    pub fn is_started(&self) -> bool {
        self.inner.lock().state.is_started()
    }

    /// Opens the cache.
    ///
    /// With `StartMode::WhenLoopRunning` and an idle loop, opening is
    /// deferred until the loop runs and the returned handle stays pending
    /// until then.
    pub fn start(&self) -> Completion<Cache> {
        let mut inner = self.inner.lock();
        if inner.state.is_started() {
            return Completion::resolved(self.clone());
        }

        if inner.config.start == StartMode::WhenLoopRunning && !inner.event_loop.is_running() {
            let (resolver, completion) = Completion::pending();
            let weak = Arc::downgrade(&self.inner);
            debug!("Event loop not running, deferring cache start");
            let event_loop = inner.event_loop.clone();
            drop(inner);

            event_loop.on_start(Box::new(move || {
                // A dropped cache abandons the handle with the resolver
                if let Some(cache) = Cache::from_weak(&weak) {
                    let mut inner = cache.inner.lock();
                    if !inner.state.is_started() {
                        cache.open(&mut inner);
                    }
                    drop(inner);
                    resolver.resolve(cache);
                }
            }));
            return completion;
        }

        self.open(&mut inner);
        Completion::resolved(self.clone())
    }

    /// Closes the cache immediately, dropping all data.
    pub fn stop(&self) -> Completion<Cache> {
        let mut inner = self.inner.lock();
        if inner.state.is_started() {
            self.close(&mut inner);
        }
        Completion::resolved(self.clone())
    }

    /// Stops accepting new work and closes once the remaining TTLs expire.
    ///
    /// Without active TTLs, or with `ShutdownMode::Immediate`, this is
    /// `stop()`. Repeated calls while draining each get their own handle;
    /// all of them resolve when the drain completes.
    pub fn end(&self) -> Completion<Cache> {
        let mut inner = self.inner.lock();
        match lifecycle::plan_end(inner.state, inner.ttls.len(), inner.config.shutdown) {
            EndPlan::AlreadyClosed => Completion::resolved(self.clone()),
            EndPlan::StopNow => {
                self.close(&mut inner);
                Completion::resolved(self.clone())
            }
            EndPlan::Drain => {
                if inner.state == LifecycleState::Open {
                    inner.state = LifecycleState::Ending;
                    info!("Cache ending, draining {} TTL(s)", inner.ttls.len());
                }
                inner.end_waiters.park()
            }
        }
    }

    pub fn is_paused(&self) -> bool {
        self.inner.lock().timer.is_none()
    }

    /// Cancels the tick subscription; TTL countdowns freeze.
    pub fn pause(&self) {
        let mut inner = self.inner.lock();
        Self::pause_locked(&mut inner);
    }

    /// Re-creates the tick subscription.
    pub fn resume(&self) {
        let mut inner = self.inner.lock();
        self.resume_locked(&mut inner);
    }

    fn pause_locked(inner: &mut CacheInner) {
        if let Some(timer) = inner.timer.take() {
            debug!(timer = timer.id().0, "Cache ticking paused");
        }
    }

    fn resume_locked(&self, inner: &mut CacheInner) {
        if inner.timer.is_none() {
            let subscription = TimerSubscription::new(
                inner.event_loop.clone(),
                inner.config.tick_interval,
                self.tick_callback(),
            );
            debug!(timer = subscription.id().0, "Cache ticking resumed");
            inner.timer = Some(subscription);
        }
    }

    fn tick_callback(&self) -> TickCallback {
        let weak = Arc::downgrade(&self.inner);
        Arc::new(move || {
            if let Some(cache) = Cache::from_weak(&weak) {
                cache.handle_tick();
            }
        })
    }

    fn open(&self, inner: &mut CacheInner) {
        inner.state = LifecycleState::Open;
        self.resume_locked(inner);
        info!(
            "Cache started with tick interval of {:?}",
            inner.config.tick_interval
        );
        let started = CacheEvent::Started(inner.this.clone());
        inner.emit(started);
    }

    fn close(&self, inner: &mut CacheInner) {
        inner.state = LifecycleState::Closed;
        inner.store.clear();
        inner.ttls.clear();
        inner.stats.reset();
        Self::pause_locked(inner);

        let resolved = inner.end_waiters.resolve_all(self);
        info!("Cache stopped, {} end waiter(s) resolved", resolved);
        let stopped = CacheEvent::Stopped(inner.this.clone());
        inner.emit(stopped);
    }

    // == Tick ==
    fn handle_tick(&self) {
        let mut inner = self.inner.lock();
        if !inner.state.is_started() {
            return;
        }

        let due = inner.ttls.tick();
        if due.is_empty() {
            return;
        }

        let count = due.len();
        for key in due {
            // Counted first: the last removal of a drain resets the stats.
            if inner.store.contains(&key) {
                inner.stats.record_expiration();
            }
            self.remove_locked(&mut inner, &key);
        }
        debug!("TTL tick: expired {} key(s)", count);
    }

    // == Set ==
    /// Stores a value, registering a TTL when `ttl` is a positive duration.
    ///
    /// Overwriting a key without a TTL keeps any TTL it already had.
    pub fn set(&self, key: &str, value: Value, ttl: Option<Duration>) -> Completion<Value> {
        let mut inner = self.inner.lock();
        if !inner.state.allows_writes() {
            return Completion::rejected(WriteError::NotOpen);
        }
        if !inner.config.accept_objects && CacheEntry::is_object(&value) {
            return Completion::rejected(WriteError::UnsupportedValue);
        }

        inner.store.insert(key, value.clone());

        if let Some(ttl) = ttl.filter(|ttl| !ttl.is_zero()) {
            Self::register_ttl(&mut inner, key, ttl);
        }
        Completion::resolved(value)
    }

    // == Get ==
    /// Returns the stored value, or `None` if the key is not set.
    pub fn get(&self, key: &str) -> Completion<Option<Value>> {
        let mut inner = self.inner.lock();
        if !inner.state.allows_reads() {
            return Completion::rejected(ReadError::NotOpen);
        }

        let value = inner.store.get(key).cloned();
        if value.is_some() {
            inner.stats.record_hit();
        } else {
            inner.stats.record_miss();
        }
        Completion::resolved(value)
    }

    // == Remove ==
    /// Removes a key and its TTL. Resolves `false` if it was not set.
    pub fn remove(&self, key: &str) -> Completion<bool> {
        let mut inner = self.inner.lock();
        if !inner.state.allows_removals() {
            return Completion::rejected(WriteError::NotOpen);
        }
        Completion::resolved(self.remove_locked(&mut inner, key))
    }

    fn remove_locked(&self, inner: &mut CacheInner, key: &str) -> bool {
        if inner.store.remove(key).is_none() {
            return false;
        }
        if inner.ttls.contains(key) {
            self.remove_ttl_locked(inner, key);
        }
        true
    }

    // == Exists ==
    pub fn exists(&self, key: &str) -> Completion<bool> {
        let inner = self.inner.lock();
        if !inner.state.allows_reads() {
            return Completion::rejected(ReadError::NotOpen);
        }
        Completion::resolved(inner.store.contains(key))
    }

    // == Set TTL ==
    /// Starts (or restarts) the countdown for an existing key.
    pub fn set_ttl(&self, key: &str, ttl: Duration) -> Completion<Duration> {
        let mut inner = self.inner.lock();
        if !inner.state.allows_writes() {
            return Completion::rejected(WriteError::NotOpen);
        }
        if ttl.is_zero() {
            return Completion::rejected(WriteError::NonPositiveTtl);
        }
        if !inner.store.contains(key) {
            return Completion::rejected(WriteError::UndefinedKey(key.to_string()));
        }

        Self::register_ttl(&mut inner, key, ttl);
        Completion::resolved(ttl)
    }

    fn register_ttl(inner: &mut CacheInner, key: &str, ttl: Duration) {
        let entry = TtlEntry::new(ttl, inner.config.tick_interval);
        debug!(key, ticks = entry.remaining_ticks, "TTL registered");
        inner.ttls.insert(key, entry);
    }

    // == Get TTL ==
    /// Returns the TTL the key was given, or zero if it has none.
    pub fn get_ttl(&self, key: &str) -> Completion<Duration> {
        let inner = self.inner.lock();
        if !inner.state.allows_reads() {
            return Completion::rejected(ReadError::NotOpen);
        }
        let ttl = inner.ttls.get(key).map_or(Duration::ZERO, |entry| entry.ttl);
        Completion::resolved(ttl)
    }

    // == Remove TTL ==
    /// Cancels a key's countdown, keeping its value.
    ///
    /// Removing the last TTL of an ending cache closes it.
    pub fn remove_ttl(&self, key: &str) -> Completion<bool> {
        let mut inner = self.inner.lock();
        if !inner.state.allows_removals() {
            return Completion::rejected(WriteError::NotOpen);
        }
        Completion::resolved(self.remove_ttl_locked(&mut inner, key))
    }

    fn remove_ttl_locked(&self, inner: &mut CacheInner, key: &str) -> bool {
        if inner.ttls.remove(key).is_none() {
            return false;
        }
        if lifecycle::drain_complete(inner.state, inner.ttls.len()) {
            info!("Last TTL drained, closing cache");
            self.close(inner);
        }
        true
    }

    // == Exists TTL ==
    pub fn exists_ttl(&self, key: &str) -> Completion<bool> {
        let inner = self.inner.lock();
        if !inner.state.allows_reads() {
            return Completion::rejected(ReadError::NotOpen);
        }
        Completion::resolved(inner.ttls.contains(key))
    }

    // == Keys ==
    /// Snapshot of all keys in insertion order.
    pub fn keys(&self) -> Completion<Vec<String>> {
        let inner = self.inner.lock();
        if !inner.state.allows_reads() {
            return Completion::rejected(ReadError::NotOpen);
        }
        Completion::resolved(inner.store.keys())
    }

    // == Stats ==
    pub fn stats(&self) -> Completion<CacheStats> {
        let inner = self.inner.lock();
        if !inner.state.allows_reads() {
            return Completion::rejected(ReadError::NotOpen);
        }

        let mut stats = inner.stats.clone();
        stats.keys = inner.store.len();
        stats.ttl_keys = inner.ttls.len();
        stats.key_bytes = inner.store.key_bytes();
        stats.value_bytes = inner.store.value_bytes();
        Completion::resolved(stats)
    }

    // == Flush ==
    /// Drops every value and TTL. The lifecycle state is unchanged.
    pub fn flush(&self) -> Completion<()> {
        let mut inner = self.inner.lock();
        if !inner.state.allows_writes() {
            return Completion::rejected(WriteError::NotOpen);
        }

        let flushed = inner.store.len();
        inner.store.clear();
        inner.ttls.clear();
        info!("Cache flushed, {} key(s) dropped", flushed);
        Completion::resolved(())
    }
}

impl fmt::Debug for Cache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("Cache")
            .field("state", &inner.state)
            .field("keys", &inner.store.len())
            .field("ttl_keys", &inner.ttls.len())
            .field("paused", &inner.timer.is_none())
            .finish()
    }
}

impl PartialEq for Cache {
    /// Handles are equal when they refer to the same cache.
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Cache {}

// == Weak Cache ==
/// Non-owning handle to a cache, carried as the payload of lifecycle events.
#[derive(Clone)]
pub struct WeakCache {
    inner: Weak<Mutex<CacheInner>>,
}

impl WeakCache {
    /// Returns the cache if any strong handle is still alive.
    pub fn upgrade(&self) -> Option<Cache> {
        Cache::from_weak(&self.inner)
    }

    /// True if this handle refers to `cache`.
    pub fn refers_to(&self, cache: &Cache) -> bool {
        Weak::ptr_eq(&self.inner, &Arc::downgrade(&cache.inner))
    }
}

impl fmt::Debug for WeakCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakCache")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

impl PartialEq for WeakCache {
    fn eq(&self, other: &Self) -> bool {
        Weak::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for WeakCache {}
