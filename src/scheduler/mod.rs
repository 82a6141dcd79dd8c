//! Scheduler Module
//!
//! The cache never owns a run loop; it borrows periodic timers and a
//! one-shot "loop is running" hook from an `EventLoop` implementation.
//!
//! # Implementations
//! - `TokioLoop`: periodic timers as tokio tasks
//! - `ManualLoop`: ticks delivered on demand by the host

mod manual;
mod tokio_loop;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

pub use manual::ManualLoop;
pub use tokio_loop::TokioLoop;

/// Callback invoked on every tick of a periodic timer.
pub type TickCallback = Arc<dyn Fn() + Send + Sync>;

/// Callback invoked once when the loop reports itself running.
pub type ReadyCallback = Box<dyn FnOnce() + Send>;

// == Timer Id ==
/// Identifies a periodic timer registered with an `EventLoop`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(pub u64);

// == Event Loop ==
/// External scheduler the cache binds its tick handler to.
///
/// Implementations must never invoke a callback while holding a lock that
/// `add_periodic_timer` or `cancel_timer` would need.
pub trait EventLoop: Send + Sync {
    /// Whether the loop is already running and able to drive timers.
    fn is_running(&self) -> bool;

    /// Registers a callback to run once the loop starts running.
    fn on_start(&self, callback: ReadyCallback);

    /// Registers `callback` to be invoked every `interval`.
    fn add_periodic_timer(&self, interval: Duration, callback: TickCallback) -> TimerId;

    /// Cancels a periodic timer. Unknown ids are ignored.
    fn cancel_timer(&self, id: TimerId);
}

// == Timer Subscription ==
/// Owned registration of a periodic timer, cancelled when dropped.
pub struct TimerSubscription {
    event_loop: Arc<dyn EventLoop>,
    id: TimerId,
}

impl TimerSubscription {
    pub fn new(event_loop: Arc<dyn EventLoop>, interval: Duration, callback: TickCallback) -> Self {
        let id = event_loop.add_periodic_timer(interval, callback);
        Self { event_loop, id }
    }

    pub fn id(&self) -> TimerId {
        self.id
    }
}

impl Drop for TimerSubscription {
    fn drop(&mut self) {
        self.event_loop.cancel_timer(self.id);
    }
}

impl fmt::Debug for TimerSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerSubscription").field("id", &self.id).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_subscription_cancels_on_drop() {
        let event_loop = ManualLoop::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();

        let subscription = TimerSubscription::new(
            event_loop.clone(),
            Duration::from_millis(100),
            Arc::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );
        assert_eq!(event_loop.active_timers(), 1);

        event_loop.tick();
        drop(subscription);
        event_loop.tick();

        assert_eq!(event_loop.active_timers(), 0);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
