//! Tokio Loop
//!
//! `EventLoop` backed by a tokio runtime. Each periodic timer is a spawned
//! task sleeping on an interval; cancelling a timer aborts its task.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

use super::{EventLoop, ReadyCallback, TickCallback, TimerId};
use crate::config::MIN_TICK_INTERVAL;

#[derive(Default)]
struct LoopState {
    running: bool,
    ready: Vec<ReadyCallback>,
    timers: HashMap<TimerId, JoinHandle<()>>,
    next_id: u64,
}

// == Tokio Loop ==
/// Scheduler spawning periodic timers onto a tokio runtime.
///
/// The loop only reports itself running after `mark_running` has been
/// called, which is the host's signal that its run loop is live.
pub struct TokioLoop {
    handle: Handle,
    state: Mutex<LoopState>,
}

impl TokioLoop {
    /// Creates a loop bound to the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime context.
    pub fn current() -> Arc<Self> {
        Self::with_handle(Handle::current())
    }

    /// Creates a loop spawning its timers on `handle`.
    pub fn with_handle(handle: Handle) -> Arc<Self> {
        Arc::new(Self {
            handle,
            state: Mutex::new(LoopState::default()),
        })
    }

    /// Reports the loop as running and fires queued `on_start` callbacks.
    pub fn mark_running(&self) {
        let ready = {
            let mut state = self.state.lock();
            if state.running {
                return;
            }
            state.running = true;
            std::mem::take(&mut state.ready)
        };

        info!("Event loop running, {} start callback(s) queued", ready.len());
        for callback in ready {
            callback();
        }
    }

    /// Number of live periodic timers.
    pub fn active_timers(&self) -> usize {
        self.state.lock().timers.len()
    }
}

impl EventLoop for TokioLoop {
    fn is_running(&self) -> bool {
        self.state.lock().running
    }

    fn on_start(&self, callback: ReadyCallback) {
        let mut state = self.state.lock();
        if state.running {
            drop(state);
            callback();
        } else {
            state.ready.push(callback);
        }
    }

    fn add_periodic_timer(&self, period: Duration, callback: TickCallback) -> TimerId {
        // `interval_at` panics on a zero period
        let period = period.max(MIN_TICK_INTERVAL);
        let task = self.handle.spawn(async move {
            // First tick lands one period from now, not immediately.
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                callback();
            }
        });

        let mut state = self.state.lock();
        state.next_id += 1;
        let id = TimerId(state.next_id);
        state.timers.insert(id, task);
        debug!(timer = id.0, ?period, "Periodic timer started");
        id
    }

    fn cancel_timer(&self, id: TimerId) {
        if let Some(task) = self.state.lock().timers.remove(&id) {
            task.abort();
            debug!(timer = id.0, "Periodic timer aborted");
        }
    }
}

impl Drop for TokioLoop {
    fn drop(&mut self) {
        for (_, task) in self.state.get_mut().timers.drain() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_periodic_timer_fires() {
        let event_loop = TokioLoop::current();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();

        let id = event_loop.add_periodic_timer(
            Duration::from_millis(20),
            Arc::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );

        tokio::time::sleep(Duration::from_millis(130)).await;
        event_loop.cancel_timer(id);

        assert!(hits.load(Ordering::SeqCst) >= 3, "Timer should have fired repeatedly");
        assert_eq!(event_loop.active_timers(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_timer_stops_firing() {
        let event_loop = TokioLoop::current();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();

        let id = event_loop.add_periodic_timer(
            Duration::from_millis(20),
            Arc::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );
        event_loop.cancel_timer(id);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_zero_period_timer_still_fires() {
        let event_loop = TokioLoop::current();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();

        let id = event_loop.add_periodic_timer(
            Duration::ZERO,
            Arc::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );

        tokio::time::sleep(Duration::from_millis(50)).await;
        event_loop.cancel_timer(id);

        assert!(hits.load(Ordering::SeqCst) >= 1, "Timer task should not have died");
    }

    #[tokio::test]
    async fn test_on_start_waits_for_mark_running() {
        let event_loop = TokioLoop::current();
        let hits = Arc::new(AtomicUsize::new(0));

        let counter = hits.clone();
        event_loop.on_start(Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        assert!(!event_loop.is_running());
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        event_loop.mark_running();
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        // Registered after the loop runs: fires immediately
        let counter = hits.clone();
        event_loop.on_start(Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }
}
