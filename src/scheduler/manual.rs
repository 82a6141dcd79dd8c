//! Manual Loop
//!
//! A deterministic `EventLoop` whose timers fire only when the host calls
//! `tick`. Every registered timer fires once per tick regardless of its
//! interval, so one tick stands for one tick interval of the cache.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::debug;

use super::{EventLoop, ReadyCallback, TickCallback, TimerId};

#[derive(Default)]
struct ManualState {
    running: bool,
    ready: Vec<ReadyCallback>,
    timers: BTreeMap<TimerId, (Duration, TickCallback)>,
    next_id: u64,
}

// == Manual Loop ==
/// Host-driven scheduler, mainly for tests and embedding in foreign loops.
#[derive(Default)]
pub struct ManualLoop {
    state: Mutex<ManualState>,
}

impl ManualLoop {
    /// Creates a loop that already reports itself running.
    pub fn new() -> Arc<Self> {
        let event_loop = Self::default();
        event_loop.state.lock().running = true;
        Arc::new(event_loop)
    }

    /// Creates a loop that is not running until `run` is called.
    pub fn idle() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Marks the loop as running and fires queued `on_start` callbacks.
    pub fn run(&self) {
        let ready = {
            let mut state = self.state.lock();
            state.running = true;
            std::mem::take(&mut state.ready)
        };
        for callback in ready {
            callback();
        }
    }

    /// Fires every registered timer once.
    pub fn tick(&self) {
        let due: Vec<(TimerId, TickCallback)> = self
            .state
            .lock()
            .timers
            .iter()
            .map(|(id, (_, callback))| (*id, callback.clone()))
            .collect();

        for (id, callback) in due {
            // An earlier callback in this tick may have cancelled this timer.
            if self.state.lock().timers.contains_key(&id) {
                callback();
            }
        }
    }

    /// Fires every registered timer `ticks` times.
    pub fn advance(&self, ticks: usize) {
        for _ in 0..ticks {
            self.tick();
        }
    }

    /// Number of live periodic timers.
    pub fn active_timers(&self) -> usize {
        self.state.lock().timers.len()
    }

    /// Interval of a live timer, if registered.
    pub fn interval_of(&self, id: TimerId) -> Option<Duration> {
        self.state.lock().timers.get(&id).map(|(interval, _)| *interval)
    }
}

impl EventLoop for ManualLoop {
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

    fn add_periodic_timer(&self, interval: Duration, callback: TickCallback) -> TimerId {
        let mut state = self.state.lock();
        state.next_id += 1;
        let id = TimerId(state.next_id);
        state.timers.insert(id, (interval, callback));
        debug!(timer = id.0, ?interval, "Manual timer registered");
        id
    }

    fn cancel_timer(&self, id: TimerId) {
        if self.state.lock().timers.remove(&id).is_some() {
            debug!(timer = id.0, "Manual timer cancelled");
        }
    }
}
