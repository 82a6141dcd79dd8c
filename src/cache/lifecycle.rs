//! Lifecycle Module
//!
//! The Closed / Open / Ending state machine and the waiters parked on a
//! graceful end. Transitions are decided here as plain functions so the
//! engine can consult one table instead of scattering flag checks.

use serde::Serialize;

use crate::completion::{Completion, Resolver};
use crate::config::ShutdownMode;

// == Lifecycle State ==
/// Service state of a cache instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    /// Not serving; the initial state, and restartable
    #[default]
    Closed,
    /// Serving reads and writes
    Open,
    /// Refusing new work while remaining TTLs drain
    Ending,
}

impl LifecycleState {
    /// Open or draining.
    pub fn is_started(self) -> bool {
        !matches!(self, LifecycleState::Closed)
    }

    pub fn allows_reads(self) -> bool {
        matches!(self, LifecycleState::Open)
    }

    pub fn allows_writes(self) -> bool {
        matches!(self, LifecycleState::Open)
    }

    /// Removals stay available while ending so the drain can progress.
    pub fn allows_removals(self) -> bool {
        self.is_started()
    }
}

// == End Plan ==
/// Outcome of an `end()` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndPlan {
    /// Nothing to do
    AlreadyClosed,
    /// Stop right away
    StopNow,
    /// Enter (or stay in) the ending state and wait for the drain
    Drain,
}

/// Decides what `end()` does from the current state.
pub fn plan_end(state: LifecycleState, active_ttls: usize, mode: ShutdownMode) -> EndPlan {
    match (state, mode) {
        (LifecycleState::Closed, _) => EndPlan::AlreadyClosed,
        (_, ShutdownMode::Immediate) => EndPlan::StopNow,
        (_, ShutdownMode::Drain) if active_ttls == 0 => EndPlan::StopNow,
        (_, ShutdownMode::Drain) => EndPlan::Drain,
    }
}

/// True once the last TTL of an ending cache is gone.
pub fn drain_complete(state: LifecycleState, active_ttls: usize) -> bool {
    state == LifecycleState::Ending && active_ttls == 0
}

// == Pending End Waiters ==
/// Handles returned by `end()` calls that are waiting for the drain.
#[derive(Debug)]
pub struct PendingEndWaiters<T> {
    waiters: Vec<Resolver<T>>,
}

impl<T> Default for PendingEndWaiters<T> {
    fn default() -> Self {
        Self {
            waiters: Vec::new(),
        }
    }
}

impl<T: Clone> PendingEndWaiters<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parks a new waiter and returns its handle.
    pub fn park(&mut self) -> Completion<T> {
        let (resolver, completion) = Completion::pending();
        self.waiters.push(resolver);
        completion
    }

    /// Resolves every waiter with `value`, oldest first, and empties the list.
    pub fn resolve_all(&mut self, value: &T) -> usize {
        let count = self.waiters.len();
        for waiter in self.waiters.drain(..) {
            waiter.resolve(value.clone());
        }
        count
    }

    pub fn len(&self) -> usize {
        self.waiters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waiters.is_empty()
    }
}
