//! Time sources for the runner.
//!
//! Timestamps are [`Duration`]s measured from the clock's own origin, so the
//! scheduler never touches wall-clock time and cannot be moved backwards by a
//! system clock adjustment.

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

/// Monotonic time plus the ability to wait for a point in it.
pub trait Clock {
    /// Time elapsed since the clock's origin.
    fn now(&self) -> Duration;

    /// Complete once `now() >= deadline`. Waking late is allowed.
    fn sleep_until(&self, deadline: Duration) -> impl Future<Output = ()> + Send;
}

/// Real time, backed by Tokio's timer.
///
/// Under a paused Tokio runtime this follows virtual time.
#[derive(Debug, Clone, Copy)]
pub struct TokioClock {
    origin: Instant,
}

impl TokioClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for TokioClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for TokioClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn sleep_until(&self, deadline: Duration) -> impl Future<Output = ()> + Send {
        tokio::time::sleep_until(self.origin + deadline)
    }
}

/// Simulated time that only moves when told to.
///
/// `sleep_until` jumps straight to its deadline; actions can call
/// [`ManualClock::advance`] to simulate their own run time. Clones share the
/// same timeline.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    inner: Arc<Mutex<ManualState>>,
}

#[derive(Debug, Default)]
struct ManualState {
    now: Duration,
    wakes: Vec<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the timeline at `now` instead of zero.
    pub fn starting_at(now: Duration) -> Self {
        let clock = Self::default();
        clock.state().now = now;
        clock
    }

    /// Move time forward by `by`.
    pub fn advance(&self, by: Duration) {
        let mut state = self.state();
        state.now += by;
    }

    /// Every deadline passed to `sleep_until`, in call order.
    pub fn wakes(&self) -> Vec<Duration> {
        self.state().wakes.clone()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, ManualState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.state().now
    }

    fn sleep_until(&self, deadline: Duration) -> impl Future<Output = ()> + Send {
        {
            let mut state = self.state();
            state.now = state.now.max(deadline);
            state.wakes.push(deadline);
        }
        // Give other tasks (e.g. a test delivering a signal) a chance to run.
        tokio::task::yield_now()
    }
}
