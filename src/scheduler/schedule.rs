//! Drift-free target-time arithmetic.
//!
//! # Invariants
//! - `target = origin + index * interval`, computed in integer nanoseconds
//!   from the tick index, never by accumulating additions
//! - `index` only grows, so the target never moves backwards
//! - Catch-up lands on the first grid point at or after `now`; the skipped
//!   grid points are counted, never replayed

use std::time::Duration;

use crate::config::Interval;

const NANOS_PER_SEC: u128 = 1_000_000_000;

/// The grid of target times for one run.
#[derive(Debug, Clone)]
pub struct Schedule {
    origin: Duration,
    interval: Interval,
    index: u64,
}

/// Result of one catch-up step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Advance {
    /// The new target time.
    pub target: Duration,
    /// Grid points passed over without a tick.
    pub skipped: u64,
}

impl Schedule {
    /// A schedule whose first target is `origin` itself.
    pub fn new(origin: Duration, interval: Interval) -> Self {
        Self {
            origin,
            interval,
            index: 0,
        }
    }

    /// The current target time.
    pub fn target(&self) -> Duration {
        self.at(self.index)
    }

    /// Number of grid steps taken since the origin.
    pub fn index(&self) -> u64 {
        self.index
    }

    /// Step the target forward at least once, and keep stepping until it is
    /// no earlier than `now`.
    pub fn advance_past(&mut self, now: Duration) -> Advance {
        let next = self.index.saturating_add(1);
        let step = self.interval.as_duration().as_nanos();
        let elapsed = now.saturating_sub(self.origin).as_nanos();
        // Smallest k with origin + k * interval >= now.
        let reached = u64::try_from(elapsed.div_ceil(step)).unwrap_or(u64::MAX);

        let index = next.max(reached);
        let skipped = index - next;
        self.index = index;

        Advance {
            target: self.target(),
            skipped,
        }
    }

    /// When to wake next: the target, or one slice from `now` if sooner.
    pub fn next_wake(&self, now: Duration, slice_bound: Duration) -> Duration {
        self.target().min(now.saturating_add(slice_bound))
    }

    fn at(&self, index: u64) -> Duration {
        let offset = self.interval.as_duration().as_nanos() * u128::from(index);
        from_nanos(self.origin.as_nanos().saturating_add(offset))
    }
}

fn from_nanos(nanos: u128) -> Duration {
    let secs = u64::try_from(nanos / NANOS_PER_SEC).unwrap_or(u64::MAX);
    let subsec = (nanos % NANOS_PER_SEC) as u32;
    Duration::new(secs, subsec)
}
