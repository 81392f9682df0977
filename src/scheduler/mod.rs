//! Interval scheduling subsystem.
//!
//! # Data Flow
//! ```text
//! runner.rs:
//!     target := now
//!     loop:
//!         cancelled? → cleanup → Termination
//!         action()
//!         schedule.rs: advance target past now (skip missed slots)
//!         sleep in slices (clock.rs) until target, checking cancellation
//! ```
//!
//! # Design Decisions
//! - Targets derive from the tick index, so rounding never accumulates
//! - Overruns skip intervals instead of queueing them
//! - Time is injected through [`Clock`], so the loop runs against simulated
//!   time in tests

pub mod clock;
pub mod runner;
pub mod schedule;

pub use clock::{Clock, ManualClock, TokioClock};
pub use runner::{IntervalRunner, Step, DEFAULT_SLICE_BOUND};
pub use schedule::{Advance, Schedule};
