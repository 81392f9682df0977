//! Fixed-interval action runner with signal-driven shutdown.

pub mod action;
pub mod config;
pub mod lifecycle;
pub mod observability;
pub mod scheduler;

pub use action::{Action, ActionError, ActionFailurePolicy, LogAction};
pub use config::{Interval, RunnerConfig};
pub use lifecycle::{CancelFlag, CancelSource, ExitStatus, Reason, SignalGate, StopCause, Termination};
pub use scheduler::{IntervalRunner, ManualClock, TokioClock};
