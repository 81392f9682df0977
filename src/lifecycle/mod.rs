//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Install signal gate → Start metrics exporter → hand gate to runner
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGQUIT/SIGINT → CancelFlag (first wins)
//!     SIGHUP/SIGUSR1/SIGUSR2 → logged, ignored
//!
//! Shutdown (shutdown.rs):
//!     Runner returns Termination → ExitStatus → main exits
//! ```
//!
//! # Design Decisions
//! - The cancellation cell is an explicit value, shared by the gate and the
//!   runner; there is no global state
//! - Only `main` terminates the process

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::{ExitStatus, StopCause, Termination};
pub use signals::{CancelFlag, CancelSource, Delivery, Reason, SetupError, SignalGate};
pub use startup::{bootstrap, StartupError};
