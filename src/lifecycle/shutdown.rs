//! Shutdown outcome and exit-code policy.
//!
//! # Exit Codes
//! ```text
//! TickLimit          → 0
//! Signal(Terminate)  → 143
//! Signal(Quit)       → 256 + SIGQUIT, low 8 bits kept (3 on POSIX)
//! Signal(Interrupt)  → 256 + SIGINT,  low 8 bits kept (2 on POSIX)
//! ActionFailed       → 1
//! ```
//!
//! The quit/interrupt encoding produces values above 255; hosts only keep the
//! low byte of an exit status, so [`ExitStatus::code`] applies that truncation
//! explicitly while [`ExitStatus::raw`] keeps the untruncated value for logs.

use std::fmt;

use crate::lifecycle::signals::Reason;

/// Exit status reported for a graceful terminate request.
pub const TERMINATE_EXIT_CODE: i32 = 143;

/// Offset added to the signal number for quit and interrupt.
pub const SIGNAL_EXIT_OFFSET: i32 = 256;

/// Why the run loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopCause {
    /// A recognized cancellation signal arrived.
    Signal(Reason),
    /// The configured number of ticks completed.
    TickLimit,
    /// The action failed under [`ActionFailurePolicy::Exit`](crate::action::ActionFailurePolicy::Exit).
    ActionFailed,
}

/// Summary returned by the runner after cleanup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Termination {
    pub cause: StopCause,
    /// Actions invoked.
    pub ticks: u64,
    /// Intervals skipped by catch-up.
    pub skipped: u64,
}

impl Termination {
    pub fn exit_status(&self) -> ExitStatus {
        ExitStatus::from(self.cause)
    }
}

/// Process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitStatus {
    raw: i32,
}

impl ExitStatus {
    pub const SUCCESS: ExitStatus = ExitStatus { raw: 0 };
    pub const FAILURE: ExitStatus = ExitStatus { raw: 1 };

    /// Untruncated status as computed by the policy.
    pub fn raw(&self) -> i32 {
        self.raw
    }

    /// Status the host will actually report.
    pub fn code(&self) -> i32 {
        self.raw & 0xFF
    }

    pub fn is_success(&self) -> bool {
        self.code() == 0
    }
}

impl From<Reason> for ExitStatus {
    fn from(reason: Reason) -> Self {
        match reason {
            Reason::Terminate => ExitStatus {
                raw: TERMINATE_EXIT_CODE,
            },
            Reason::Quit | Reason::Interrupt => ExitStatus {
                raw: SIGNAL_EXIT_OFFSET + reason.signal_number(),
            },
        }
    }
}

impl From<StopCause> for ExitStatus {
    fn from(cause: StopCause) -> Self {
        match cause {
            StopCause::Signal(reason) => reason.into(),
            StopCause::TickLimit => ExitStatus::SUCCESS,
            StopCause::ActionFailed => ExitStatus::FAILURE,
        }
    }
}

impl fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.raw == self.code() {
            write!(f, "{}", self.raw)
        } else {
            write!(f, "{} (raw {})", self.code(), self.raw)
        }
    }
}
