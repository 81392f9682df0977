//! The action collaborator.
//!
//! # Responsibilities
//! - Define what the runner invokes once per tick
//! - Give the action a teardown hook for the cleanup path
//! - Provide the placeholder action used by the binary
//!
//! # Design Decisions
//! - Failures are reported as `Result`, and the runner applies an
//!   [`ActionFailurePolicy`] to them; panics are not caught
//! - Invocations are never cancelled once started

use thiserror::Error;

/// Failure reported by an action invocation.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("action failed: {0}")]
    Failed(String),
}

/// How the runner reacts to an [`ActionError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ActionFailurePolicy {
    /// Log the error and keep the schedule.
    #[default]
    Continue,
    /// Stop the loop and go through cleanup with a non-zero exit code.
    Exit,
}

/// Work performed on every tick.
pub trait Action {
    /// Run one tick's worth of work.
    fn perform(&mut self) -> Result<(), ActionError>;

    /// Release resources before the process exits.
    fn teardown(&mut self) {}
}

impl<F> Action for F
where
    F: FnMut() -> Result<(), ActionError>,
{
    fn perform(&mut self) -> Result<(), ActionError> {
        self()
    }
}

/// Placeholder action: logs a line per tick.
#[derive(Debug, Default)]
pub struct LogAction {
    invocations: u64,
}

impl LogAction {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of times [`Action::perform`] has run.
    pub fn invocations(&self) -> u64 {
        self.invocations
    }
}

impl Action for LogAction {
    fn perform(&mut self) -> Result<(), ActionError> {
        self.invocations += 1;
        tracing::info!(invocation = self.invocations, "Action!");
        Ok(())
    }

    fn teardown(&mut self) {
        tracing::debug!(invocations = self.invocations, "Action torn down");
    }
}
