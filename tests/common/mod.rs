//! Shared fakes for integration tests.

use std::time::Duration;

use intervald::action::{Action, ActionError};
use intervald::scheduler::{Clock, ManualClock};

/// Records the simulated time of every invocation and runs a per-call hook.
///
/// The hook receives the 1-based invocation number; use it to advance the
/// clock (simulated run time) or deliver signals.
pub struct RecordingAction {
    clock: ManualClock,
    hook: Box<dyn FnMut(u64)>,
    pub calls: Vec<Duration>,
    pub torn_down: bool,
}

impl RecordingAction {
    pub fn new(clock: &ManualClock, hook: impl FnMut(u64) + 'static) -> Self {
        Self {
            clock: clock.clone(),
            hook: Box::new(hook),
            calls: Vec::new(),
            torn_down: false,
        }
    }
}

impl Action for RecordingAction {
    fn perform(&mut self) -> Result<(), ActionError> {
        self.calls.push(self.clock.now());
        (self.hook)(self.calls.len() as u64);
        Ok(())
    }

    fn teardown(&mut self) {
        self.torn_down = true;
    }
}

pub fn secs(s: f64) -> Duration {
    Duration::from_secs_f64(s)
}
