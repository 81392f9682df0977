//! The interval run loop.
//!
//! # Responsibilities
//! - Invoke the action once per tick
//! - Skip (never replay) intervals missed because of an overrun
//! - Sleep in bounded slices, checking for cancellation before each one
//! - Run cleanup and report a [`Termination`]; the process exit is left to
//!   the caller
//!
//! # Design Decisions
//! - Single cooperative task: the only asynchronous input is the
//!   cancellation flag, read at slice boundaries
//! - An in-flight action is never interrupted; cancellation latency is
//!   bounded by one slice only while sleeping

use std::time::Duration;

use crate::action::{Action, ActionFailurePolicy};
use crate::config::{Interval, RunnerConfig};
use crate::lifecycle::shutdown::{StopCause, Termination};
use crate::lifecycle::signals::CancelSource;
use crate::observability::metrics;
use crate::scheduler::clock::Clock;
use crate::scheduler::schedule::Schedule;

/// Default upper bound on a single sleep.
pub const DEFAULT_SLICE_BOUND: Duration = Duration::from_millis(500);

/// Outcome of one loop step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Continue,
    Terminate(StopCause),
}

/// Runs an [`Action`] on a fixed interval until cancelled.
#[derive(Debug, Clone)]
pub struct IntervalRunner<C> {
    clock: C,
    interval: Interval,
    slice_bound: Duration,
    max_ticks: Option<u64>,
    on_action_error: ActionFailurePolicy,
}

struct Progress {
    schedule: Schedule,
    ticks: u64,
    skipped: u64,
}

impl<C: Clock> IntervalRunner<C> {
    pub fn new(clock: C, interval: Interval) -> Self {
        Self {
            clock,
            interval,
            slice_bound: DEFAULT_SLICE_BOUND,
            max_ticks: None,
            on_action_error: ActionFailurePolicy::default(),
        }
    }

    pub fn from_config(clock: C, config: &RunnerConfig) -> Self {
        Self::new(clock, config.interval)
            .with_slice_bound(config.slice_bound)
            .with_max_ticks(config.max_ticks)
            .with_failure_policy(config.on_action_error)
    }

    /// Longest single sleep. Zero is treated as the default.
    pub fn with_slice_bound(mut self, slice_bound: Duration) -> Self {
        self.slice_bound = if slice_bound.is_zero() {
            DEFAULT_SLICE_BOUND
        } else {
            slice_bound
        };
        self
    }

    /// Stop cleanly after `max_ticks` actions.
    pub fn with_max_ticks(mut self, max_ticks: Option<u64>) -> Self {
        self.max_ticks = max_ticks;
        self
    }

    pub fn with_failure_policy(mut self, policy: ActionFailurePolicy) -> Self {
        self.on_action_error = policy;
        self
    }

    /// Run until cancelled (or until the tick limit), then clean up.
    pub async fn run<A, S>(&self, action: &mut A, cancel: &S) -> Termination
    where
        A: Action + ?Sized,
        S: CancelSource + ?Sized,
    {
        tracing::info!(
            interval = %self.interval,
            slice_ms = self.slice_bound.as_millis() as u64,
            max_ticks = ?self.max_ticks,
            "Start."
        );

        let mut progress = Progress {
            schedule: Schedule::new(self.clock.now(), self.interval),
            ticks: 0,
            skipped: 0,
        };

        let cause = loop {
            match self.step(&mut progress, action, cancel).await {
                Step::Continue => continue,
                Step::Terminate(cause) => break cause,
            }
        };

        let termination = Termination {
            cause,
            ticks: progress.ticks,
            skipped: progress.skipped,
        };
        self.cleanup(action, &termination);
        termination
    }

    async fn step<A, S>(&self, progress: &mut Progress, action: &mut A, cancel: &S) -> Step
    where
        A: Action + ?Sized,
        S: CancelSource + ?Sized,
    {
        if let Some(reason) = cancel.requested_reason() {
            return Step::Terminate(StopCause::Signal(reason));
        }

        progress.ticks += 1;
        metrics::record_tick();
        if let Err(e) = action.perform() {
            metrics::record_action_failure();
            match self.on_action_error {
                ActionFailurePolicy::Continue => {
                    tracing::error!(tick = progress.ticks, error = %e, "Action failed");
                }
                ActionFailurePolicy::Exit => {
                    tracing::error!(tick = progress.ticks, error = %e, "Action failed, stopping");
                    return Step::Terminate(StopCause::ActionFailed);
                }
            }
        }

        if self.max_ticks.is_some_and(|max| progress.ticks >= max) {
            return Step::Terminate(StopCause::TickLimit);
        }

        let advance = progress.schedule.advance_past(self.clock.now());
        if advance.skipped > 0 {
            // Either the action or a late wake-up can get us here.
            tracing::debug!(
                tick = progress.ticks,
                skipped = advance.skipped,
                "Target time already passed, skipping missed ticks"
            );
            metrics::record_skipped(advance.skipped);
            progress.skipped += advance.skipped;
        }

        self.sleep_until_target(&progress.schedule, cancel).await
    }

    async fn sleep_until_target<S>(&self, schedule: &Schedule, cancel: &S) -> Step
    where
        S: CancelSource + ?Sized,
    {
        loop {
            if let Some(reason) = cancel.requested_reason() {
                return Step::Terminate(StopCause::Signal(reason));
            }

            let now = self.clock.now();
            if now >= schedule.target() {
                return Step::Continue;
            }

            let wake = schedule.next_wake(now, self.slice_bound);
            self.clock.sleep_until(wake).await;
        }
    }

    fn cleanup<A>(&self, action: &mut A, termination: &Termination)
    where
        A: Action + ?Sized,
    {
        if let StopCause::Signal(reason) = termination.cause {
            metrics::record_cancellation(reason);
        }

        tracing::info!(
            cause = ?termination.cause,
            ticks = termination.ticks,
            skipped = termination.skipped,
            "Cleaning up!"
        );
        action.teardown();
        tracing::info!(exit_status = %termination.exit_status(), "Done.");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::ActionError;
    use crate::lifecycle::signals::{CancelFlag, Reason};
    use crate::observability::logging::{plain_layer, CaptureWriter};
    use crate::scheduler::clock::ManualClock;

    fn secs(s: f64) -> Duration {
        Duration::from_secs_f64(s)
    }

    #[tokio::test]
    async fn test_cancelled_before_start_runs_nothing() {
        let flag = CancelFlag::new();
        flag.request(Reason::Interrupt);

        let mut calls = 0;
        let mut action = || -> Result<(), ActionError> {
            calls += 1;
            Ok(())
        };

        let runner = IntervalRunner::new(ManualClock::new(), Interval::new(1.0).unwrap());
        let termination = runner.run(&mut action, &flag).await;

        assert_eq!(termination.cause, StopCause::Signal(Reason::Interrupt));
        assert_eq!(termination.ticks, 0);
        assert_eq!(calls, 0);
    }

    #[tokio::test]
    async fn test_tick_limit_stops_with_success() {
        let clock = ManualClock::new();
        let runner = IntervalRunner::new(clock.clone(), Interval::new(1.0).unwrap())
            .with_max_ticks(Some(4));

        let mut action = || -> Result<(), ActionError> { Ok(()) };
        let termination = runner.run(&mut action, &CancelFlag::new()).await;

        assert_eq!(termination.cause, StopCause::TickLimit);
        assert_eq!(termination.ticks, 4);
        assert!(termination.exit_status().is_success());
        // Last tick at 3.0; no sleep after it.
        assert_eq!(clock.now(), secs(3.0));
    }

    #[tokio::test]
    async fn test_sleep_is_sliced() {
        let clock = ManualClock::new();
        let runner = IntervalRunner::new(clock.clone(), Interval::new(2.0).unwrap())
            .with_slice_bound(Duration::from_millis(500))
            .with_max_ticks(Some(2));

        let mut action = || -> Result<(), ActionError> { Ok(()) };
        runner.run(&mut action, &CancelFlag::new()).await;

        assert_eq!(
            clock.wakes(),
            vec![secs(0.5), secs(1.0), secs(1.5), secs(2.0)]
        );
    }

    #[tokio::test]
    async fn test_failure_policy_continue() {
        let clock = ManualClock::new();
        let runner = IntervalRunner::new(clock.clone(), Interval::new(1.0).unwrap())
            .with_max_ticks(Some(3));

        let mut action = || -> Result<(), ActionError> { Err(ActionError::Failed("boom".into())) };
        let termination = runner.run(&mut action, &CancelFlag::new()).await;

        assert_eq!(termination.cause, StopCause::TickLimit);
        assert_eq!(termination.ticks, 3);
    }

    #[tokio::test]
    async fn test_failure_policy_exit() {
        let clock = ManualClock::new();
        let runner = IntervalRunner::new(clock.clone(), Interval::new(1.0).unwrap())
            .with_failure_policy(ActionFailurePolicy::Exit);

        let mut calls = 0;
        let mut action = || -> Result<(), ActionError> {
            calls += 1;
            if calls == 2 {
                return Err(ActionError::Failed("boom".into()));
            }
            Ok(())
        };
        let termination = runner.run(&mut action, &CancelFlag::new()).await;

        assert_eq!(termination.cause, StopCause::ActionFailed);
        assert_eq!(termination.ticks, 2);
        assert_eq!(termination.exit_status().code(), 1);
    }

    #[tokio::test]
    async fn test_skipped_ticks_are_not_warnings() {
        use tracing_subscriber::layer::SubscriberExt;

        let capture = CaptureWriter::default();
        let subscriber = tracing_subscriber::registry().with(plain_layer(capture.clone()));
        let _guard = tracing::subscriber::set_default(subscriber);

        let clock = ManualClock::new();
        let runner = IntervalRunner::new(clock.clone(), Interval::new(1.0).unwrap())
            .with_max_ticks(Some(2));

        let overrun = clock.clone();
        let mut action = move || -> Result<(), ActionError> {
            overrun.advance(secs(2.5));
            Ok(())
        };
        let termination = runner.run(&mut action, &CancelFlag::new()).await;

        assert_eq!(termination.skipped, 2);
        let output = capture.contents();
        assert!(output.contains("skipping missed ticks"), "{output}");
        assert!(!output.contains("### WARNING: "), "{output}");
    }

    #[test]
    fn test_zero_slice_falls_back_to_default() {
        let runner = IntervalRunner::new(ManualClock::new(), Interval::new(1.0).unwrap())
            .with_slice_bound(Duration::ZERO);
        assert_eq!(runner.slice_bound, DEFAULT_SLICE_BOUND);
    }
}
