//! Configuration schema definitions.
//!
//! This module defines the complete set of startup parameters for the runner.
//! Every value is fixed once the process has started; there is no reload path.

use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

use crate::action::ActionFailurePolicy;
use crate::config::validation::{positive_seconds, ValidationError};

/// Root configuration for the interval runner.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Spacing between consecutive ticks.
    pub interval: Interval,

    /// Upper bound on a single sleep slice (cancellation latency).
    pub slice_bound: Duration,

    /// Stop cleanly after this many ticks (exit code 0).
    pub max_ticks: Option<u64>,

    /// What to do when the action reports a failure.
    pub on_action_error: ActionFailurePolicy,

    /// Logging settings.
    pub log: LogConfig,

    /// Prometheus exporter bind address, if metrics should be exposed.
    pub metrics_address: Option<SocketAddr>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            interval: Interval::default(),
            slice_bound: Duration::from_millis(500),
            max_ticks: None,
            on_action_error: ActionFailurePolicy::default(),
            log: LogConfig::default(),
            metrics_address: None,
        }
    }
}

/// A strictly positive, finite tick spacing.
///
/// Stored as a [`Duration`] so schedule arithmetic happens in integer
/// nanoseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Interval(Duration);

impl Interval {
    /// Build an interval from fractional seconds.
    pub fn new(seconds: f64) -> Result<Self, ValidationError> {
        positive_seconds("interval", seconds).map(Self)
    }

    /// Build an interval from a duration; zero is rejected.
    pub fn from_duration(duration: Duration) -> Result<Self, ValidationError> {
        if duration.is_zero() {
            return Err(ValidationError::ZeroDuration { field: "interval" });
        }
        Ok(Self(duration))
    }

    pub fn as_duration(&self) -> Duration {
        self.0
    }
}

impl Default for Interval {
    fn default() -> Self {
        Self(Duration::from_secs(10))
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.0.as_secs_f64())
    }
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Output layout.
    pub format: LogFormat,

    /// Filter directive used when `RUST_LOG` is not set (e.g. "info").
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Plain,
            level: "info".to_string(),
        }
    }
}

/// Log line layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum LogFormat {
    /// `<prefix><timestamp> <message>` lines.
    #[default]
    Plain,
    /// One JSON object per line.
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_accepts_fractions() {
        let interval = Interval::new(0.25).unwrap();
        assert_eq!(interval.as_duration(), Duration::from_millis(250));
        assert_eq!(interval.to_string(), "0.25s");
    }

    #[test]
    fn test_interval_rejects_non_positive() {
        assert!(Interval::new(0.0).is_err());
        assert!(Interval::new(-1.0).is_err());
        assert!(Interval::new(f64::NAN).is_err());
        assert!(Interval::new(f64::INFINITY).is_err());
        assert!(Interval::from_duration(Duration::ZERO).is_err());
    }

    #[test]
    fn test_defaults() {
        let config = RunnerConfig::default();
        assert_eq!(config.interval.as_duration(), Duration::from_secs(10));
        assert_eq!(config.slice_bound, Duration::from_millis(500));
        assert_eq!(config.max_ticks, None);
        assert_eq!(config.log.format, LogFormat::Plain);
    }
}
