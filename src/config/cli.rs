//! Command-line parsing into a validated [`RunnerConfig`].

use std::net::SocketAddr;

use clap::Parser;
use thiserror::Error;

use crate::action::ActionFailurePolicy;
use crate::config::schema::{Interval, LogConfig, LogFormat, RunnerConfig};
use crate::config::validation::{positive_seconds, validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Parser)]
#[command(name = "intervald")]
#[command(about = "Run an action on a fixed sub-minute interval until signalled", long_about = None)]
pub struct Cli {
    /// Seconds between ticks (fractional values allowed)
    #[arg(short, long, env = "INTERVALD_INTERVAL", default_value_t = 10.0)]
    pub interval: f64,

    /// Longest single sleep in seconds; bounds how long a signal can go unnoticed
    #[arg(long, default_value_t = 0.5)]
    pub slice: f64,

    /// Stop cleanly after this many ticks
    #[arg(long)]
    pub max_ticks: Option<u64>,

    /// What to do when the action fails
    #[arg(long, value_enum, default_value_t = ActionFailurePolicy::Continue)]
    pub on_action_error: ActionFailurePolicy,

    /// Log line layout
    #[arg(long, value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, env = "INTERVALD_LOG", default_value = "info")]
    pub log_level: String,

    /// Serve Prometheus metrics on this address
    #[arg(long)]
    pub metrics_address: Option<SocketAddr>,
}

impl Cli {
    /// Turn raw arguments into a validated configuration.
    pub fn into_config(self) -> Result<RunnerConfig, ConfigError> {
        let interval = Interval::new(self.interval);
        let slice_bound = positive_seconds("slice", self.slice);

        let (interval, slice_bound) = match (interval, slice_bound) {
            (Ok(interval), Ok(slice_bound)) => (interval, slice_bound),
            (interval, slice_bound) => {
                let errors = interval.err().into_iter().chain(slice_bound.err()).collect();
                return Err(ConfigError::Validation(errors));
            }
        };

        let config = RunnerConfig {
            interval,
            slice_bound,
            max_ticks: self.max_ticks,
            on_action_error: self.on_action_error,
            log: LogConfig {
                format: self.log_format,
                level: self.log_level,
            },
            metrics_address: self.metrics_address,
        };

        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }
}
