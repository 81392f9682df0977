//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation of startup parameters (clap handles syntax)
//! - Validate value ranges (interval > 0, slice > 0, tick limit >= 1)
//! - Reject log filters that the subscriber would not accept
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RunnerConfig → Result<(), Vec<ValidationError>>
//! - Runs before the signal gate is installed

use std::time::Duration;

use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::config::schema::RunnerConfig;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Negative, NaN, infinite or too large to represent.
    #[error("{field} must be a finite, positive number of seconds (got {value})")]
    InvalidSeconds { field: &'static str, value: f64 },

    /// Rounds down to zero nanoseconds.
    #[error("{field} must be greater than zero")]
    ZeroDuration { field: &'static str },

    #[error("max ticks must be at least 1")]
    ZeroTickLimit,

    #[error("invalid log filter {filter:?}: {reason}")]
    InvalidLogFilter { filter: String, reason: String },
}

/// Convert fractional seconds into a non-zero [`Duration`].
pub fn positive_seconds(field: &'static str, value: f64) -> Result<Duration, ValidationError> {
    let duration = Duration::try_from_secs_f64(value)
        .map_err(|_| ValidationError::InvalidSeconds { field, value })?;
    if duration.is_zero() {
        return Err(ValidationError::ZeroDuration { field });
    }
    Ok(duration)
}

/// Check a configuration for semantic errors.
pub fn validate_config(config: &RunnerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.interval.as_duration().is_zero() {
        errors.push(ValidationError::ZeroDuration { field: "interval" });
    }

    if config.slice_bound.is_zero() {
        errors.push(ValidationError::ZeroDuration { field: "slice" });
    }

    if config.max_ticks == Some(0) {
        errors.push(ValidationError::ZeroTickLimit);
    }

    if let Err(e) = EnvFilter::try_new(&config.log.level) {
        errors.push(ValidationError::InvalidLogFilter {
            filter: config.log.level.clone(),
            reason: e.to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positive_seconds() {
        assert_eq!(positive_seconds("slice", 0.5).unwrap(), Duration::from_millis(500));
        assert_eq!(
            positive_seconds("slice", -0.5),
            Err(ValidationError::InvalidSeconds { field: "slice", value: -0.5 })
        );
        assert_eq!(
            positive_seconds("slice", 1e-12),
            Err(ValidationError::ZeroDuration { field: "slice" })
        );
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&RunnerConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = RunnerConfig::default();
        config.slice_bound = Duration::ZERO;
        config.max_ticks = Some(0);
        config.log.level = "intervald=notalevel".to_string();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert_eq!(errors[0], ValidationError::ZeroDuration { field: "slice" });
        assert_eq!(errors[1], ValidationError::ZeroTickLimit);
        assert!(matches!(errors[2], ValidationError::InvalidLogFilter { .. }));
    }
}
