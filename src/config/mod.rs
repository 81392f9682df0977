//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! command line / environment
//!     → cli.rs (parse with clap)
//!     → validation.rs (semantic checks)
//!     → RunnerConfig (validated, immutable)
//!     → handed by value to startup and the runner
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no reload path
//! - No configuration files: a single interval plus a few knobs
//! - Validation separates syntactic (clap) from semantic checks

pub mod cli;
pub mod schema;
pub mod validation;

pub use cli::{Cli, ConfigError};
pub use schema::{Interval, LogConfig, LogFormat, RunnerConfig};
pub use validation::{validate_config, ValidationError};
