//! intervald
//!
//! Runs an action on a fixed interval that may be shorter than a minute,
//! until the process receives SIGTERM, SIGQUIT or SIGINT.
//!
//! # Architecture Overview
//!
//! ```text
//!     command line ──▶ config ──▶ logging ──▶ lifecycle::bootstrap
//!                                                  │
//!                                                  ▼
//!     OS signals ──▶ SignalGate ──▶ CancelFlag ◀── IntervalRunner ──▶ Action
//!                                                  │
//!                                                  ▼
//!                                     Termination ──▶ exit status
//! ```
//!
//! Overruns skip intervals instead of queueing them; the long-run tick rate
//! matches the configured interval without drift.

use std::process;

use clap::Parser;

use intervald::config::{Cli, LogConfig};
use intervald::lifecycle::{bootstrap, ExitStatus};
use intervald::observability::logging;
use intervald::scheduler::{IntervalRunner, TokioClock};
use intervald::LogAction;

#[tokio::main]
async fn main() {
    let config = match Cli::parse().into_config() {
        Ok(config) => config,
        Err(e) => {
            let _ = logging::init(&LogConfig::default());
            logging::fatal(&e);
            process::exit(ExitStatus::FAILURE.code());
        }
    };

    if let Err(e) = logging::init(&config.log) {
        eprintln!("intervald: {e}");
        process::exit(ExitStatus::FAILURE.code());
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        interval = %config.interval,
        "intervald starting"
    );

    let gate = match bootstrap(&config) {
        Ok(gate) => gate,
        Err(e) => {
            logging::fatal(&e);
            process::exit(ExitStatus::FAILURE.code());
        }
    };

    let runner = IntervalRunner::from_config(TokioClock::new(), &config);
    let mut action = LogAction::new();
    let termination = runner.run(&mut action, &gate).await;

    drop(gate);
    process::exit(termination.exit_status().code());
}
