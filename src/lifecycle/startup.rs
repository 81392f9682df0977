//! Startup orchestration.
//!
//! # Responsibilities
//! - Install the signal gate before anything else can run
//! - Start the optional metrics exporter
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - A process that cannot be cancelled must not start scheduling

use std::net::SocketAddr;

use metrics_exporter_prometheus::BuildError;
use thiserror::Error;

use crate::config::RunnerConfig;
use crate::lifecycle::signals::{CancelFlag, SetupError, SignalGate};
use crate::observability::metrics;

/// Errors that abort startup.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Signals(#[from] SetupError),

    #[error("could not start metrics exporter on {addr}: {source}")]
    Metrics {
        addr: SocketAddr,
        #[source]
        source: BuildError,
    },
}

/// Bring up the process-level collaborators for `config`.
pub fn bootstrap(config: &RunnerConfig) -> Result<SignalGate, StartupError> {
    let gate = SignalGate::install(CancelFlag::new())?;

    if let Some(addr) = config.metrics_address {
        metrics::init_metrics(addr).map_err(|source| StartupError::Metrics { addr, source })?;
        tracing::info!(address = %addr, "Metrics exporter listening");
    }

    Ok(gate)
}
