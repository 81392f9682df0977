//! Metrics collection and exposition.
//!
//! # Metrics
//! - `intervald_ticks_total` (counter): action invocations
//! - `intervald_skipped_intervals_total` (counter): intervals dropped by catch-up
//! - `intervald_action_failures_total` (counter): actions that returned an error
//! - `intervald_cancellations_total` (counter): cancellations by reason
//!
//! # Design Decisions
//! - Recording is always on; without an installed recorder it is a no-op
//! - The Prometheus exporter is opt-in (`--metrics-address`)

use std::net::SocketAddr;

use metrics::{counter, describe_counter};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::lifecycle::signals::Reason;

/// Install the Prometheus recorder and serve it on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;

    describe_counter!("intervald_ticks_total", "Action invocations");
    describe_counter!(
        "intervald_skipped_intervals_total",
        "Intervals skipped because the action or a sleep overran"
    );
    describe_counter!("intervald_action_failures_total", "Action invocations that failed");
    describe_counter!("intervald_cancellations_total", "Cancellation requests by reason");
    Ok(())
}

pub fn record_tick() {
    counter!("intervald_ticks_total").increment(1);
}

pub fn record_skipped(intervals: u64) {
    counter!("intervald_skipped_intervals_total").increment(intervals);
}

pub fn record_action_failure() {
    counter!("intervald_action_failures_total").increment(1);
}

pub fn record_cancellation(reason: Reason) {
    counter!("intervald_cancellations_total", "reason" => reason.to_string()).increment(1);
}
