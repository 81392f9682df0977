//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! runner / signal gate / startup produce:
//!     → logging.rs (tracing events → stdout lines)
//!     → metrics.rs (counters)
//!
//! Consumers:
//!     → terminal or log shipper (stdout)
//!     → Prometheus scrape (optional)
//! ```

pub mod logging;
pub mod metrics;
