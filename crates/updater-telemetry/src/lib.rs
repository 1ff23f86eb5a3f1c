//! Prometheus metrics and structured logging for the drand oracle updater.
//!
//! - `RelayMetrics`: per-service registry with round gauges, submission
//!   counters and the sender balance
//! - `serve_metrics`: `/metrics` and `/health` over axum
//! - `init_logging`: tracing subscriber setup

pub mod error;
pub mod logging;
pub mod metrics;
pub mod server;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::init_logging;
pub use metrics::{MetricLabels, RelayMetrics};
pub use server::{metrics_router, serve_metrics, serve_on};
