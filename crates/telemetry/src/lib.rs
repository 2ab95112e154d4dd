//! # Tally Telemetry Crate
//!
//! Process-wide observability for the service: the Prometheus metrics
//! registry and the `tracing` subscriber setup.
//!
//! The registry is an ordinary value. `main` builds exactly one, wraps it in
//! an `Arc`, and hands clones to the HTTP middleware and the store gateway.
//! Nothing here is a global.
//!
//! ## Public API
//!
//! - `Metrics`: request counters, request latency histograms and the store
//!   latency histogram, plus text exposition rendering.
//! - `init_tracing`: installs the global `tracing` subscriber.

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::TelemetryError;
pub use logging::init_tracing;
pub use metrics::{LATENCY_BUCKETS_SECONDS, Metrics, PROMETHEUS_CONTENT_TYPE};
