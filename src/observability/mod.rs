//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Request ID flows through every pipeline log line
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;

pub use metrics::{InMemoryMetrics, Metric, MetricsSink, PrometheusMetrics};
