//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define gateway counters and their label sets
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `inbound_requests_total` (counter): every routed request, by host and method
//! - `proxy_requests_total` (counter): every proxied request, by app, host, target, public
//!
//! # Design Decisions
//! - Low-overhead metric updates (atomic operations)
//! - Sinks are fire-and-forget; recording never fails a request

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Mutex, PoisonError};

use metrics_exporter_prometheus::PrometheusBuilder;

/// Counters recorded by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    /// One per inbound request. Labels: `host`, `method`.
    InboundRequest,
    /// One per proxy delegation. Labels: `app`, `host`, `target`, `public`.
    ProxyRequest,
}

impl Metric {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::InboundRequest => "InboundRequest",
            Self::ProxyRequest => "ProxyRequest",
        }
    }

    /// Name under which the counter is exported.
    pub const fn export_name(&self) -> &'static str {
        match self {
            Self::InboundRequest => "inbound_requests_total",
            Self::ProxyRequest => "proxy_requests_total",
        }
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub type Labels = Vec<(&'static str, String)>;

/// Destination for gateway counters.
pub trait MetricsSink: Send + Sync + std::fmt::Debug {
    fn increment(&self, metric: Metric, labels: &[(&'static str, String)]);
}

/// Records counters through the `metrics` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct PrometheusMetrics;

impl MetricsSink for PrometheusMetrics {
    fn increment(&self, metric: Metric, labels: &[(&'static str, String)]) {
        let labels: Vec<metrics::Label> = labels
            .iter()
            .map(|(key, value)| metrics::Label::new(*key, value.clone()))
            .collect();
        metrics::counter!(metric.export_name(), labels).increment(1);
    }
}

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Counters kept in process memory.
#[derive(Debug, Default)]
pub struct InMemoryMetrics {
    counters: Mutex<HashMap<(Metric, Labels), u64>>,
}

impl InMemoryMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count for an exact label set.
    pub fn count(&self, metric: Metric, labels: &[(&'static str, String)]) -> u64 {
        let counters = self.counters.lock().unwrap_or_else(PoisonError::into_inner);
        counters
            .get(&(metric, labels.to_vec()))
            .copied()
            .unwrap_or(0)
    }

    /// Count summed over all label sets.
    pub fn total(&self, metric: Metric) -> u64 {
        let counters = self.counters.lock().unwrap_or_else(PoisonError::into_inner);
        counters
            .iter()
            .filter(|((m, _), _)| *m == metric)
            .map(|(_, count)| *count)
            .sum()
    }
}

impl MetricsSink for InMemoryMetrics {
    fn increment(&self, metric: Metric, labels: &[(&'static str, String)]) {
        let mut counters = self.counters.lock().unwrap_or_else(PoisonError::into_inner);
        *counters.entry((metric, labels.to_vec())).or_insert(0) += 1;
    }
}
