use std::sync::Arc;
use std::time::Duration;

use pipeline_demo_core::error::Result;
use pipeline_demo_core::metrics::{CounterVec, GaugeVec, HistogramVec, Registry};

/// Label names shared by the request counter and the duration histogram.
pub const HTTP_LABELS: [&str; 3] = ["method", "route", "status_code"];

/// HTTP request instruments, registered once at startup.
///
/// Cloning the handles out of the registry keeps recording free of any
/// registry lookup.
#[derive(Debug)]
pub struct HttpMetrics {
    requests_total: Arc<CounterVec>,
    request_duration: Arc<HistogramVec>,
    active_connections: Arc<GaugeVec>,
}

impl HttpMetrics {
    pub fn register(registry: &mut Registry, buckets: &[f64]) -> Result<Self> {
        let requests_total = registry.counter(
            "http_requests_total",
            "Total number of HTTP requests",
            &HTTP_LABELS,
        )?;
        let request_duration = registry.histogram(
            "http_request_duration_seconds",
            "Duration of HTTP requests in seconds",
            &HTTP_LABELS,
            buckets,
        )?;
        let active_connections = registry.gauge(
            "active_connections",
            "Number of active connections",
            &[],
        )?;

        Ok(Self {
            requests_total,
            request_duration,
            active_connections,
        })
    }

    pub fn requests_total(&self) -> &CounterVec {
        &self.requests_total
    }

    pub fn request_duration(&self) -> &HistogramVec {
        &self.request_duration
    }

    pub fn active_connections(&self) -> &GaugeVec {
        &self.active_connections
    }

    pub(crate) fn request_started(&self) {
        if let Err(e) = self.active_connections.inc(&[]) {
            tracing::error!(error = %e, "active_connections inc failed");
        }
    }

    /// Counter and histogram first, gauge last.
    pub(crate) fn request_finished(&self, method: &str, route: &str, status: u16, elapsed: Duration) {
        let status = status.to_string();
        let labels = [method, route, status.as_str()];

        if let Err(e) = self.requests_total.inc(&labels) {
            tracing::error!(error = %e, "http_requests_total inc failed");
        }
        if let Err(e) = self.request_duration.observe(&labels, elapsed.as_secs_f64()) {
            tracing::error!(error = %e, "http_request_duration_seconds observe failed");
        }
        if let Err(e) = self.active_connections.dec(&[]) {
            tracing::error!(error = %e, "active_connections dec failed");
        }
    }
}
