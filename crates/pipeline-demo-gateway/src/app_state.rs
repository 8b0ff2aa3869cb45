//! Shared application state.
//!
//! The metrics registry is built here, explicitly, and handed to handlers and
//! the middleware through axum state. Startup errors (duplicate or invalid
//! metric families) are returned, not panicked on.

use std::sync::Arc;
use std::time::{Duration, Instant};

use pipeline_demo_core::error::Result;
use pipeline_demo_core::metrics::{ProcessCollector, Registry};

use crate::config::ServiceConfig;
use crate::obs::{HttpMetrics, RuntimeCollector};

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
    registry: Arc<Registry>,
    http_metrics: Arc<HttpMetrics>,
}

struct AppStateInner {
    cfg: ServiceConfig,
    started_at: Instant,
}

impl AppState {
    /// Build application state and its metrics registry.
    pub fn new(cfg: ServiceConfig) -> Result<Self> {
        let started_at = Instant::now();
        let mut registry = Registry::new();

        // 1) Default process/runtime collectors
        if cfg.metrics.collect_default_metrics {
            registry.register(Arc::new(ProcessCollector::new()?))?;
            registry.register(Arc::new(RuntimeCollector::new()))?;
        }

        // 2) HTTP instruments
        let http_metrics = HttpMetrics::register(&mut registry, &cfg.metrics.duration_buckets)?;

        tracing::info!(families = registry.len(), "metrics registry ready");

        Ok(Self {
            inner: Arc::new(AppStateInner { cfg, started_at }),
            registry: Arc::new(registry),
            http_metrics: Arc::new(http_metrics),
        })
    }

    pub fn cfg(&self) -> &ServiceConfig {
        &self.inner.cfg
    }

    pub fn registry(&self) -> Arc<Registry> {
        Arc::clone(&self.registry)
    }

    pub fn http_metrics(&self) -> Arc<HttpMetrics> {
        Arc::clone(&self.http_metrics)
    }

    /// Time since the state was built, i.e. since process startup.
    pub fn uptime(&self) -> Duration {
        self.inner.started_at.elapsed()
    }
}
