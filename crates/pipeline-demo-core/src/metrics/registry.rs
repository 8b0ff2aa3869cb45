//! Metric registry and text exposition.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::error::{PipelineError, Result};
use crate::metrics::instruments::{valid_metric_name, CounterVec, GaugeVec, HistogramVec};

/// Anything that can emit one or more metric families.
pub trait Collector: Send + Sync {
    /// Family names this collector emits. Each must be unique in a registry.
    fn family_names(&self) -> Vec<&str>;

    /// Append `# HELP`, `# TYPE`, and sample lines for every family.
    fn encode(&self, out: &mut String) -> fmt::Result;
}

/// Owns every collector of the process and renders them on demand.
///
/// Registration needs `&mut self`, so it happens while the registry is still
/// being assembled at startup; afterwards it is shared behind an `Arc` and
/// only read.
#[derive(Default)]
pub struct Registry {
    collectors: Vec<Arc<dyn Collector>>,
    names: HashSet<String>,
}

impl Registry {
    /// Content type of [`Registry::render`] output.
    pub const CONTENT_TYPE: &'static str = "text/plain; version=0.0.4; charset=utf-8";

    pub fn new() -> Self {
        Self::default()
    }

    /// Add a collector. Fails without side effects if any of its family names
    /// is invalid or already taken.
    pub fn register(&mut self, collector: Arc<dyn Collector>) -> Result<()> {
        let names = collector.family_names();
        let mut incoming: HashSet<&str> = HashSet::with_capacity(names.len());
        for name in &names {
            if !valid_metric_name(name) {
                return Err(PipelineError::InvalidMetric(format!(
                    "invalid metric name: {name:?}"
                )));
            }
            if self.names.contains(*name) || !incoming.insert(*name) {
                return Err(PipelineError::DuplicateMetric((*name).to_string()));
            }
        }

        self.names.extend(names.iter().map(|n| n.to_string()));
        self.collectors.push(collector);
        Ok(())
    }

    /// Create and register a counter.
    pub fn counter(&mut self, name: &str, help: &str, labels: &[&str]) -> Result<Arc<CounterVec>> {
        let c = Arc::new(CounterVec::new(name, help, labels)?);
        self.register(c.clone())?;
        Ok(c)
    }

    /// Create and register a gauge.
    pub fn gauge(&mut self, name: &str, help: &str, labels: &[&str]) -> Result<Arc<GaugeVec>> {
        let g = Arc::new(GaugeVec::new(name, help, labels)?);
        self.register(g.clone())?;
        Ok(g)
    }

    /// Create and register a histogram.
    pub fn histogram(
        &mut self,
        name: &str,
        help: &str,
        labels: &[&str],
        buckets: &[f64],
    ) -> Result<Arc<HistogramVec>> {
        let h = Arc::new(HistogramVec::new(name, help, labels, buckets)?);
        self.register(h.clone())?;
        Ok(h)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Number of registered families.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Render every collector in registration order.
    pub fn render(&self) -> Result<String> {
        let mut out = String::with_capacity(4096);
        for c in &self.collectors {
            c.encode(&mut out)?;
        }
        Ok(out)
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("families", &self.names.len())
            .finish()
    }
}
