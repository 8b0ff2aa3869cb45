//! In-process metrics with Prometheus text exposition.
//!
//! Instruments are plain atomics behind `DashMap` shards, so recording from
//! many tasks at once never takes a global lock. A [`Registry`] owns every
//! collector and renders them for the `/metrics` scrape.
//!
//! ```ignore
//! let mut registry = Registry::new();
//! registry.register(Arc::new(ProcessCollector::new()?))?;
//! let hits = registry.counter("hits_total", "Hits.", &["route"])?;
//! hits.inc(&["/"])?;
//! let body = registry.render()?;
//! ```

pub mod instruments;
pub mod process;
pub mod registry;

pub use instruments::{CounterVec, GaugeVec, HistogramVec, DEFAULT_BUCKETS};
pub use process::ProcessCollector;
pub use registry::{Collector, Registry};
