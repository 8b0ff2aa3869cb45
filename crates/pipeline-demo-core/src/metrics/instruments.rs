//! Labelled counter, gauge, and histogram instruments.
//!
//! Each instrument owns a `DashMap` keyed by label values (in declaration
//! order) with atomics as values, so mutation never blocks on a global lock.
//! Series are created lazily on first use; unlabelled instruments start with a
//! single zero series so they are always visible to scrapers.

use dashmap::DashMap;
use std::fmt::{self, Write};
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

use crate::error::{PipelineError, Result};
use crate::metrics::registry::Collector;

/// Default histogram buckets (seconds), tuned for HTTP request latencies.
pub const DEFAULT_BUCKETS: [f64; 11] = [
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

/// Metric family names: `[a-zA-Z_:][a-zA-Z0-9_:]*`.
pub fn valid_metric_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == ':' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
}

/// Label names: `[a-zA-Z_][a-zA-Z0-9_]*`, with `__` reserved.
pub fn valid_label_name(name: &str) -> bool {
    if name.starts_with("__") {
        return false;
    }
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Helper to escape label values.
fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

/// HELP text escapes only backslash and newline.
pub(crate) fn escape_help(v: &str) -> String {
    v.replace('\\', "\\\\").replace('\n', "\\n")
}

/// Float formatting used for `le` bounds and sums.
pub(crate) fn format_float(v: f64) -> String {
    if v == f64::INFINITY {
        "+Inf".to_string()
    } else if v == f64::NEG_INFINITY {
        "-Inf".to_string()
    } else if v.is_nan() {
        "NaN".to_string()
    } else {
        format!("{v}")
    }
}

/// Name, help, and label names shared by every instrument kind.
#[derive(Debug)]
struct Desc {
    name: String,
    help: String,
    label_names: Vec<String>,
}

impl Desc {
    fn new(name: &str, help: &str, label_names: &[&str]) -> Result<Self> {
        if !valid_metric_name(name) {
            return Err(PipelineError::InvalidMetric(format!(
                "invalid metric name: {name:?}"
            )));
        }
        for (i, l) in label_names.iter().enumerate() {
            if !valid_label_name(l) {
                return Err(PipelineError::InvalidMetric(format!(
                    "{name}: invalid label name {l:?}"
                )));
            }
            if label_names.iter().take(i).any(|prev| prev == l) {
                return Err(PipelineError::InvalidMetric(format!(
                    "{name}: duplicate label name {l:?}"
                )));
            }
        }
        Ok(Self {
            name: name.to_string(),
            help: help.to_string(),
            label_names: label_names.iter().map(|l| l.to_string()).collect(),
        })
    }

    /// Build a series key, rejecting a wrong number of values.
    fn key(&self, values: &[&str]) -> Result<Vec<String>> {
        if values.len() != self.label_names.len() {
            return Err(PipelineError::LabelCardinality {
                metric: self.name.clone(),
                expected: self.label_names.len(),
                got: values.len(),
            });
        }
        Ok(values.iter().map(|v| v.to_string()).collect())
    }

    /// `k1="v1",k2="v2"` in declaration order.
    fn label_pairs(&self, values: &[String]) -> String {
        self.label_names
            .iter()
            .zip(values)
            .map(|(k, v)| format!("{}=\"{}\"", k, escape_label(v)))
            .collect::<Vec<_>>()
            .join(",")
    }

    fn write_header(&self, kind: &str, out: &mut String) -> fmt::Result {
        writeln!(out, "# HELP {} {}", self.name, escape_help(&self.help))?;
        writeln!(out, "# TYPE {} {}", self.name, kind)
    }
}

/// `name` or `name{labels}`.
fn series_name(name: &str, labels: &str) -> String {
    if labels.is_empty() {
        name.to_string()
    } else {
        format!("{name}{{{labels}}}")
    }
}

/// Snapshot a map's keys/values and sort by label values for stable output.
fn sorted_rows<V, T>(map: &DashMap<Vec<String>, V>, read: impl Fn(&V) -> T) -> Vec<(Vec<String>, T)> {
    let mut rows: Vec<(Vec<String>, T)> = map
        .iter()
        .map(|r| (r.key().clone(), read(r.value())))
        .collect();
    rows.sort_by(|a, b| a.0.cmp(&b.0));
    rows
}

#[derive(Debug)]
pub struct CounterVec {
    desc: Desc,
    map: DashMap<Vec<String>, AtomicU64>,
}

impl CounterVec {
    pub fn new(name: &str, help: &str, label_names: &[&str]) -> Result<Self> {
        let desc = Desc::new(name, help, label_names)?;
        let map = DashMap::new();
        if desc.label_names.is_empty() {
            map.insert(Vec::new(), AtomicU64::new(0));
        }
        Ok(Self { desc, map })
    }

    pub fn name(&self) -> &str {
        &self.desc.name
    }

    /// Increment by 1.
    pub fn inc(&self, values: &[&str]) -> Result<()> {
        self.inc_by(values, 1)
    }

    /// Increment by an arbitrary value.
    pub fn inc_by(&self, values: &[&str], v: u64) -> Result<()> {
        let key = self.desc.key(values)?;
        let counter = self.map.entry(key).or_insert_with(|| AtomicU64::new(0));
        counter.fetch_add(v, Ordering::Relaxed);
        Ok(())
    }

    /// Current value of a series, `None` if it was never touched.
    pub fn get(&self, values: &[&str]) -> Option<u64> {
        let key = self.desc.key(values).ok()?;
        self.map.get(&key).map(|c| c.load(Ordering::Relaxed))
    }
}

impl Collector for CounterVec {
    fn family_names(&self) -> Vec<&str> {
        vec![self.desc.name.as_str()]
    }

    fn encode(&self, out: &mut String) -> fmt::Result {
        self.desc.write_header("counter", out)?;
        for (key, val) in sorted_rows(&self.map, |c| c.load(Ordering::Relaxed)) {
            let labels = self.desc.label_pairs(&key);
            writeln!(out, "{} {}", series_name(&self.desc.name, &labels), val)?;
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct GaugeVec {
    desc: Desc,
    map: DashMap<Vec<String>, AtomicI64>,
}

impl GaugeVec {
    pub fn new(name: &str, help: &str, label_names: &[&str]) -> Result<Self> {
        let desc = Desc::new(name, help, label_names)?;
        let map = DashMap::new();
        if desc.label_names.is_empty() {
            map.insert(Vec::new(), AtomicI64::new(0));
        }
        Ok(Self { desc, map })
    }

    pub fn name(&self) -> &str {
        &self.desc.name
    }

    /// Increment by 1.
    pub fn inc(&self, values: &[&str]) -> Result<()> {
        self.add(values, 1)
    }

    /// Decrement by 1.
    pub fn dec(&self, values: &[&str]) -> Result<()> {
        self.add(values, -1)
    }

    /// Add an arbitrary signed delta.
    pub fn add(&self, values: &[&str], v: i64) -> Result<()> {
        let key = self.desc.key(values)?;
        let gauge = self.map.entry(key).or_insert_with(|| AtomicI64::new(0));
        gauge.fetch_add(v, Ordering::Relaxed);
        Ok(())
    }

    pub fn set(&self, values: &[&str], v: i64) -> Result<()> {
        let key = self.desc.key(values)?;
        let gauge = self.map.entry(key).or_insert_with(|| AtomicI64::new(0));
        gauge.store(v, Ordering::Relaxed);
        Ok(())
    }

    pub fn get(&self, values: &[&str]) -> Option<i64> {
        let key = self.desc.key(values).ok()?;
        self.map.get(&key).map(|g| g.load(Ordering::Relaxed))
    }
}

impl Collector for GaugeVec {
    fn family_names(&self) -> Vec<&str> {
        vec![self.desc.name.as_str()]
    }

    fn encode(&self, out: &mut String) -> fmt::Result {
        self.desc.write_header("gauge", out)?;
        for (key, val) in sorted_rows(&self.map, |g| g.load(Ordering::Relaxed)) {
            let labels = self.desc.label_pairs(&key);
            writeln!(out, "{} {}", series_name(&self.desc.name, &labels), val)?;
        }
        Ok(())
    }
}

#[derive(Debug)]
struct HistogramSeries {
    count: AtomicU64,
    /// `f64` sum stored as raw bits.
    sum_bits: AtomicU64,
    /// Cumulative: bucket `i` counts observations `<= bounds[i]`.
    buckets: Box<[AtomicU64]>,
}

impl HistogramSeries {
    fn new(len: usize) -> Self {
        Self {
            count: AtomicU64::new(0),
            sum_bits: AtomicU64::new(0f64.to_bits()),
            buckets: (0..len).map(|_| AtomicU64::new(0)).collect(),
        }
    }

    fn sum(&self) -> f64 {
        f64::from_bits(self.sum_bits.load(Ordering::Acquire))
    }

    // Count first, buckets last; `encode` reads in the opposite order so a
    // concurrent scrape never sees a bucket above `+Inf`.
    fn observe(&self, bounds: &[f64], v: f64) {
        self.count.fetch_add(1, Ordering::AcqRel);
        let _ = self
            .sum_bits
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |bits| {
                Some((f64::from_bits(bits) + v).to_bits())
            });
        for (bound, bucket) in bounds.iter().zip(self.buckets.iter()) {
            if v <= *bound {
                bucket.fetch_add(1, Ordering::AcqRel);
            }
        }
    }
}

#[derive(Debug)]
pub struct HistogramVec {
    desc: Desc,
    bounds: Vec<f64>,
    map: DashMap<Vec<String>, HistogramSeries>,
}

impl HistogramVec {
    /// Create a histogram; `buckets` must be non-empty, finite, and strictly
    /// increasing. `+Inf` is implicit.
    pub fn new(name: &str, help: &str, label_names: &[&str], buckets: &[f64]) -> Result<Self> {
        let desc = Desc::new(name, help, label_names)?;
        if desc.label_names.iter().any(|l| l == "le") {
            return Err(PipelineError::InvalidMetric(format!(
                "{name}: label name \"le\" is reserved for histograms"
            )));
        }
        validate_buckets(buckets).map_err(|e| PipelineError::InvalidMetric(format!("{name}: {e}")))?;

        let map = DashMap::new();
        if desc.label_names.is_empty() {
            map.insert(Vec::new(), HistogramSeries::new(buckets.len()));
        }
        Ok(Self {
            desc,
            bounds: buckets.to_vec(),
            map,
        })
    }

    pub fn name(&self) -> &str {
        &self.desc.name
    }

    pub fn buckets(&self) -> &[f64] {
        &self.bounds
    }

    /// Record one observation.
    pub fn observe(&self, values: &[&str], v: f64) -> Result<()> {
        let key = self.desc.key(values)?;
        let series = self
            .map
            .entry(key)
            .or_insert_with(|| HistogramSeries::new(self.bounds.len()));
        series.observe(&self.bounds, v);
        Ok(())
    }

    pub fn sample_count(&self, values: &[&str]) -> Option<u64> {
        let key = self.desc.key(values).ok()?;
        self.map.get(&key).map(|s| s.count.load(Ordering::Acquire))
    }

    pub fn sample_sum(&self, values: &[&str]) -> Option<f64> {
        let key = self.desc.key(values).ok()?;
        self.map.get(&key).map(|s| s.sum())
    }
}

/// Shared bucket layout check, also used by config validation.
pub fn validate_buckets(buckets: &[f64]) -> std::result::Result<(), String> {
    if buckets.is_empty() {
        return Err("buckets must not be empty".into());
    }
    if buckets.iter().any(|b| !b.is_finite()) {
        return Err("buckets must be finite (+Inf is implicit)".into());
    }
    if buckets.windows(2).any(|w| matches!(w, [a, b] if a >= b)) {
        return Err("buckets must be strictly increasing".into());
    }
    Ok(())
}

struct HistogramRow {
    buckets: Vec<u64>,
    sum: f64,
    count: u64,
}

impl Collector for HistogramVec {
    fn family_names(&self) -> Vec<&str> {
        vec![self.desc.name.as_str()]
    }

    fn encode(&self, out: &mut String) -> fmt::Result {
        self.desc.write_header("histogram", out)?;
        let rows = sorted_rows(&self.map, |s| {
            let buckets = s.buckets.iter().map(|b| b.load(Ordering::Acquire)).collect();
            let sum = s.sum();
            let count = s.count.load(Ordering::Acquire);
            HistogramRow { buckets, sum, count }
        });

        let name = &self.desc.name;
        for (key, row) in rows {
            let labels = self.desc.label_pairs(&key);
            let prefix = if labels.is_empty() {
                String::new()
            } else {
                format!("{labels},")
            };

            for (le, n) in self.bounds.iter().zip(&row.buckets) {
                writeln!(out, "{}_bucket{{{}le=\"{}\"}} {}", name, prefix, format_float(*le), n)?;
            }
            writeln!(out, "{}_bucket{{{}le=\"+Inf\"}} {}", name, prefix, row.count)?;
            writeln!(out, "{} {}", series_name(&format!("{name}_sum"), &labels), format_float(row.sum))?;
            writeln!(out, "{} {}", series_name(&format!("{name}_count"), &labels), row.count)?;
        }
        Ok(())
    }
}
