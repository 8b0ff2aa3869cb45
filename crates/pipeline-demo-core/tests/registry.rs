//! Registry registration and exposition tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::fs;
use std::sync::Arc;

use pipeline_demo_core::metrics::{CounterVec, ProcessCollector, Registry};

const HTTP_LABELS: [&str; 3] = ["method", "route", "status_code"];

fn load(name: &str) -> String {
    fs::read_to_string(format!("tests/vectors/{name}")).unwrap()
}

#[test]
fn render_matches_vector() {
    let mut registry = Registry::new();
    let requests = registry
        .counter("http_requests_total", "Total number of HTTP requests", &HTTP_LABELS)
        .unwrap();
    let latency = registry
        .histogram("request_seconds", "Request latency.", &["route"], &[0.1, 0.5, 1.0])
        .unwrap();
    let active = registry
        .gauge("active_connections", "Number of active connections", &[])
        .unwrap();

    // Inserted out of order on purpose; output is sorted by label values.
    requests.inc(&["POST", "/", "404"]).unwrap();
    requests.inc(&["GET", "/health", "200"]).unwrap();
    requests.inc(&["GET", "/", "200"]).unwrap();
    requests.inc(&["GET", "/", "200"]).unwrap();

    latency.observe(&["/"], 0.0625).unwrap();
    latency.observe(&["/"], 0.5).unwrap();
    latency.observe(&["/"], 2.0).unwrap();

    active.inc(&[]).unwrap();
    active.inc(&[]).unwrap();
    active.dec(&[]).unwrap();

    assert_eq!(registry.render().unwrap(), load("registry_render.prom"));
}

#[test]
fn duplicate_name_is_rejected() {
    let mut registry = Registry::new();
    registry.counter("jobs_total", "Jobs.", &[]).unwrap();

    let err = registry.gauge("jobs_total", "Jobs again.", &[]).expect_err("must fail");
    assert_eq!(err.code().as_str(), "DUPLICATE_METRIC");
    assert_eq!(registry.len(), 1);
}

#[test]
fn failed_registration_leaves_registry_untouched() {
    let mut registry = Registry::new();
    registry.gauge("process_uptime_seconds", "Clash.", &[]).unwrap();

    let process = ProcessCollector::new().unwrap();
    let err = registry.register(Arc::new(process)).expect_err("must fail");
    assert_eq!(err.code().as_str(), "DUPLICATE_METRIC");

    // None of the collector's other families were claimed.
    assert!(!registry.contains("process_resident_memory_bytes"));
    assert_eq!(registry.len(), 1);
}

#[test]
fn same_instrument_cannot_register_twice() {
    let mut registry = Registry::new();
    let c = Arc::new(CounterVec::new("ticks_total", "Ticks.", &[]).unwrap());
    registry.register(c.clone()).unwrap();
    assert!(registry.register(c).is_err());
}

#[test]
fn unlabelled_instruments_render_zero() {
    let mut registry = Registry::new();
    registry.gauge("active_connections", "Active.", &[]).unwrap();
    registry.histogram("wait_seconds", "Wait.", &[], &[1.0]).unwrap();

    let text = registry.render().unwrap();
    assert!(text.contains("active_connections 0\n"));
    assert!(text.contains("wait_seconds_bucket{le=\"+Inf\"} 0\n"));
    assert!(text.contains("wait_seconds_sum 0\n"));
    assert!(text.contains("wait_seconds_count 0\n"));
}

#[test]
fn labelled_instruments_render_header_only_until_used() {
    let mut registry = Registry::new();
    registry.counter("http_requests_total", "Requests.", &HTTP_LABELS).unwrap();

    let text = registry.render().unwrap();
    assert_eq!(
        text,
        "# HELP http_requests_total Requests.\n# TYPE http_requests_total counter\n"
    );
}

#[test]
fn families_stay_contiguous_in_registration_order() {
    let mut registry = Registry::new();
    let b = registry.counter("b_total", "B.", &["k"]).unwrap();
    let a = registry.counter("a_total", "A.", &["k"]).unwrap();
    a.inc(&["x"]).unwrap();
    b.inc(&["y"]).unwrap();
    b.inc(&["x"]).unwrap();

    let text = registry.render().unwrap();
    let sample_names: Vec<&str> = text
        .lines()
        .filter(|l| !l.starts_with('#'))
        .map(|l| l.split('{').next().unwrap())
        .collect();
    assert_eq!(sample_names, ["b_total", "b_total", "a_total"]);
}

#[test]
fn process_collector_emits_default_families() {
    let mut registry = Registry::new();
    registry.register(Arc::new(ProcessCollector::new().unwrap())).unwrap();

    let text = registry.render().unwrap();
    for family in [
        "process_start_time_seconds",
        "process_uptime_seconds",
        "process_resident_memory_bytes",
        "process_virtual_memory_bytes",
        "process_cpu_usage_percent",
    ] {
        assert!(registry.contains(family), "{family} not registered");
        assert!(text.contains(&format!("# TYPE {family} gauge")), "{family} missing");
    }
    assert!(text.contains("\nprocess_resident_memory_bytes "));
}

#[test]
fn content_type_is_prometheus_text() {
    assert_eq!(
        Registry::CONTENT_TYPE,
        "text/plain; version=0.0.4; charset=utf-8"
    );
}
