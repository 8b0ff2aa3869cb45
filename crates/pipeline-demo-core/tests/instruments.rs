//! Instrument validation and recording tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::Arc;
use std::thread;

use pipeline_demo_core::metrics::{Collector, CounterVec, GaugeVec, HistogramVec, DEFAULT_BUCKETS};

fn encode(c: &dyn Collector) -> String {
    let mut out = String::new();
    c.encode(&mut out).unwrap();
    out
}

#[test]
fn rejects_bad_names() {
    for name in ["", "1abc", "http-requests", "a b"] {
        let err = CounterVec::new(name, "x", &[]).expect_err(name);
        assert_eq!(err.code().as_str(), "INVALID_METRIC");
    }
    assert!(CounterVec::new("ns:http_requests_total", "x", &[]).is_ok());

    for label in ["__reserved", "a:b", "9x", ""] {
        assert!(GaugeVec::new("g", "x", &[label]).is_err(), "{label}");
    }
    assert!(GaugeVec::new("g", "x", &["route", "route"]).is_err());
}

#[test]
fn histogram_rejects_bad_buckets_and_le_label() {
    assert!(HistogramVec::new("h", "x", &[], &[]).is_err());
    assert!(HistogramVec::new("h", "x", &[], &[1.0, 1.0]).is_err());
    assert!(HistogramVec::new("h", "x", &[], &[2.0, 1.0]).is_err());
    assert!(HistogramVec::new("h", "x", &[], &[1.0, f64::INFINITY]).is_err());
    assert!(HistogramVec::new("h", "x", &["le"], &[1.0]).is_err());
    assert!(HistogramVec::new("h", "x", &[], &DEFAULT_BUCKETS).is_ok());
}

#[test]
fn label_cardinality_mismatch_leaves_state_untouched() {
    let c = CounterVec::new("http_requests_total", "x", &["method", "route", "status_code"]).unwrap();

    let err = c.inc(&["GET", "/"]).expect_err("two values for three labels");
    assert_eq!(err.code().as_str(), "LABEL_CARDINALITY");
    assert!(err.to_string().contains("expects 3 label values, got 2"));

    let text = encode(&c);
    assert_eq!(text.lines().count(), 2, "only HELP/TYPE expected: {text}");
}

#[test]
fn label_values_are_escaped() {
    let c = CounterVec::new("paths_total", "Paths with \\ and\nnewline.", &["route"]).unwrap();
    c.inc(&["/a\"b\\c\nd"]).unwrap();

    let text = encode(&c);
    assert!(text.contains("# HELP paths_total Paths with \\\\ and\\nnewline.\n"));
    assert!(text.contains("paths_total{route=\"/a\\\"b\\\\c\\nd\"} 1\n"));
}

#[test]
fn histogram_buckets_are_cumulative() {
    let h = HistogramVec::new("d_seconds", "x", &["route"], &[0.01, 0.1, 1.0]).unwrap();
    h.observe(&["/"], 0.01).unwrap(); // on the boundary counts in le=0.01
    h.observe(&["/"], 0.05).unwrap();
    h.observe(&["/"], 5.0).unwrap();

    let text = encode(&h);
    assert!(text.contains("d_seconds_bucket{route=\"/\",le=\"0.01\"} 1\n"));
    assert!(text.contains("d_seconds_bucket{route=\"/\",le=\"0.1\"} 2\n"));
    assert!(text.contains("d_seconds_bucket{route=\"/\",le=\"1\"} 2\n"));
    assert!(text.contains("d_seconds_bucket{route=\"/\",le=\"+Inf\"} 3\n"));
    assert_eq!(h.sample_count(&["/"]), Some(3));
    assert!((h.sample_sum(&["/"]).unwrap() - 5.06).abs() < 1e-9);
    assert_eq!(h.sample_count(&["/other"]), None);
}

#[test]
fn gauge_tracks_signed_deltas() {
    let g = GaugeVec::new("active_connections", "x", &[]).unwrap();
    assert_eq!(g.get(&[]), Some(0));
    g.inc(&[]).unwrap();
    g.add(&[], 4).unwrap();
    g.dec(&[]).unwrap();
    assert_eq!(g.get(&[]), Some(4));
    g.set(&[], 0).unwrap();
    assert_eq!(g.get(&[]), Some(0));
}

#[test]
fn concurrent_recording_loses_nothing() {
    let c = Arc::new(CounterVec::new("hits_total", "x", &["route"]).unwrap());
    let h = Arc::new(HistogramVec::new("hit_seconds", "x", &["route"], &DEFAULT_BUCKETS).unwrap());

    let workers: Vec<_> = (0..8)
        .map(|_| {
            let c = Arc::clone(&c);
            let h = Arc::clone(&h);
            thread::spawn(move || {
                for _ in 0..1_000 {
                    c.inc(&["/"]).unwrap();
                    h.observe(&["/"], 0.002).unwrap();
                }
            })
        })
        .collect();
    for w in workers {
        w.join().unwrap();
    }

    assert_eq!(c.get(&["/"]), Some(8_000));
    assert_eq!(h.sample_count(&["/"]), Some(8_000));
    assert!((h.sample_sum(&["/"]).unwrap() - 16.0).abs() < 1e-6);
}
