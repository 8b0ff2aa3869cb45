//! pipeline-demo gateway library entry.
//!
//! This crate wires config, the metrics registry, request instrumentation,
//! and the HTTP endpoints into an axum application. It is consumed by the
//! binary (`main.rs`) and by integration tests.

pub mod app_state;
pub mod config;
pub mod obs;
pub mod ops;
pub mod router;
