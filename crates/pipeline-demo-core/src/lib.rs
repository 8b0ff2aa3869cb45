//! pipeline-demo core: error types and the metrics registry.
//!
//! This crate holds the instrument types, the registry that renders them in
//! Prometheus text format, and the default process collector. It carries no
//! HTTP or async runtime dependencies so the gateway and tests can share it.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! Fallible paths surface as `PipelineError`/`Result`.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod metrics;

/// Shared result type.
pub use error::{ErrorCode, PipelineError, Result};
