//! Request instrumentation for the service.
//!
//! - `http`       : the HTTP instrument set (`http_requests_total`, ...)
//! - `runtime`    : Tokio runtime gauges, the event-loop view of the process
//! - `middleware` : axum middleware recording every request except the scrape

pub mod http;
pub mod middleware;
pub mod runtime;

pub use http::HttpMetrics;
pub use middleware::{track_metrics, InFlightRequest};
pub use runtime::RuntimeCollector;
