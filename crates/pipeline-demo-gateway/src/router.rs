//! Axum router wiring.
//!
//! The metrics middleware is added with `Router::layer`, so it runs after
//! routing and can read the matched route template.

use axum::{middleware, routing::get, Router};

use crate::{app_state::AppState, obs, ops};

/// Scrape path; requests to it bypass instrumentation.
pub const METRICS_PATH: &str = "/metrics";

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(ops::root))
        .route("/health", get(ops::health))
        .route(METRICS_PATH, get(ops::metrics))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            obs::track_metrics,
        ))
        .with_state(state)
}
