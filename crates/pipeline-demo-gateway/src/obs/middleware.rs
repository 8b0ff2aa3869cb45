//! Per-request metrics middleware.
//!
//! Every request except the scrape itself is bracketed by an
//! [`InFlightRequest`] guard: creating it bumps `active_connections`, and
//! dropping it records the counter and histogram sample and releases the
//! gauge. Because the recording lives in `Drop`, it runs exactly once whether
//! the handler returned normally or the request future was dropped because
//! the client went away.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};

use crate::app_state::AppState;
use crate::obs::HttpMetrics;
use crate::router::METRICS_PATH;

/// Status recorded when the request future is dropped before a response
/// exists (nginx's "client closed request").
pub const CLIENT_CLOSED_REQUEST: u16 = 499;

/// Scoped recording for one request.
pub struct InFlightRequest {
    metrics: Arc<HttpMetrics>,
    method: String,
    route: String,
    start: Instant,
    status: Option<StatusCode>,
}

impl InFlightRequest {
    pub fn start(metrics: Arc<HttpMetrics>, method: String, route: String) -> Self {
        metrics.request_started();
        Self {
            metrics,
            method,
            route,
            start: Instant::now(),
            status: None,
        }
    }

    /// Status to record; unset means the request never produced a response.
    pub fn set_status(&mut self, status: StatusCode) {
        self.status = Some(status);
    }
}

impl Drop for InFlightRequest {
    fn drop(&mut self) {
        let elapsed = self.start.elapsed();
        let status = self
            .status
            .map_or(CLIENT_CLOSED_REQUEST, |s| s.as_u16());

        self.metrics
            .request_finished(&self.method, &self.route, status, elapsed);

        tracing::debug!(
            method = %self.method,
            route = %self.route,
            status,
            elapsed_ms = elapsed.as_secs_f64() * 1000.0,
            "request finished"
        );
    }
}

/// Route label: the matched template when routing found one, else the raw path.
fn route_label(req: &Request) -> String {
    req.extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| req.uri().path().to_owned())
}

/// axum middleware; install with `middleware::from_fn_with_state`.
pub async fn track_metrics(State(state): State<AppState>, req: Request, next: Next) -> Response {
    if req.uri().path() == METRICS_PATH {
        return next.run(req).await;
    }

    let mut in_flight = InFlightRequest::start(
        state.http_metrics(),
        req.method().as_str().to_owned(),
        route_label(&req),
    );

    let response = next.run(req).await;
    in_flight.set_status(response.status());
    response
}
