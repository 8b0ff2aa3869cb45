//! HTTP endpoints.
//!
//! - `/`        : welcome document
//! - `/health`  : liveness with uptime
//! - `/metrics` : Prometheus text format

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::json;

use pipeline_demo_core::error::PipelineError;
use pipeline_demo_core::metrics::Registry;

use crate::app_state::AppState;

pub const WELCOME_MESSAGE: &str = "Welcome to Cloud-Native Pipeline Demo!";
pub const SERVICE_VERSION: &str = "1.0.0";

/// ISO-8601 UTC with millisecond precision, e.g. `2026-10-17T08:00:00.000Z`.
fn now_iso8601() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[derive(Debug, Serialize)]
pub struct WelcomeResponse {
    pub message: &'static str,
    pub version: &'static str,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    /// Seconds since startup.
    pub uptime: f64,
    pub timestamp: String,
}

pub async fn root() -> Json<WelcomeResponse> {
    Json(WelcomeResponse {
        message: WELCOME_MESSAGE,
        version: SERVICE_VERSION,
        timestamp: now_iso8601(),
    })
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        uptime: state.uptime().as_secs_f64(),
        timestamp: now_iso8601(),
    })
}

pub async fn metrics(State(state): State<AppState>) -> Response {
    match state.registry().render() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, Registry::CONTENT_TYPE)],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "metrics render failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, &e)
        }
    }
}

/// JSON error body: `{"error": {"code": ..., "message": ...}}`.
pub fn error_response(status: StatusCode, err: &PipelineError) -> Response {
    let body = json!({
        "error": {
            "code": err.code().as_str(),
            "message": err.to_string(),
        }
    });
    (status, Json(body)).into_response()
}
