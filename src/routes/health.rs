//! Health check endpoints for liveness and readiness probes.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::errors::ApiResponse;
use crate::AppState;

/// Readiness probe detail.
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub findings: usize,
    pub additional_reports: usize,
    pub save_file: String,
}

/// Liveness probe: always returns OK if the process is running.
pub async fn live() -> &'static str {
    "OK"
}

/// Readiness probe: reports the loaded session and where it is saved.
pub async fn ready(State(state): State<AppState>) -> Json<ApiResponse<HealthStatus>> {
    let session = state.session.lock().await;
    ApiResponse::success(HealthStatus {
        status: "ok".to_string(),
        findings: session.report().findings.len(),
        additional_reports: session.report().additional_reports.len(),
        save_file: state.store.path().display().to_string(),
    })
}
