//! Finding routes: listing, manual entry, edits, and reordering.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use crate::errors::{ApiResponse, AppError};
use crate::models::finding::{Finding, FindingUpdate, NewFinding};
use crate::routes::{apply, parse_severities, ReorderRequest};
use crate::services::session::IndexedFinding;
use crate::AppState;

/// Query parameters for listing findings.
#[derive(Debug, Default, Deserialize)]
pub struct FindingFilters {
    /// Comma-separated severity names, e.g. `High,Low`.
    pub severity: Option<String>,
}

/// GET /api/v1/findings: list findings, optionally filtered by severity.
pub async fn list(
    State(state): State<AppState>,
    Query(filters): Query<FindingFilters>,
) -> Result<Json<ApiResponse<Vec<IndexedFinding>>>, AppError> {
    let severities = parse_severities(filters.severity.as_deref())?;
    let findings = state.session.lock().await.findings_by_severity(&severities);
    Ok(ApiResponse::success(findings))
}

/// POST /api/v1/findings: add a manually written finding.
pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<NewFinding>,
) -> Result<Json<ApiResponse<Finding>>, AppError> {
    let finding = apply(&state, |session| session.add_finding(body)).await?;
    Ok(ApiResponse::success(finding))
}

/// PUT /api/v1/findings/{index}: partially update a finding.
pub async fn update(
    State(state): State<AppState>,
    Path(index): Path<usize>,
    Json(body): Json<FindingUpdate>,
) -> Result<Json<ApiResponse<Finding>>, AppError> {
    let finding = apply(&state, |session| session.update_finding(index, body)).await?;
    Ok(ApiResponse::success(finding))
}

/// DELETE /api/v1/findings/{index}: remove a finding and renumber the rest.
pub async fn remove(
    State(state): State<AppState>,
    Path(index): Path<usize>,
) -> Result<Json<ApiResponse<Finding>>, AppError> {
    let removed = apply(&state, |session| session.delete_finding(index)).await?;
    tracing::info!(index, title = %removed.title, "Deleted finding");
    Ok(ApiResponse::success(removed))
}

/// POST /api/v1/findings/reorder: move a finding and renumber.
pub async fn reorder(
    State(state): State<AppState>,
    Json(body): Json<ReorderRequest>,
) -> Result<Json<ApiResponse<Vec<Finding>>>, AppError> {
    let findings = apply(&state, |session| {
        session.move_finding(body.from, body.to)?;
        Ok(session.report().findings.clone())
    })
    .await?;
    Ok(ApiResponse::success(findings))
}
