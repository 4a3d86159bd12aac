//! Report routes: metadata, severity summary, remediation roadmap, reset.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::errors::{ApiResponse, AppError};
use crate::models::finding::Finding;
use crate::models::report::{RemediationTerm, Report, ReportMetadataUpdate, SeveritySummary};
use crate::routes::apply;
use crate::AppState;

/// Report as rendered: findings ordered most severe first.
#[derive(Debug, Serialize)]
pub struct ReportView {
    #[serde(flatten)]
    pub report: Report,
    pub sorted_findings: Vec<Finding>,
}

#[derive(Debug, Deserialize)]
pub struct RemediationRequest {
    pub term: RemediationTerm,
    pub text: String,
}

/// GET /api/v1/report
pub async fn get(State(state): State<AppState>) -> Result<Json<ApiResponse<ReportView>>, AppError> {
    let session = state.session.lock().await;
    Ok(ApiResponse::success(ReportView {
        report: session.report().clone(),
        sorted_findings: session.sorted_findings(),
    }))
}

/// PUT /api/v1/report/metadata: partial update of engagement details.
pub async fn update_metadata(
    State(state): State<AppState>,
    Json(body): Json<ReportMetadataUpdate>,
) -> Result<Json<ApiResponse<Report>>, AppError> {
    let report = apply(&state, |session| session.update_metadata(body).cloned()).await?;
    Ok(ApiResponse::success(report))
}

/// GET /api/v1/report/summary: finding counts per severity and host.
pub async fn summary(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<SeveritySummary>>, AppError> {
    let summary = state.session.lock().await.severity_summary();
    Ok(ApiResponse::success(summary))
}

/// POST /api/v1/report/remediation: append a roadmap item.
pub async fn add_remediation(
    State(state): State<AppState>,
    Json(body): Json<RemediationRequest>,
) -> Result<Json<ApiResponse<Vec<String>>>, AppError> {
    let items = apply(&state, |session| {
        session.add_remediation(body.term, &body.text)?;
        Ok(remediation_list(session.report(), body.term))
    })
    .await?;
    Ok(ApiResponse::success(items))
}

/// DELETE /api/v1/report/remediation/{term}/{index}
pub async fn remove_remediation(
    State(state): State<AppState>,
    Path((term, index)): Path<(RemediationTerm, usize)>,
) -> Result<Json<ApiResponse<Vec<String>>>, AppError> {
    let items = apply(&state, |session| {
        session.remove_remediation(term, index)?;
        Ok(remediation_list(session.report(), term))
    })
    .await?;
    Ok(ApiResponse::success(items))
}

/// POST /api/v1/report/reset: start a fresh report and drop the save file.
pub async fn reset(State(state): State<AppState>) -> Result<Json<ApiResponse<Report>>, AppError> {
    let mut session = state.session.lock().await;
    state.store.clear().await?;
    session.reset();
    tracing::info!("Report reset");
    Ok(ApiResponse::success(session.report().clone()))
}

fn remediation_list(report: &Report, term: RemediationTerm) -> Vec<String> {
    match term {
        RemediationTerm::Short => report.remediation_short.clone(),
        RemediationTerm::Medium => report.remediation_medium.clone(),
        RemediationTerm::Long => report.remediation_long.clone(),
    }
}
