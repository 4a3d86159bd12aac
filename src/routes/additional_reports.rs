//! Additional report routes (section 9 appendix items).

use axum::{
    extract::{Path, State},
    Json,
};

use crate::errors::{ApiResponse, AppError};
use crate::models::additional_report::{
    AdditionalReportItem, AdditionalReportUpdate, NewAdditionalReport,
};
use crate::routes::{apply, ReorderRequest};
use crate::AppState;

/// GET /api/v1/additional-reports: list appendix items in report order.
pub async fn list(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<AdditionalReportItem>>>, AppError> {
    let items = state.session.lock().await.report().additional_reports.clone();
    Ok(ApiResponse::success(items))
}

/// POST /api/v1/additional-reports: add an appendix item.
pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<NewAdditionalReport>,
) -> Result<Json<ApiResponse<AdditionalReportItem>>, AppError> {
    let item = apply(&state, |session| session.add_additional_report(body)).await?;
    Ok(ApiResponse::success(item))
}

/// PUT /api/v1/additional-reports/{index}
pub async fn update(
    State(state): State<AppState>,
    Path(index): Path<usize>,
    Json(body): Json<AdditionalReportUpdate>,
) -> Result<Json<ApiResponse<AdditionalReportItem>>, AppError> {
    let item = apply(&state, |session| session.update_additional_report(index, body)).await?;
    Ok(ApiResponse::success(item))
}

/// DELETE /api/v1/additional-reports/{index}
pub async fn remove(
    State(state): State<AppState>,
    Path(index): Path<usize>,
) -> Result<Json<ApiResponse<AdditionalReportItem>>, AppError> {
    let removed = apply(&state, |session| session.delete_additional_report(index)).await?;
    Ok(ApiResponse::success(removed))
}

/// POST /api/v1/additional-reports/reorder
pub async fn reorder(
    State(state): State<AppState>,
    Json(body): Json<ReorderRequest>,
) -> Result<Json<ApiResponse<Vec<AdditionalReportItem>>>, AppError> {
    let items = apply(&state, |session| {
        session.move_additional_report(body.from, body.to)?;
        Ok(session.report().additional_reports.clone())
    })
    .await?;
    Ok(ApiResponse::success(items))
}
