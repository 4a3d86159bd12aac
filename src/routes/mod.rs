//! Route definitions for the ReportForge API.

pub mod additional_reports;
pub mod findings;
pub mod health;
pub mod ingestion;
pub mod report;

use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::routing::{delete, get, post, put};
use axum::Router;
use serde::Deserialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::errors::AppError;
use crate::models::finding::SeverityLevel;
use crate::services::session::ReportSession;
use crate::AppState;

/// Build the full router with middleware layers.
pub fn app(state: AppState) -> Router {
    let cors = match state.config.frontend_url.parse::<HeaderValue>() {
        Ok(origin) => CorsLayer::new().allow_origin(origin),
        Err(_) => {
            tracing::warn!(
                frontend_url = %state.config.frontend_url,
                "Invalid FRONTEND_URL, allowing any origin"
            );
            CorsLayer::new().allow_origin(Any)
        }
    }
    .allow_methods(Any)
    .allow_headers(Any);

    let max_upload = state.config.max_upload_bytes;

    let api = Router::new()
        .route("/ingestion/preview", post(ingestion::preview))
        .route("/ingestion/import", post(ingestion::import))
        .route("/findings", get(findings::list).post(findings::create))
        .route("/findings/reorder", post(findings::reorder))
        .route(
            "/findings/{index}",
            put(findings::update).delete(findings::remove),
        )
        .route(
            "/additional-reports",
            get(additional_reports::list).post(additional_reports::create),
        )
        .route("/additional-reports/reorder", post(additional_reports::reorder))
        .route(
            "/additional-reports/{index}",
            put(additional_reports::update).delete(additional_reports::remove),
        )
        .route("/report", get(report::get))
        .route("/report/metadata", put(report::update_metadata))
        .route("/report/summary", get(report::summary))
        .route("/report/remediation", post(report::add_remediation))
        .route(
            "/report/remediation/{term}/{index}",
            delete(report::remove_remediation),
        )
        .route("/report/reset", post(report::reset));

    Router::new()
        .route("/health/live", get(health::live))
        .route("/health/ready", get(health::ready))
        .nest("/api/v1", api)
        .layer(DefaultBodyLimit::max(max_upload))
        .layer(RequestBodyLimitLayer::new(max_upload))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Request body for moving a record to a new position.
#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    pub from: usize,
    pub to: usize,
}

/// Parse a comma-separated severity list; blank means no filter.
pub fn parse_severities(raw: Option<&str>) -> Result<Vec<SeverityLevel>, AppError> {
    raw.unwrap_or("")
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<SeverityLevel>().map_err(AppError::Validation))
        .collect()
}

/// Run one edit against the session and save the result. If the save fails
/// the edit is rolled back, so an error response means nothing was applied.
pub(crate) async fn apply<T>(
    state: &AppState,
    edit: impl FnOnce(&mut ReportSession) -> Result<T, AppError>,
) -> Result<T, AppError> {
    let mut session = state.session.lock().await;
    let snapshot = session.report().clone();
    let value = edit(&mut *session)?;
    if let Err(e) = state.store.save(session.stamp()).await {
        tracing::warn!(error = %e, "Save failed, rolling back edit");
        session.restore(snapshot);
        return Err(e);
    }
    Ok(value)
}
