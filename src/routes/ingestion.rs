//! Ingestion routes: preview and import of uploaded scanner output.

use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::Serialize;

use crate::errors::{ApiResponse, AppError};
use crate::models::finding::Finding;
use crate::models::report::{SeverityCount, SeveritySummary};
use crate::parsers::{RecordSkip, ScanFormat};
use crate::routes::{apply, parse_severities};
use crate::services::session::ImportOutcome;
use crate::AppState;

/// Findings shown in a preview before the user commits to an import.
pub const PREVIEW_LIMIT: usize = 10;

/// What an upload would contribute to the report.
#[derive(Debug, Serialize)]
pub struct ImportPreview {
    pub file_name: String,
    pub format: ScanFormat,
    pub source_tool: String,
    pub total: usize,
    pub severity_counts: Vec<SeverityCount>,
    pub findings: Vec<Finding>,
    pub skipped: Vec<RecordSkip>,
}

/// Fields collected from an upload form.
struct Upload {
    data: Vec<u8>,
    file_name: String,
    severities: Option<String>,
}

async fn read_upload(mut multipart: Multipart) -> Result<Upload, AppError> {
    let mut file_data: Option<Vec<u8>> = None;
    let mut file_name = String::from("unknown");
    let mut severities: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                if let Some(fname) = field.file_name() {
                    file_name = fname.to_string();
                }
                file_data = Some(
                    field
                        .bytes()
                        .await
                        .map_err(|e| AppError::Validation(format!("Failed to read file: {e}")))?
                        .to_vec(),
                );
            }
            "severities" => {
                severities = Some(field.text().await.map_err(|e| {
                    AppError::Validation(format!("Failed to read severities: {e}"))
                })?);
            }
            _ => {}
        }
    }

    let data = file_data.ok_or_else(|| {
        AppError::Validation("Missing 'file' field in multipart request".to_string())
    })?;

    Ok(Upload {
        data,
        file_name,
        severities,
    })
}

/// POST /api/v1/ingestion/preview: parse an upload without importing it.
pub async fn preview(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<ImportPreview>>, AppError> {
    let upload = read_upload(multipart).await?;
    let scan = state
        .session
        .lock()
        .await
        .preview(&upload.data, &upload.file_name)?;

    let summary = SeveritySummary::from_findings(&scan.result.findings);
    let mut findings = scan.result.findings;
    findings.truncate(PREVIEW_LIMIT);

    Ok(ApiResponse::success(ImportPreview {
        file_name: upload.file_name,
        format: scan.format,
        source_tool: scan.result.source_tool,
        total: summary.total,
        severity_counts: summary.counts,
        findings,
        skipped: scan.result.skipped,
    }))
}

/// POST /api/v1/ingestion/import: parse an upload and append its findings.
pub async fn import(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<ImportOutcome>>, AppError> {
    let upload = read_upload(multipart).await?;
    let severities = parse_severities(upload.severities.as_deref())?;

    let outcome = apply(&state, |session| {
        session.import_file(&upload.data, &upload.file_name, &severities)
    })
    .await?;

    Ok(ApiResponse::success(outcome))
}
