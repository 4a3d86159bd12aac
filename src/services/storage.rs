//! JSON save file for the report between sessions.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs;

use crate::errors::AppError;
use crate::models::report::Report;

/// Reads and writes the report at a fixed path.
#[derive(Debug, Clone)]
pub struct ReportStore {
    path: PathBuf,
}

impl ReportStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the saved report. A missing file gives an empty report, and so
    /// does an unreadable one (logged as a warning).
    pub async fn load(&self) -> Result<Report, AppError> {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "No saved report, starting empty");
                return Ok(Report::default());
            }
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_str::<Report>(&raw) {
            Ok(report) => {
                tracing::info!(
                    path = %self.path.display(),
                    findings = report.findings.len(),
                    additional_reports = report.additional_reports.len(),
                    "Loaded saved report"
                );
                Ok(report)
            }
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Saved report is not valid JSON, starting empty"
                );
                Ok(Report::default())
            }
        }
    }

    /// Write the report as pretty JSON.
    pub async fn save(&self, report: &Report) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        let body = serde_json::to_string_pretty(report)?;
        fs::write(&self.path, body).await?;
        tracing::debug!(path = %self.path.display(), "Saved report");
        Ok(())
    }

    /// Remove the save file if it exists.
    pub async fn clear(&self) -> Result<(), AppError> {
        match fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
