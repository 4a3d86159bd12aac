//! Report session: the in-memory report and every edit made to it.
//!
//! All mutations of the numbered collections end with a renumber pass so
//! findings stay `8.1..8.N` and additional reports stay `9.1..9.N`.

use chrono::Utc;
use regex::Regex;
use serde::Serialize;

use crate::errors::AppError;
use crate::models::additional_report::{
    AdditionalReportItem, AdditionalReportUpdate, NewAdditionalReport, UNTITLED,
};
use crate::models::finding::{Finding, FindingUpdate, NewFinding, SeverityLevel};
use crate::models::report::{RemediationTerm, Report, ReportMetadataUpdate, SeveritySummary};
use crate::parsers::normalize::{normalize_cves, split_cves};
use crate::parsers::{self, ParseResult, RecordSkip, ScanFormat};
use crate::services::numbering::{
    next_id, renumber_in_place, Numbered, ADDITIONAL_REPORT_PREFIX, FINDING_PREFIX,
};

const BASE64_PATTERN: &str = r"^[A-Za-z0-9+/]+={0,2}$";

/// A parsed upload together with the format it was detected as.
#[derive(Debug, Serialize)]
pub struct ParsedScan {
    pub format: ScanFormat,
    #[serde(flatten)]
    pub result: ParseResult,
}

/// Outcome of importing an uploaded scan into the report.
#[derive(Debug, Serialize)]
pub struct ImportOutcome {
    pub format: ScanFormat,
    pub source_tool: String,
    pub parsed: usize,
    pub imported: usize,
    pub skipped: Vec<RecordSkip>,
}

/// A finding paired with its position in the report.
#[derive(Debug, Clone, Serialize)]
pub struct IndexedFinding {
    pub index: usize,
    #[serde(flatten)]
    pub finding: Finding,
}

/// Owns the report being edited.
#[derive(Debug, Default)]
pub struct ReportSession {
    report: Report,
}

impl ReportSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume editing a saved report. Identifiers are repaired on load.
    pub fn from_report(mut report: Report) -> Self {
        renumber_in_place(&mut report.findings, FINDING_PREFIX);
        renumber_in_place(&mut report.additional_reports, ADDITIONAL_REPORT_PREFIX);
        Self { report }
    }

    pub fn report(&self) -> &Report {
        &self.report
    }

    /// Put back a previously cloned report, e.g. after a failed save.
    pub fn restore(&mut self, report: Report) {
        self.report = report;
    }

    /// Record an edit time and hand the report over for saving.
    pub fn stamp(&mut self) -> &Report {
        self.report.updated_at = Some(Utc::now());
        &self.report
    }

    // -- Import --

    /// Parse an upload without touching the report.
    pub fn preview(&self, data: &[u8], file_name: &str) -> Result<ParsedScan, AppError> {
        let parser = parsers::parser_for(parsers::detect_format(data, file_name));
        let result = parser.parse(data)?;
        Ok(ParsedScan {
            format: parser.format(),
            result,
        })
    }

    /// Append findings whose severity passes `severities` (empty means all).
    /// Returns how many were added.
    pub fn import(&mut self, findings: Vec<Finding>, severities: &[SeverityLevel]) -> usize {
        let mut imported = 0;
        for mut finding in findings {
            if !severities.is_empty() && !severities.contains(&finding.severity) {
                continue;
            }
            let id = next_id(&self.report.findings, FINDING_PREFIX);
            finding.set_number(id);
            self.report.findings.push(finding);
            imported += 1;
        }
        renumber_in_place(&mut self.report.findings, FINDING_PREFIX);
        imported
    }

    /// Parse and import in one step. A structural error leaves the report
    /// untouched.
    pub fn import_file(
        &mut self,
        data: &[u8],
        file_name: &str,
        severities: &[SeverityLevel],
    ) -> Result<ImportOutcome, AppError> {
        let ParsedScan { format, result } = self.preview(data, file_name)?;
        let parsed = result.findings.len();
        let imported = self.import(result.findings, severities);

        tracing::info!(
            file_name,
            %format,
            parsed,
            imported,
            skipped = result.skipped.len(),
            "Imported scan into report"
        );

        Ok(ImportOutcome {
            format,
            source_tool: result.source_tool,
            parsed,
            imported,
            skipped: result.skipped,
        })
    }

    // -- Findings --

    pub fn add_finding(&mut self, new: NewFinding) -> Result<Finding, AppError> {
        let images = validate_images(new.images)?;
        let mut finding = Finding {
            id: None,
            severity: new.severity,
            title: new.title.trim().to_string(),
            host: new.host.trim().to_string(),
            port: new.port.trim().to_string(),
            protocol: new.protocol.trim().to_string(),
            description: new.description,
            impact: new.impact,
            recommendation: new.recommendation,
            cvss: new.cvss.trim().to_string(),
            cve: normalize_cves(split_cves(&new.cve)),
            code: new.code,
            images,
            source_id: String::new(),
        };
        finding.set_number(next_id(&self.report.findings, FINDING_PREFIX));
        self.report.findings.push(finding.clone());
        Ok(finding)
    }

    pub fn update_finding(&mut self, index: usize, update: FindingUpdate) -> Result<Finding, AppError> {
        let images = update.images.map(validate_images).transpose()?;
        let finding = self
            .report
            .findings
            .get_mut(index)
            .ok_or_else(|| finding_not_found(index))?;

        if let Some(title) = update.title {
            finding.title = title.trim().to_string();
        }
        if let Some(severity) = update.severity {
            finding.severity = severity;
        }
        if let Some(host) = update.host {
            finding.host = host.trim().to_string();
        }
        if let Some(port) = update.port {
            finding.port = port.trim().to_string();
        }
        if let Some(protocol) = update.protocol {
            finding.protocol = protocol.trim().to_string();
        }
        if let Some(description) = update.description {
            finding.description = description;
        }
        if let Some(impact) = update.impact {
            finding.impact = impact;
        }
        if let Some(recommendation) = update.recommendation {
            finding.recommendation = recommendation;
        }
        if let Some(cvss) = update.cvss {
            finding.cvss = cvss.trim().to_string();
        }
        if let Some(cve) = update.cve {
            finding.cve = normalize_cves(split_cves(&cve));
        }
        if let Some(code) = update.code {
            finding.code = code;
        }
        if let Some(images) = images {
            finding.images = images;
        }

        renumber_in_place(&mut self.report.findings, FINDING_PREFIX);
        Ok(self.report.findings[index].clone())
    }

    pub fn delete_finding(&mut self, index: usize) -> Result<Finding, AppError> {
        if index >= self.report.findings.len() {
            return Err(finding_not_found(index));
        }
        let removed = self.report.findings.remove(index);
        renumber_in_place(&mut self.report.findings, FINDING_PREFIX);
        Ok(removed)
    }

    pub fn move_finding(&mut self, from: usize, to: usize) -> Result<(), AppError> {
        move_item(&mut self.report.findings, from, to, "Finding")?;
        renumber_in_place(&mut self.report.findings, FINDING_PREFIX);
        Ok(())
    }

    /// Findings whose severity is in `severities` (empty means all), with
    /// their positions in the report.
    pub fn findings_by_severity(&self, severities: &[SeverityLevel]) -> Vec<IndexedFinding> {
        self.report
            .findings
            .iter()
            .enumerate()
            .filter(|(_, f)| severities.is_empty() || severities.contains(&f.severity))
            .map(|(index, f)| IndexedFinding {
                index,
                finding: f.clone(),
            })
            .collect()
    }

    // -- Additional reports --

    pub fn add_additional_report(
        &mut self,
        new: NewAdditionalReport,
    ) -> Result<AdditionalReportItem, AppError> {
        let images = validate_images(new.images)?;
        let mut item = AdditionalReportItem {
            id: None,
            name: name_or_untitled(&new.name),
            description: new.description,
            code: new.code,
            images,
        };
        item.set_number(next_id(&self.report.additional_reports, ADDITIONAL_REPORT_PREFIX));
        self.report.additional_reports.push(item.clone());
        Ok(item)
    }

    pub fn update_additional_report(
        &mut self,
        index: usize,
        update: AdditionalReportUpdate,
    ) -> Result<AdditionalReportItem, AppError> {
        let images = update.images.map(validate_images).transpose()?;
        let item = self
            .report
            .additional_reports
            .get_mut(index)
            .ok_or_else(|| additional_report_not_found(index))?;

        if let Some(name) = update.name {
            item.name = name_or_untitled(&name);
        }
        if let Some(description) = update.description {
            item.description = description;
        }
        if let Some(code) = update.code {
            item.code = code;
        }
        if let Some(images) = images {
            item.images = images;
        }

        renumber_in_place(&mut self.report.additional_reports, ADDITIONAL_REPORT_PREFIX);
        Ok(self.report.additional_reports[index].clone())
    }

    pub fn delete_additional_report(&mut self, index: usize) -> Result<AdditionalReportItem, AppError> {
        if index >= self.report.additional_reports.len() {
            return Err(additional_report_not_found(index));
        }
        let removed = self.report.additional_reports.remove(index);
        renumber_in_place(&mut self.report.additional_reports, ADDITIONAL_REPORT_PREFIX);
        Ok(removed)
    }

    pub fn move_additional_report(&mut self, from: usize, to: usize) -> Result<(), AppError> {
        move_item(&mut self.report.additional_reports, from, to, "Additional report")?;
        renumber_in_place(&mut self.report.additional_reports, ADDITIONAL_REPORT_PREFIX);
        Ok(())
    }

    // -- Remediation roadmap --

    pub fn add_remediation(&mut self, term: RemediationTerm, text: &str) -> Result<(), AppError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AppError::Validation(
                "Remediation text must not be empty".to_string(),
            ));
        }
        self.remediation_mut(term).push(text.to_string());
        Ok(())
    }

    pub fn remove_remediation(&mut self, term: RemediationTerm, index: usize) -> Result<String, AppError> {
        let items = self.remediation_mut(term);
        if index >= items.len() {
            return Err(AppError::NotFound(format!(
                "No {term}-term remediation item at index {index}"
            )));
        }
        Ok(items.remove(index))
    }

    fn remediation_mut(&mut self, term: RemediationTerm) -> &mut Vec<String> {
        match term {
            RemediationTerm::Short => &mut self.report.remediation_short,
            RemediationTerm::Medium => &mut self.report.remediation_medium,
            RemediationTerm::Long => &mut self.report.remediation_long,
        }
    }

    // -- Metadata and views --

    pub fn update_metadata(&mut self, update: ReportMetadataUpdate) -> Result<&Report, AppError> {
        if let Some(logo) = update.logo_b64 {
            let logo = logo.trim();
            if !logo.is_empty() {
                validate_image(logo, &base64_regex()?)?;
            }
            self.report.logo_b64 = logo.to_string();
        }

        let report = &mut self.report;
        let fields = [
            (update.client, &mut report.client),
            (update.project, &mut report.project),
            (update.tester, &mut report.tester),
            (update.contact, &mut report.contact),
            (update.date, &mut report.date),
            (update.version, &mut report.version),
            (update.executive_summary, &mut report.executive_summary),
            (update.scope, &mut report.scope),
            (update.scope_exclusions, &mut report.scope_exclusions),
            (update.allowances, &mut report.allowances),
        ];
        for (value, target) in fields {
            if let Some(value) = value {
                *target = value;
            }
        }
        if let Some(enabled) = update.watermark_enabled {
            report.watermark_enabled = enabled;
        }

        Ok(&self.report)
    }

    pub fn severity_summary(&self) -> SeveritySummary {
        SeveritySummary::from_findings(&self.report.findings)
    }

    /// Findings in rendering order: Critical first, stable within a level.
    pub fn sorted_findings(&self) -> Vec<Finding> {
        let mut findings = self.report.findings.clone();
        findings.sort_by(|a, b| b.severity.cmp(&a.severity));
        findings
    }

    pub fn reset(&mut self) {
        self.report = Report::default();
    }
}

fn finding_not_found(index: usize) -> AppError {
    AppError::NotFound(format!("Finding at index {index} not found"))
}

fn additional_report_not_found(index: usize) -> AppError {
    AppError::NotFound(format!("Additional report at index {index} not found"))
}

fn name_or_untitled(name: &str) -> String {
    match name.trim() {
        "" => UNTITLED.to_string(),
        n => n.to_string(),
    }
}

fn move_item<T>(items: &mut Vec<T>, from: usize, to: usize, label: &str) -> Result<(), AppError> {
    let len = items.len();
    if from >= len || to >= len {
        return Err(AppError::NotFound(format!(
            "{label} move {from} -> {to} is out of range (have {len})"
        )));
    }
    let item = items.remove(from);
    items.insert(to, item);
    Ok(())
}

fn base64_regex() -> Result<Regex, AppError> {
    Regex::new(BASE64_PATTERN).map_err(|e| AppError::Internal(format!("image pattern: {e}")))
}

fn validate_image(image: &str, pattern: &Regex) -> Result<(), AppError> {
    if image.len() % 4 != 0 || !pattern.is_match(image) {
        return Err(AppError::Validation(
            "Image is not valid base64 data".to_string(),
        ));
    }
    Ok(())
}

/// Trim, validate, and de-duplicate evidence images, keeping first-seen order.
fn validate_images(images: Vec<String>) -> Result<Vec<String>, AppError> {
    let pattern = base64_regex()?;
    let mut accepted: Vec<String> = Vec::with_capacity(images.len());
    for image in images {
        let image = image.trim();
        if image.is_empty() {
            return Err(AppError::Validation("Image data must not be empty".to_string()));
        }
        validate_image(image, &pattern)?;
        if !accepted.iter().any(|a| a == image) {
            accepted.push(image.to_string());
        }
    }
    Ok(accepted)
}
