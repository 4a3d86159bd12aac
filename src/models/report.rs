//! The report document: engagement metadata plus the numbered collections.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::additional_report::AdditionalReportItem;
use crate::models::finding::{Finding, SeverityLevel};

/// Whole report as persisted between sessions.
///
/// Every field has a default so partially written save files still load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Report {
    pub client: String,
    pub project: String,
    pub tester: String,
    pub contact: String,
    pub date: String,
    pub version: String,
    pub executive_summary: String,
    pub scope: String,
    pub scope_exclusions: String,
    pub allowances: String,
    pub watermark_enabled: bool,
    pub logo_b64: String,
    pub findings: Vec<Finding>,
    pub additional_reports: Vec<AdditionalReportItem>,
    pub remediation_short: Vec<String>,
    pub remediation_medium: Vec<String>,
    pub remediation_long: Vec<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for Report {
    fn default() -> Self {
        Self {
            client: String::new(),
            project: String::new(),
            tester: String::new(),
            contact: String::new(),
            date: String::new(),
            version: "1.0".to_string(),
            executive_summary: String::new(),
            scope: String::new(),
            scope_exclusions: String::new(),
            allowances: String::new(),
            watermark_enabled: false,
            logo_b64: String::new(),
            findings: Vec::new(),
            additional_reports: Vec::new(),
            remediation_short: Vec::new(),
            remediation_medium: Vec::new(),
            remediation_long: Vec::new(),
            updated_at: None,
        }
    }
}

/// Partial metadata edit; `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportMetadataUpdate {
    pub client: Option<String>,
    pub project: Option<String>,
    pub tester: Option<String>,
    pub contact: Option<String>,
    pub date: Option<String>,
    pub version: Option<String>,
    pub executive_summary: Option<String>,
    pub scope: Option<String>,
    pub scope_exclusions: Option<String>,
    pub allowances: Option<String>,
    pub watermark_enabled: Option<bool>,
    pub logo_b64: Option<String>,
}

/// Remediation roadmap bucket (sections 7.1 to 7.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemediationTerm {
    Short,
    Medium,
    Long,
}

impl std::fmt::Display for RemediationTerm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Short => write!(f, "short"),
            Self::Medium => write!(f, "medium"),
            Self::Long => write!(f, "long"),
        }
    }
}

/// Finding counts per severity, overall and per host.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeveritySummary {
    /// One entry per level, most severe first.
    pub counts: Vec<SeverityCount>,
    pub total: usize,
    /// Blank hosts are grouped under "Unknown".
    pub by_host: BTreeMap<String, BTreeMap<SeverityLevel, usize>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeverityCount {
    pub severity: SeverityLevel,
    pub count: usize,
}

impl SeveritySummary {
    /// Host label used when a finding carries no host.
    pub const UNKNOWN_HOST: &'static str = "Unknown";

    pub fn from_findings(findings: &[Finding]) -> Self {
        let mut by_host: BTreeMap<String, BTreeMap<SeverityLevel, usize>> = BTreeMap::new();
        for finding in findings {
            let host = match finding.host.trim() {
                "" => Self::UNKNOWN_HOST.to_string(),
                h => h.to_string(),
            };
            *by_host
                .entry(host)
                .or_default()
                .entry(finding.severity)
                .or_default() += 1;
        }

        let counts = SeverityLevel::ALL
            .iter()
            .map(|&severity| SeverityCount {
                severity,
                count: findings.iter().filter(|f| f.severity == severity).count(),
            })
            .collect();

        Self {
            counts,
            total: findings.len(),
            by_host,
        }
    }

    pub fn count(&self, severity: SeverityLevel) -> usize {
        self.counts
            .iter()
            .find(|c| c.severity == severity)
            .map_or(0, |c| c.count)
    }
}
