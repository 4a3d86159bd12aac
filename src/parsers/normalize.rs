//! Field normalization shared by all parsers.

use std::collections::BTreeSet;

use crate::models::finding::{Finding, SeverityLevel};

/// Loose field set collected by a parser before normalization.
#[derive(Debug, Clone, Default)]
pub struct FindingDraft {
    pub title: String,
    pub severity: SeverityLevel,
    pub host: String,
    pub port: String,
    pub protocol: String,
    pub description: String,
    pub impact: String,
    pub recommendation: String,
    pub cvss: String,
    pub cve: String,
    pub source_id: String,
}

impl FindingDraft {
    /// Trim every value and canonicalize the CVE list. The result is
    /// unnumbered and carries no code or images.
    pub fn into_finding(self) -> Finding {
        Finding {
            id: None,
            severity: self.severity,
            title: norm(&self.title),
            host: norm(&self.host),
            port: norm(&self.port),
            protocol: norm(&self.protocol),
            description: norm(&self.description),
            impact: norm(&self.impact),
            recommendation: norm(&self.recommendation),
            cvss: norm(&self.cvss),
            cve: normalize_cves(split_cves(&self.cve)),
            code: String::new(),
            images: Vec::new(),
            source_id: norm(&self.source_id),
        }
    }
}

pub fn norm(value: &str) -> String {
    value.trim().to_string()
}

/// Split a free-text CVE list on commas and line breaks.
pub fn split_cves(raw: &str) -> impl Iterator<Item = &str> {
    raw.split([',', '\n', '\r', ';'])
}

/// Trim, drop blanks, de-duplicate, sort, and join with ", ".
pub fn normalize_cves<I, S>(cves: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    cves.into_iter()
        .map(|c| c.as_ref().trim().to_string())
        .filter(|c| !c.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect::<Vec<_>>()
        .join(", ")
}

/// Stringify a JSON value the way a report field expects it.
pub fn json_to_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s.trim().to_string(),
        serde_json::Value::Array(items) => items
            .iter()
            .map(json_to_text)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cves_sorted_and_unique() {
        let joined = normalize_cves(["CVE-2021-9", "CVE-2021-1", "CVE-2021-1"]);
        assert_eq!(joined, "CVE-2021-1, CVE-2021-9");
    }

    #[test]
    fn cves_ignore_blanks_and_whitespace() {
        assert_eq!(normalize_cves(split_cves(" CVE-2020-2 ,, CVE-2019-1\n")), "CVE-2019-1, CVE-2020-2");
        assert_eq!(normalize_cves(Vec::<String>::new()), "");
    }

    #[test]
    fn draft_trims_everything() {
        let finding = FindingDraft {
            title: "  SSH weak ciphers \n".to_string(),
            host: " 10.0.0.5".to_string(),
            cve: "CVE-2008-5161".to_string(),
            ..FindingDraft::default()
        }
        .into_finding();

        assert_eq!(finding.title, "SSH weak ciphers");
        assert_eq!(finding.host, "10.0.0.5");
        assert_eq!(finding.cve, "CVE-2008-5161");
        assert_eq!(finding.severity, SeverityLevel::Informational);
        assert!(finding.id.is_none());
        assert!(finding.images.is_empty());
    }

    #[test]
    fn json_scalars_stringify() {
        assert_eq!(json_to_text(&serde_json::json!(null)), "");
        assert_eq!(json_to_text(&serde_json::json!(" a ")), "a");
        assert_eq!(json_to_text(&serde_json::json!(7.5)), "7.5");
        assert_eq!(json_to_text(&serde_json::json!(443)), "443");
        assert_eq!(json_to_text(&serde_json::json!(true)), "true");
        assert_eq!(json_to_text(&serde_json::json!(["CVE-1", "CVE-2"])), "CVE-1, CVE-2");
    }
}
