//! Nessus `.nessus` (NessusClientData_v2) parser.
//!
//! Walks every `ReportItem`, taking the host from the enclosing `ReportHost`
//! and mapping plugin metadata onto the report finding fields.

use crate::models::finding::{Finding, SeverityLevel};
use crate::parsers::normalize::{normalize_cves, FindingDraft};
use crate::parsers::xml::{self, XmlElement};
use crate::parsers::{ParseError, ParseResult, Parser, RecordSkip, ScanFormat};

/// Parser for Nessus XML exports.
#[derive(Debug, Default)]
pub struct NessusParser;

impl NessusParser {
    pub fn new() -> Self {
        Self
    }
}

impl Parser for NessusParser {
    fn parse(&self, data: &[u8]) -> Result<ParseResult, ParseError> {
        let root = xml::parse_document(data)?;

        let mut items = Vec::new();
        collect_items(&root, "", &mut items);

        let mut findings = Vec::new();
        let mut skipped = Vec::new();
        for (i, (host, item)) in items.into_iter().enumerate() {
            match convert_item(item, host, i) {
                Ok(finding) => findings.push(finding),
                Err(skip) => {
                    tracing::debug!(record = i, reason = %skip.message, "Skipping Nessus item");
                    skipped.push(skip);
                }
            }
        }

        Ok(self.finish(findings, skipped))
    }

    fn source_tool(&self) -> &str {
        "Nessus"
    }

    fn format(&self) -> ScanFormat {
        ScanFormat::Nessus
    }
}

/// Gather `ReportItem`s at any depth, paired with the nearest `ReportHost` name.
fn collect_items<'a>(el: &'a XmlElement, host: &'a str, out: &mut Vec<(&'a str, &'a XmlElement)>) {
    for child in &el.children {
        match child.name.as_str() {
            "ReportItem" => out.push((host, child)),
            "ReportHost" => collect_items(child, child.attr("name").unwrap_or(""), out),
            _ => collect_items(child, host, out),
        }
    }
}

fn convert_item(item: &XmlElement, host: &str, index: usize) -> Result<Finding, RecordSkip> {
    let plugin_name = item.attr("pluginName").unwrap_or("");
    if plugin_name.trim().is_empty() && item.attr("pluginID").unwrap_or("").trim().is_empty() {
        return Err(RecordSkip::new(
            index,
            "pluginName",
            "ReportItem has neither pluginName nor pluginID",
        ));
    }

    let host = match host.trim() {
        "" => item.child_text("Host").unwrap_or(""),
        h => h,
    };

    // Older exports only carry the v2 score, newer ones may carry only v3.
    let cvss = item
        .child_text("cvss_base_score")
        .or_else(|| item.child_text("cvss3_base_score"))
        .unwrap_or("");

    let cve = normalize_cves(item.children_named("cve").map(|c| c.text.as_str()));

    Ok(FindingDraft {
        title: plugin_name.to_string(),
        severity: SeverityLevel::from_nessus_code(item.attr("severity").unwrap_or("")),
        host: host.to_string(),
        port: item.attr("port").unwrap_or("").to_string(),
        protocol: item.attr("protocol").unwrap_or("").to_string(),
        description: item.child_text("description").unwrap_or("").to_string(),
        impact: item.child_text("synopsis").unwrap_or("").to_string(),
        recommendation: item.child_text("solution").unwrap_or("").to_string(),
        cvss: cvss.to_string(),
        cve,
        source_id: item.attr("pluginID").unwrap_or("").to_string(),
    }
    .into_finding())
}
