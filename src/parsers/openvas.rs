//! OpenVAS / Greenbone XML report parser.
//!
//! Maps each `<result>` to a finding. Narrative fields come from the NVT
//! `tags` string (`summary=...|impact=...|solution=...`) and CVEs from the
//! result's `detail` entries and NVT references.

use crate::models::finding::{Finding, SeverityLevel};
use crate::parsers::normalize::{normalize_cves, split_cves, FindingDraft};
use crate::parsers::xml::{self, XmlElement};
use crate::parsers::{ParseError, ParseResult, Parser, ScanFormat};

/// Title used when a result carries no `<name>`.
pub const UNTITLED_FINDING: &str = "Untitled Finding";

/// Parser for OpenVAS/Greenbone XML reports.
#[derive(Debug, Default)]
pub struct OpenvasParser;

impl OpenvasParser {
    pub fn new() -> Self {
        Self
    }
}

impl Parser for OpenvasParser {
    fn parse(&self, data: &[u8]) -> Result<ParseResult, ParseError> {
        let root = xml::parse_document(data)?;

        // Results nested in another result's detection block describe the
        // detecting product, not a separate finding.
        let findings: Vec<Finding> = root
            .outermost("result")
            .into_iter()
            .map(convert_result)
            .collect();

        Ok(self.finish(findings, Vec::new()))
    }

    fn source_tool(&self) -> &str {
        "OpenVAS"
    }

    fn format(&self) -> ScanFormat {
        ScanFormat::Openvas
    }
}

fn convert_result(result: &XmlElement) -> Finding {
    let title = result
        .child_text("name")
        .filter(|n| !n.trim().is_empty())
        .unwrap_or(UNTITLED_FINDING);

    let host = result
        .child_text("host")
        .and_then(|h| h.trim().lines().next())
        .unwrap_or("");

    let port = result.child_text("port").unwrap_or("").trim();
    let protocol = port.split_once('/').map_or("", |(_, proto)| proto);

    let threat = result.child_text("threat").unwrap_or("Info");

    let nvt = result.child("nvt");
    let cvss = nvt.and_then(|n| n.child_text("cvss_base")).unwrap_or("");
    let tags = nvt
        .and_then(|n| n.child_text("tags"))
        .map(NvtTags::parse)
        .unwrap_or_default();

    FindingDraft {
        title: title.to_string(),
        severity: SeverityLevel::from_threat(threat),
        host: host.to_string(),
        port: port.to_string(),
        protocol: protocol.to_string(),
        description: tags.summary,
        impact: tags.impact,
        recommendation: tags.solution,
        cvss: cvss.to_string(),
        cve: collect_cves(result, nvt),
        source_id: result.attr("id").unwrap_or("").to_string(),
    }
    .into_finding()
}

/// Narrative fields carried in the NVT `tags` string.
#[derive(Debug, Default, PartialEq)]
struct NvtTags {
    summary: String,
    impact: String,
    solution: String,
}

impl NvtTags {
    fn parse(raw: &str) -> Self {
        let mut tags = Self::default();
        for part in raw.trim().split('|') {
            let Some((key, value)) = part.split_once('=') else {
                continue;
            };
            let value = value.trim().to_string();
            match key.trim() {
                "summary" => tags.summary = value,
                "impact" => tags.impact = value,
                "solution" => tags.solution = value,
                _ => {}
            }
        }
        tags
    }
}

fn collect_cves(result: &XmlElement, nvt: Option<&XmlElement>) -> String {
    let mut cves: Vec<String> = Vec::new();

    for detail in result.descendants("detail") {
        let name = detail.child_text("name").unwrap_or("").trim();
        let value = detail.child_text("value").unwrap_or("");
        if name.to_lowercase().starts_with("cve") && !value.trim().is_empty() {
            cves.extend(split_cves(value).map(str::to_string));
        }
    }

    if let Some(nvt) = nvt {
        // GVM 9+ lists references; older OpenVAS puts them in <cve>.
        if let Some(refs) = nvt.child("refs") {
            cves.extend(
                refs.children_named("ref")
                    .filter(|r| r.attr("type").is_some_and(|t| t.eq_ignore_ascii_case("cve")))
                    .filter_map(|r| r.attr("id"))
                    .map(str::to_string),
            );
        }
        if let Some(legacy) = nvt.child_text("cve") {
            cves.extend(
                split_cves(legacy)
                    .map(str::trim)
                    .filter(|c| !c.eq_ignore_ascii_case("NOCVE"))
                    .map(str::to_string),
            );
        }
    }

    normalize_cves(cves)
}
