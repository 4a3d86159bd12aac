//! Generic CSV finding import with delimiter sniffing.
//!
//! Columns are matched by exact header name (`title`, `severity`, `host`,
//! `port`, `protocol`, `description`, `impact`, `recommendation`, `cvss`,
//! `cve`). Missing columns become empty fields.

use std::collections::HashMap;

use csv::{ReaderBuilder, StringRecord};

use crate::models::finding::{Finding, SeverityLevel};
use crate::parsers::normalize::FindingDraft;
use crate::parsers::{decode_lossy, ParseError, ParseResult, Parser, RecordSkip, ScanFormat};

/// Candidate delimiters, in tie-break order.
const DELIMITERS: [u8; 4] = [b',', b';', b'\t', b'|'];

/// Parser for header-keyed CSV exports.
#[derive(Debug, Default)]
pub struct CsvParser;

impl CsvParser {
    pub fn new() -> Self {
        Self
    }
}

impl Parser for CsvParser {
    fn parse(&self, data: &[u8]) -> Result<ParseResult, ParseError> {
        let text = decode_lossy(data);
        let Some(first_line) = text.lines().find(|l| !l.trim().is_empty()) else {
            return Ok(self.finish(Vec::new(), Vec::new()));
        };

        let mut reader = ReaderBuilder::new()
            .delimiter(sniff_delimiter(first_line))
            .has_headers(true)
            .flexible(true)
            .from_reader(text.as_bytes());

        let mut findings = Vec::new();
        let mut skipped = Vec::new();

        let headers = match reader.headers() {
            Ok(h) => h.clone(),
            Err(e) => {
                skipped.push(RecordSkip::new(0, "header", format!("CSV header error: {e}")));
                return Ok(self.finish(findings, skipped));
            }
        };
        let columns: HashMap<&str, usize> = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h, i))
            .collect();

        for (i, result) in reader.records().enumerate() {
            let outcome = result
                .map_err(|e| RecordSkip::new(i, "csv_row", format!("CSV parse error: {e}")))
                .and_then(|record| convert_record(&record, &columns, headers.len(), i));
            match outcome {
                Ok(finding) => findings.push(finding),
                Err(skip) => {
                    tracing::debug!(record = i, reason = %skip.message, "Skipping CSV row");
                    skipped.push(skip);
                }
            }
        }

        Ok(self.finish(findings, skipped))
    }

    fn source_tool(&self) -> &str {
        "CSV"
    }

    fn format(&self) -> ScanFormat {
        ScanFormat::Csv
    }
}

/// Most frequent candidate delimiter in the header line; `,` if none appear.
fn sniff_delimiter(header_line: &str) -> u8 {
    let mut best = (b',', 0usize);
    for delimiter in DELIMITERS {
        let count = header_line.bytes().filter(|&b| b == delimiter).count();
        if count > best.1 {
            best = (delimiter, count);
        }
    }
    best.0
}

fn convert_record(
    record: &StringRecord,
    columns: &HashMap<&str, usize>,
    header_len: usize,
    index: usize,
) -> Result<Finding, RecordSkip> {
    // Trailing delimiters leave empty cells past the header; those are
    // dropped. Non-empty overflow cannot be attributed to any column.
    let overflow = record.iter().skip(header_len).filter(|c| !c.trim().is_empty()).count();
    if overflow > 0 {
        return Err(RecordSkip::new(
            index,
            "csv_row",
            format!("expected at most {header_len} fields, found {overflow} extra non-empty"),
        ));
    }

    let field = |name: &str| -> String {
        columns
            .get(name)
            .and_then(|&i| record.get(i))
            .unwrap_or("")
            .to_string()
    };

    Ok(FindingDraft {
        title: field("title"),
        severity: SeverityLevel::from_label(&field("severity")),
        host: field("host"),
        port: field("port"),
        protocol: field("protocol"),
        description: field("description"),
        impact: field("impact"),
        recommendation: field("recommendation"),
        cvss: field("cvss"),
        cve: field("cve"),
        ..FindingDraft::default()
    }
    .into_finding())
}
