//! Structured JSON finding import.
//!
//! Accepts either `[{...}, ...]` or `{"findings": [{...}, ...]}`.

use serde_json::{Map, Value};

use crate::models::finding::{Finding, SeverityLevel};
use crate::parsers::normalize::{json_to_text, FindingDraft};
use crate::parsers::{decode_lossy, ParseError, ParseResult, Parser, RecordSkip, ScanFormat};

/// Parser for JSON finding lists.
#[derive(Debug, Default)]
pub struct JsonParser;

impl JsonParser {
    pub fn new() -> Self {
        Self
    }
}

impl Parser for JsonParser {
    fn parse(&self, data: &[u8]) -> Result<ParseResult, ParseError> {
        let document: Value = serde_json::from_str(&decode_lossy(data))?;

        let entries = match document {
            Value::Array(entries) => entries,
            Value::Object(mut object) => match object.remove("findings") {
                Some(Value::Array(entries)) => entries,
                None | Some(Value::Null) => Vec::new(),
                Some(other) => {
                    return Err(ParseError::UnexpectedShape(format!(
                        "\"findings\" must be an array, found {}",
                        kind(&other)
                    )))
                }
            },
            other => {
                return Err(ParseError::UnexpectedShape(format!(
                    "expected an array or object, found {}",
                    kind(&other)
                )))
            }
        };

        let mut findings = Vec::new();
        let mut skipped = Vec::new();
        for (i, entry) in entries.iter().enumerate() {
            match entry {
                Value::Object(fields) => findings.push(convert_entry(fields)),
                other => {
                    let skip = RecordSkip::new(i, "entry", format!("expected an object, found {}", kind(other)));
                    tracing::debug!(record = i, reason = %skip.message, "Skipping JSON entry");
                    skipped.push(skip);
                }
            }
        }

        Ok(self.finish(findings, skipped))
    }

    fn source_tool(&self) -> &str {
        "JSON"
    }

    fn format(&self) -> ScanFormat {
        ScanFormat::Json
    }
}

fn convert_entry(fields: &Map<String, Value>) -> Finding {
    let field = |name: &str| fields.get(name).map(json_to_text).unwrap_or_default();

    FindingDraft {
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
    .into_finding()
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
