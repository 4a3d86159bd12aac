//! Scanner output parsers for normalizing findings from various tools.
//!
//! Each parser implements the `Parser` trait, producing normalized `Finding`
//! records from one tool-specific format. `detect::parse` picks the parser
//! from the file name and content markers.

pub mod csv;
pub mod detect;
pub mod json;
pub mod nessus;
pub mod nmap_text;
pub mod nmap_xml;
pub mod normalize;
pub mod openvas;
pub mod xml;

use serde::{Deserialize, Serialize};

use crate::models::finding::Finding;

pub use detect::{detect_format, parse, parser_for};

/// Result of parsing a scanner output file.
#[derive(Debug, Serialize)]
pub struct ParseResult {
    pub findings: Vec<Finding>,
    pub skipped: Vec<RecordSkip>,
    pub source_tool: String,
}

/// A single record that could not be mapped; the rest of the file is kept.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordSkip {
    pub record_index: usize,
    pub field: String,
    pub message: String,
}

impl RecordSkip {
    pub fn new(record_index: usize, field: &str, message: impl Into<String>) -> Self {
        Self {
            record_index,
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Whole-file failure: the overall structure could not be decoded.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("malformed XML: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("malformed XML: {0}")]
    XmlAttribute(#[from] quick_xml::events::attributes::AttrError),

    #[error("malformed XML: {0}")]
    XmlStructure(String),

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unexpected JSON document: {0}")]
    UnexpectedShape(String),
}

/// Supported scan formats, in detection order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanFormat {
    Nessus,
    Openvas,
    NmapXml,
    Csv,
    Json,
    NmapText,
}

impl std::fmt::Display for ScanFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Nessus => write!(f, "nessus"),
            Self::Openvas => write!(f, "openvas"),
            Self::NmapXml => write!(f, "nmap_xml"),
            Self::Csv => write!(f, "csv"),
            Self::Json => write!(f, "json"),
            Self::NmapText => write!(f, "nmap_text"),
        }
    }
}

/// Trait for pluggable scanner output parsers.
pub trait Parser: Send + Sync {
    /// Parse raw scanner output into normalized findings.
    fn parse(&self, data: &[u8]) -> Result<ParseResult, ParseError>;

    /// The scanner tool name this parser handles.
    fn source_tool(&self) -> &str;

    /// The format this parser reads.
    fn format(&self) -> ScanFormat;

    /// Wrap parser output, logging the outcome.
    fn finish(&self, findings: Vec<Finding>, skipped: Vec<RecordSkip>) -> ParseResult {
        tracing::info!(
            source_tool = self.source_tool(),
            findings = findings.len(),
            skipped = skipped.len(),
            "Scan parse complete"
        );
        ParseResult {
            findings,
            skipped,
            source_tool: self.source_tool().to_string(),
        }
    }
}

/// Decode bytes as UTF-8, dropping anything that is not valid.
pub(crate) fn decode_lossy(data: &[u8]) -> String {
    String::from_utf8_lossy(data)
        .chars()
        .filter(|&c| c != char::REPLACEMENT_CHARACTER && c != '\u{feff}')
        .collect()
}
