//! Scan format detection from file name and content markers.

use crate::parsers::csv::CsvParser;
use crate::parsers::json::JsonParser;
use crate::parsers::nessus::NessusParser;
use crate::parsers::nmap_text::NmapTextParser;
use crate::parsers::nmap_xml::NmapXmlParser;
use crate::parsers::openvas::OpenvasParser;
use crate::parsers::{ParseError, ParseResult, Parser, ScanFormat};

const NESSUS_MARKER: &str = "<NessusClientData_v";
const OPENVAS_MARKER: &str = "<report";
const NMAP_MARKER: &str = "<nmaprun";

/// Pick a format. First match wins:
/// Nessus, OpenVAS, Nmap XML, CSV, JSON, then Nmap text as the fallback.
pub fn detect_format(data: &[u8], file_name: &str) -> ScanFormat {
    let name = file_name.to_lowercase();
    let is_xml = name.ends_with(".xml");
    let content = || String::from_utf8_lossy(data);

    if (name.ends_with(".nessus") || is_xml) && content().contains(NESSUS_MARKER) {
        ScanFormat::Nessus
    } else if is_xml && content().contains(OPENVAS_MARKER) {
        ScanFormat::Openvas
    } else if is_xml && content().contains(NMAP_MARKER) {
        ScanFormat::NmapXml
    } else if name.ends_with(".csv") {
        ScanFormat::Csv
    } else if name.ends_with(".json") {
        ScanFormat::Json
    } else {
        ScanFormat::NmapText
    }
}

pub fn parser_for(format: ScanFormat) -> Box<dyn Parser> {
    match format {
        ScanFormat::Nessus => Box::new(NessusParser::new()),
        ScanFormat::Openvas => Box::new(OpenvasParser::new()),
        ScanFormat::NmapXml => Box::new(NmapXmlParser::new()),
        ScanFormat::Csv => Box::new(CsvParser::new()),
        ScanFormat::Json => Box::new(JsonParser::new()),
        ScanFormat::NmapText => Box::new(NmapTextParser::new()),
    }
}

/// Detect the format of an uploaded scan and parse it.
pub fn parse(data: &[u8], file_name: &str) -> Result<ParseResult, ParseError> {
    let format = detect_format(data, file_name);
    tracing::debug!(file_name, %format, bytes = data.len(), "Detected scan format");
    parser_for(format).parse(data)
}
