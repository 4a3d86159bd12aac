//! Line-oriented Nmap output parser (normal `-oN` port table lines).
//!
//! Also the fallback for any input no other parser claims. Port lines carry
//! no host context, so findings from this parser have an empty host.

use crate::models::finding::{Finding, SeverityLevel};
use crate::parsers::normalize::FindingDraft;
use crate::parsers::{decode_lossy, ParseError, ParseResult, Parser, RecordSkip, ScanFormat};

/// Parser for Nmap text output.
#[derive(Debug, Default)]
pub struct NmapTextParser;

impl NmapTextParser {
    pub fn new() -> Self {
        Self
    }
}

impl Parser for NmapTextParser {
    fn parse(&self, data: &[u8]) -> Result<ParseResult, ParseError> {
        let text = decode_lossy(data);
        let mut findings = Vec::new();
        let mut skipped = Vec::new();

        for (i, line) in text.lines().enumerate() {
            if !(line.contains("/tcp") || line.contains("/udp")) {
                continue;
            }
            if line.contains("Nmap scan report for") {
                continue;
            }
            match convert_line(line, i) {
                Ok(finding) => findings.push(finding),
                Err(skip) => {
                    tracing::debug!(line = i, reason = %skip.message, "Skipping Nmap line");
                    skipped.push(skip);
                }
            }
        }

        Ok(self.finish(findings, skipped))
    }

    fn source_tool(&self) -> &str {
        "Nmap"
    }

    fn format(&self) -> ScanFormat {
        ScanFormat::NmapText
    }
}

/// `80/tcp open http Apache httpd 2.4.41` -> finding for port 80/tcp.
fn convert_line(line: &str, index: usize) -> Result<Finding, RecordSkip> {
    let parts: Vec<&str> = line.split_whitespace().collect();

    let port_proto = parts
        .first()
        .ok_or_else(|| RecordSkip::new(index, "port", "empty line"))?;
    let (port, protocol) = match port_proto.split('/').collect::<Vec<_>>().as_slice() {
        [port, protocol] => (*port, *protocol),
        _ => {
            return Err(RecordSkip::new(
                index,
                "port",
                format!("expected port/protocol, found '{port_proto}'"),
            ))
        }
    };
    let service = parts
        .get(2)
        .ok_or_else(|| RecordSkip::new(index, "service", "line has no service column"))?;

    Ok(FindingDraft {
        title: format!("Nmap: {service} on port {port}/{protocol}"),
        severity: SeverityLevel::Informational,
        port: port.to_string(),
        protocol: protocol.to_string(),
        description: parts[2..].join(" "),
        ..FindingDraft::default()
    }
    .into_finding())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ParseResult {
        let data = include_bytes!("../../tests/fixtures/nmap_sample.nmap");
        NmapTextParser::new().parse(data).unwrap()
    }

    #[test]
    fn parses_port_table_lines() {
        let result = sample();
        assert_eq!(result.findings.len(), 3);
        assert_eq!(result.source_tool, "Nmap");
    }

    #[test]
    fn builds_title_and_description_from_tokens() {
        let result = sample();
        let http = &result.findings[1];
        assert_eq!(http.title, "Nmap: http on port 80/tcp");
        assert_eq!(http.description, "http Apache httpd 2.4.41 ((Ubuntu))");
        assert_eq!(http.port, "80");
        assert_eq!(http.protocol, "tcp");
        assert_eq!(http.host, "");
        assert_eq!(http.severity, SeverityLevel::Informational);
    }

    #[test]
    fn skips_malformed_lines() {
        let result = sample();
        // "Host: ... Ports: 22/open/tcp//ssh///" and "443/tcp" with no service
        assert_eq!(result.skipped.len(), 2);
    }

    #[test]
    fn invalid_bytes_are_ignored() {
        let result = NmapTextParser::new()
            .parse(b"53/udp open\xff domain\n")
            .unwrap();
        assert_eq!(result.findings.len(), 1);
        assert_eq!(result.findings[0].title, "Nmap: domain on port 53/udp");
    }

    #[test]
    fn unrelated_text_yields_nothing() {
        let result = NmapTextParser::new().parse(b"hello world\n").unwrap();
        assert!(result.findings.is_empty());
        assert!(result.skipped.is_empty());
    }
}
