//! Nmap `-oX` XML parser. Every scanned port becomes an informational finding.

use crate::models::finding::{Finding, SeverityLevel};
use crate::parsers::normalize::FindingDraft;
use crate::parsers::xml::{self, XmlElement};
use crate::parsers::{ParseError, ParseResult, Parser, RecordSkip, ScanFormat};

/// Parser for Nmap XML output.
#[derive(Debug, Default)]
pub struct NmapXmlParser;

impl NmapXmlParser {
    pub fn new() -> Self {
        Self
    }
}

impl Parser for NmapXmlParser {
    fn parse(&self, data: &[u8]) -> Result<ParseResult, ParseError> {
        let root = xml::parse_document(data)?;
        let mut findings = Vec::new();
        let mut skipped = Vec::new();
        let mut index = 0usize;

        for host in root.children_named("host") {
            let address = host_address(host);
            for port in host.descendants("port") {
                match convert_port(port, address, index) {
                    Ok(finding) => findings.push(finding),
                    Err(skip) => {
                        tracing::debug!(record = index, reason = %skip.message, "Skipping Nmap port");
                        skipped.push(skip);
                    }
                }
                index += 1;
            }
        }

        Ok(self.finish(findings, skipped))
    }

    fn source_tool(&self) -> &str {
        "Nmap"
    }

    fn format(&self) -> ScanFormat {
        ScanFormat::NmapXml
    }
}

/// IPv4 address of the host, else IPv6, else empty.
fn host_address(host: &XmlElement) -> &str {
    let by_type = |kind: &str| {
        host.children_named("address")
            .find(|a| a.attr("addrtype") == Some(kind))
            .and_then(|a| a.attr("addr"))
    };
    by_type("ipv4").or_else(|| by_type("ipv6")).unwrap_or("")
}

fn convert_port(port: &XmlElement, address: &str, index: usize) -> Result<Finding, RecordSkip> {
    let port_id = port.attr("portid").unwrap_or("");
    let protocol = port.attr("protocol").unwrap_or("");

    let state = port
        .child("state")
        .ok_or_else(|| RecordSkip::new(index, "state", format!("port {port_id} has no <state>")))?;
    let service = port
        .child("service")
        .ok_or_else(|| RecordSkip::new(index, "service", format!("port {port_id} has no <service>")))?;

    let service_name = service.attr("name").unwrap_or("service");
    let state_name = state.attr("state").unwrap_or("unknown");

    Ok(FindingDraft {
        title: format!("Nmap: {service_name} on port {port_id}/{protocol}"),
        severity: SeverityLevel::Informational,
        host: address.to_string(),
        port: port_id.to_string(),
        protocol: protocol.to_string(),
        description: format!("State: {state_name}"),
        ..FindingDraft::default()
    }
    .into_finding())
}
