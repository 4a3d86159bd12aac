//! Minimal element tree over the quick-xml event reader.
//!
//! The scanner formats are navigated by element name at varying depths, so
//! the document is loaded into a small owned tree first.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::parsers::ParseError;

/// One XML element with its attributes, direct text, and child elements.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    /// Concatenated direct text content (CDATA included), untrimmed.
    pub text: String,
    pub children: Vec<XmlElement>,
}

impl XmlElement {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Text of the first child with this name.
    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name).map(|c| c.text.as_str())
    }

    /// All descendants with this name, in document order.
    pub fn descendants(&self, name: &str) -> Vec<&XmlElement> {
        let mut found = Vec::new();
        collect(self, name, true, &mut found);
        found
    }

    /// Descendants with this name that are not nested inside another match.
    pub fn outermost(&self, name: &str) -> Vec<&XmlElement> {
        let mut found = Vec::new();
        collect(self, name, false, &mut found);
        found
    }
}

fn collect<'a>(el: &'a XmlElement, name: &str, nested: bool, out: &mut Vec<&'a XmlElement>) {
    for child in &el.children {
        if child.name == name {
            out.push(child);
            if !nested {
                continue;
            }
        }
        collect(child, name, nested, out);
    }
}

/// Parse a whole document and return its root element.
pub fn parse_document(data: &[u8]) -> Result<XmlElement, ParseError> {
    let mut reader = Reader::from_reader(data);
    let mut buf = Vec::new();
    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => stack.push(start_element(&e)?),
            Event::Empty(e) => {
                let el = start_element(&e)?;
                close_element(el, &mut stack, &mut root)?;
            }
            Event::End(_) => {
                let el = stack.pop().ok_or_else(|| {
                    ParseError::XmlStructure("closing tag without matching open tag".to_string())
                })?;
                close_element(el, &mut stack, &mut root)?;
            }
            Event::Text(t) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&String::from_utf8_lossy(&t));
                }
            }
            Event::CData(t) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&String::from_utf8_lossy(&t));
                }
            }
            Event::GeneralRef(r) => {
                if let Some(current) = stack.last_mut() {
                    let name = String::from_utf8_lossy(&r);
                    current.text.push_str(&resolve_reference(&name)?);
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if let Some(open) = stack.last() {
        return Err(ParseError::XmlStructure(format!(
            "unexpected end of document inside <{}>",
            open.name
        )));
    }
    root.ok_or_else(|| ParseError::XmlStructure("document has no root element".to_string()))
}

fn start_element(e: &BytesStart<'_>) -> Result<XmlElement, ParseError> {
    let mut attributes = Vec::new();
    for attr in e.attributes() {
        let attr = attr?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
        let raw = String::from_utf8_lossy(&attr.value).to_string();
        let value = quick_xml::escape::unescape(&raw)
            .map(|v| v.to_string())
            .unwrap_or(raw);
        attributes.push((key, value));
    }
    Ok(XmlElement {
        name: String::from_utf8_lossy(e.name().as_ref()).to_string(),
        attributes,
        ..XmlElement::default()
    })
}

fn close_element(
    el: XmlElement,
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
) -> Result<(), ParseError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(el),
        None if root.is_none() => *root = Some(el),
        None => {
            return Err(ParseError::XmlStructure(format!(
                "multiple root elements (found <{}>)",
                el.name
            )))
        }
    }
    Ok(())
}

/// Resolve `&name;` (without the delimiters) to its text.
fn resolve_reference(name: &str) -> Result<String, ParseError> {
    if let Some(code) = name.strip_prefix('#') {
        let parsed = match code.strip_prefix('x').or_else(|| code.strip_prefix('X')) {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => code.parse::<u32>().ok(),
        };
        return parsed
            .and_then(char::from_u32)
            .map(String::from)
            .ok_or_else(|| ParseError::XmlStructure(format!("invalid character reference &{name};")));
    }
    quick_xml::escape::resolve_predefined_entity(name)
        .map(String::from)
        .ok_or_else(|| ParseError::XmlStructure(format!("unknown entity &{name};")))
}
