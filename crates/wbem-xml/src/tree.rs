//! Ordered XML element tree
//!
//! The parser keeps element order and text verbatim, then drops the
//! whitespace-only text that merely separates sibling elements. XML
//! declarations, comments, processing instructions and doctypes carry no
//! payload and are skipped.

use crate::error::{XmlParseError, XmlResult};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::BTreeMap;
use tracing::trace;

/// A child of an element
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
}

/// An element with its attributes and ordered children
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct XmlElement {
    pub name: String,
    /// Attributes keyed by name; declaration order is not significant
    pub attributes: BTreeMap<String, String>,
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Child elements, skipping text
    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|child| match child {
            XmlNode::Element(element) => Some(element),
            XmlNode::Text(_) => None,
        })
    }

    /// First child element with the given name
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.elements().find(|element| element.name == name)
    }

    /// Concatenated text of the direct text children
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|child| match child {
                XmlNode::Text(text) => Some(text.as_str()),
                XmlNode::Element(_) => None,
            })
            .collect()
    }

    fn has_element_children(&self) -> bool {
        self.elements().next().is_some()
    }

    /// Drop whitespace between sibling elements, recursively
    fn normalize(&mut self) {
        if self.has_element_children() {
            self.children.retain_mut(|child| match child {
                XmlNode::Text(text) => {
                    let trimmed = text.trim();
                    if trimmed.len() != text.len() {
                        *text = trimmed.to_string();
                    }
                    !text.is_empty()
                }
                XmlNode::Element(_) => true,
            });
        }
        for child in &mut self.children {
            if let XmlNode::Element(element) = child {
                element.normalize();
            }
        }
    }
}

/// Parse a document into its root element
pub fn parse(xml: &str) -> XmlResult<XmlElement> {
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        let position = reader.buffer_position() as u64;
        let event = reader
            .read_event()
            .map_err(|e| XmlParseError::new(reader.error_position() as u64, e.to_string()))?;

        match event {
            Event::Start(start) => {
                stack.push(element_from(&start, position)?);
            }
            Event::Empty(start) => {
                let element = element_from(&start, position)?;
                attach(&mut stack, &mut root, element, position)?;
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| XmlParseError::new(position, "unmatched end tag"))?;
                attach(&mut stack, &mut root, element, position)?;
            }
            Event::Text(text) => {
                let text = text
                    .unescape()
                    .map_err(|e| XmlParseError::new(position, e.to_string()))?;
                push_text(&mut stack, &text, position)?;
            }
            Event::CData(data) => {
                let data = data.into_inner();
                let text = std::str::from_utf8(&data)
                    .map_err(|e| XmlParseError::new(position, e.to_string()))?;
                push_text(&mut stack, text, position)?;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(XmlParseError::new(
            xml.len() as u64,
            format!("unclosed element <{}>", open.name),
        ));
    }

    let mut root = root.ok_or_else(|| XmlParseError::new(0, "document has no root element"))?;
    root.normalize();
    trace!(root = %root.name, "Parsed XML document");
    Ok(root)
}

fn element_from(start: &BytesStart<'_>, position: u64) -> XmlResult<XmlElement> {
    let name = std::str::from_utf8(start.name().as_ref())
        .map_err(|e| XmlParseError::new(position, e.to_string()))?
        .to_string();

    let mut attributes = BTreeMap::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| XmlParseError::new(position, e.to_string()))?;
        let key = std::str::from_utf8(attr.key.as_ref())
            .map_err(|e| XmlParseError::new(position, e.to_string()))?
            .to_string();
        let value = attr
            .unescape_value()
            .map_err(|e| XmlParseError::new(position, e.to_string()))?
            .into_owned();
        attributes.insert(key, value);
    }

    Ok(XmlElement {
        name,
        attributes,
        children: Vec::new(),
    })
}

fn attach(
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    element: XmlElement,
    position: u64,
) -> XmlResult<()> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(XmlNode::Element(element));
        return Ok(());
    }
    if root.is_some() {
        return Err(XmlParseError::new(
            position,
            format!("second root element <{}>", element.name),
        ));
    }
    *root = Some(element);
    Ok(())
}

fn push_text(stack: &mut [XmlElement], text: &str, position: u64) -> XmlResult<()> {
    let Some(parent) = stack.last_mut() else {
        if text.trim().is_empty() {
            return Ok(());
        }
        return Err(XmlParseError::new(position, "text outside of the root element"));
    };

    // Adjacent text and CDATA sections form one text value
    if let Some(XmlNode::Text(previous)) = parent.children.last_mut() {
        previous.push_str(text);
    } else {
        parent.children.push(XmlNode::Text(text.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_tree() {
        let root = parse(r#"<?xml version="1.0" encoding="utf-8" ?><CIM CIMVERSION="2.0" DTDVERSION="2.0"><MESSAGE ID="1001"/></CIM>"#).unwrap();

        assert_eq!(root.name, "CIM");
        assert_eq!(root.attribute("CIMVERSION"), Some("2.0"));
        let message = root.child("MESSAGE").unwrap();
        assert_eq!(message.attribute("ID"), Some("1001"));
        assert!(message.children.is_empty());
    }

    #[test]
    fn test_inter_element_whitespace_is_dropped() {
        let root = parse("<A>\n  <B/>\n  <C/>\n</A>").unwrap();
        assert_eq!(root.children.len(), 2);
    }

    #[test]
    fn test_leaf_text_is_kept_verbatim() {
        let root = parse("<VALUE>  Fritz Town \n</VALUE>").unwrap();
        assert_eq!(root.text(), "  Fritz Town \n");
    }

    #[test]
    fn test_entities_and_cdata_are_unescaped() {
        let root = parse("<V>a &lt; b<![CDATA[ & c]]></V>").unwrap();
        assert_eq!(root.text(), "a < b & c");
    }

    #[test]
    fn test_mismatched_end_tag() {
        assert!(parse("<A><B></A>").is_err());
    }

    #[test]
    fn test_unclosed_element() {
        assert!(parse("<A><B/>").is_err());
    }

    #[test]
    fn test_two_roots() {
        assert!(parse("<A/><B/>").is_err());
    }

    #[test]
    fn test_empty_document() {
        assert!(parse("   ").is_err());
    }

    #[test]
    fn test_text_outside_root() {
        assert!(parse("junk<A/>").is_err());
    }
}
