// crates/opc2aml-rs-nodeset/src/xml.rs

//! Minimal generic XML element tree.
//!
//! NodeSet2 `<Value>` payloads are dynamically typed (the element names inside
//! depend on the node's DataType), so the serde deserializer cannot describe
//! them statically. The whole document is therefore read through the
//! `quick-xml` event `Reader` into this tree and interpreted afterwards.

use crate::error::NodeSetError;
use log::warn;
use quick_xml::Reader;
use quick_xml::escape::{escape, unescape};
use quick_xml::events::Event;
use std::fmt::Write;

/// One XML element: local name, attributes, child elements and text content.
///
/// Namespace prefixes are stripped from element and attribute names; NodeSet2
/// files mix `uax:`-prefixed and unprefixed payload elements freely.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlElement>,
    pub text: String,
}

impl XmlElement {
    /// Parses an XML document and returns its root element.
    pub fn parse(xml: &str) -> Result<XmlElement, NodeSetError> {
        let mut reader = Reader::from_str(xml);
        let mut stack: Vec<XmlElement> = Vec::new();

        loop {
            match reader.read_event() {
                Err(e) => return Err(e.into()),
                Ok(Event::Eof) => break,
                Ok(Event::Start(start)) => {
                    stack.push(element_from_start(&start)?);
                }
                Ok(Event::Empty(start)) => {
                    let element = element_from_start(&start)?;
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(element),
                        None => return Ok(element),
                    }
                }
                Ok(Event::End(_)) => {
                    let mut done = match stack.pop() {
                        Some(e) => e,
                        None => {
                            return Err(NodeSetError::MissingElement {
                                element: "document root",
                            });
                        }
                    };
                    // Drop indentation-only text around child elements.
                    if !done.children.is_empty() && done.text.trim().is_empty() {
                        done.text.clear();
                    }
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(done),
                        None => return Ok(done),
                    }
                }
                Ok(Event::Text(t)) => {
                    if let Some(current) = stack.last_mut() {
                        let raw = String::from_utf8_lossy(t.as_ref()).into_owned();
                        current.text.push_str(&unescape_text(&raw));
                    }
                }
                Ok(Event::CData(t)) => {
                    if let Some(current) = stack.last_mut() {
                        current
                            .text
                            .push_str(&String::from_utf8_lossy(t.into_inner().as_ref()));
                    }
                }
                // Declarations, comments, PIs and doctypes carry no node data.
                Ok(_) => {}
            }
        }

        Err(NodeSetError::MissingElement {
            element: "document root",
        })
    }

    /// Returns an attribute value by local name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns the first child element with the given local name.
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Returns all child elements with the given local name, in document order.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Returns the text of the first child with the given local name.
    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name).map(|c| c.text.as_str())
    }

    /// Serializes this element (and its subtree) back to markup.
    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        self.write_xml(&mut out);
        out
    }

    /// Serializes only the element's content, used to preserve `XmlElement`
    /// values verbatim as strings.
    pub fn inner_xml(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            child.write_xml(&mut out);
        }
        out.push_str(escape(self.text.as_str()).as_ref());
        out
    }

    fn write_xml(&self, out: &mut String) {
        let _ = write!(out, "<{}", self.name);
        for (k, v) in &self.attributes {
            let _ = write!(out, " {}=\"{}\"", k, escape(v.as_str()));
        }
        if self.children.is_empty() && self.text.is_empty() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        for child in &self.children {
            child.write_xml(out);
        }
        out.push_str(escape(self.text.as_str()).as_ref());
        let _ = write!(out, "</{}>", self.name);
    }
}

fn element_from_start(
    start: &quick_xml::events::BytesStart<'_>,
) -> Result<XmlElement, NodeSetError> {
    let name = local_name(start.name().as_ref());
    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr?;
        let key = local_name(attr.key.as_ref());
        let raw = String::from_utf8_lossy(attr.value.as_ref()).into_owned();
        attributes.push((key, unescape_text(&raw)));
    }
    Ok(XmlElement {
        name,
        attributes,
        children: Vec::new(),
        text: String::new(),
    })
}

/// Strips a namespace prefix (`uax:String` becomes `String`).
fn local_name(qname: &[u8]) -> String {
    let name = String::from_utf8_lossy(qname);
    match name.rsplit_once(':') {
        Some((_, local)) => local.to_string(),
        None => name.into_owned(),
    }
}

/// Decodes XML entities, keeping the raw text when a stray `&` slips through.
/// Vendor-exported NodeSet2 files occasionally contain unescaped ampersands.
fn unescape_text(raw: &str) -> String {
    match unescape(raw) {
        Ok(s) => s.into_owned(),
        Err(e) => {
            warn!("Keeping text with invalid XML escape ({}): {}", e, raw);
            raw.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::XmlElement;

    #[test]
    fn test_parse_nested_elements() {
        let root = XmlElement::parse(
            r#"<A x="1"><B>hello</B><B>world</B><C y="2&amp;3"/></A>"#,
        )
        .expect("parse failed");

        assert_eq!(root.name, "A");
        assert_eq!(root.attribute("x"), Some("1"));
        assert_eq!(root.children_named("B").count(), 2);
        assert_eq!(root.child_text("B"), Some("hello"));
        assert_eq!(root.child("C").unwrap().attribute("y"), Some("2&3"));
    }

    #[test]
    fn test_prefixes_are_stripped() {
        let root = XmlElement::parse(
            r#"<uax:ListOfInt32 xmlns:uax="http://x"><uax:Int32>7</uax:Int32></uax:ListOfInt32>"#,
        )
        .expect("parse failed");
        assert_eq!(root.name, "ListOfInt32");
        assert_eq!(root.child_text("Int32"), Some("7"));
    }

    #[test]
    fn test_indentation_text_is_dropped() {
        let root = XmlElement::parse("<A>\n  <B>x</B>\n</A>").expect("parse failed");
        assert!(root.text.is_empty());
        assert_eq!(root.child_text("B"), Some("x"));
    }

    #[test]
    fn test_inner_xml_round_trip() {
        let root =
            XmlElement::parse(r#"<X><p a="1"><q>t</q></p></X>"#).expect("parse failed");
        assert_eq!(root.inner_xml(), r#"<p a="1"><q>t</q></p>"#);
    }

    #[test]
    fn test_malformed_document_is_an_error() {
        assert!(XmlElement::parse("<A><B>unclosed").is_err());
        assert!(XmlElement::parse("   ").is_err());
    }
}
