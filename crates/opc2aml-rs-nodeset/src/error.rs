// crates/opc2aml-rs-nodeset/src/error.rs

use core::num::{ParseFloatError, ParseIntError};
use std::fmt;

/// Errors that can occur while parsing a NodeSet2 file into an address space.
#[derive(Debug)]
pub enum NodeSetError {
    /// An error from the underlying `quick-xml` reader.
    XmlParsing(quick_xml::Error),

    /// An XML attribute could not be read (duplicate, malformed, bad escape).
    XmlAttribute(quick_xml::events::attributes::AttrError),

    /// A required XML element was missing (e.g., UANodeSet).
    MissingElement { element: &'static str },

    /// A required attribute was missing (e.g., @NodeId).
    MissingAttribute { attribute: &'static str },

    /// A NodeId string did not match any of the `i=`/`s=`/`g=`/`b=` forms.
    InvalidNodeId(String),

    /// A node referred to a namespace index the file never declared.
    UnknownNamespaceIndex(u16),

    /// An alias was used but never declared in the `<Aliases>` table.
    UnknownAlias(String),

    /// A numeric attribute or value had an invalid format.
    InvalidNumber(String),

    /// A base64 payload (opaque id or ByteString) failed to decode.
    Base64(base64::DecodeError),

    /// A guid payload was not a valid hyphenated UUID.
    Guid(uuid::Error),
}

impl From<quick_xml::Error> for NodeSetError {
    fn from(e: quick_xml::Error) -> Self {
        NodeSetError::XmlParsing(e)
    }
}

impl From<quick_xml::events::attributes::AttrError> for NodeSetError {
    fn from(e: quick_xml::events::attributes::AttrError) -> Self {
        NodeSetError::XmlAttribute(e)
    }
}

impl From<base64::DecodeError> for NodeSetError {
    fn from(e: base64::DecodeError) -> Self {
        NodeSetError::Base64(e)
    }
}

impl From<uuid::Error> for NodeSetError {
    fn from(e: uuid::Error) -> Self {
        NodeSetError::Guid(e)
    }
}

impl From<ParseIntError> for NodeSetError {
    fn from(e: ParseIntError) -> Self {
        NodeSetError::InvalidNumber(e.to_string())
    }
}

impl From<ParseFloatError> for NodeSetError {
    fn from(e: ParseFloatError) -> Self {
        NodeSetError::InvalidNumber(e.to_string())
    }
}

impl fmt::Display for NodeSetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeSetError::XmlParsing(e) => write!(f, "XML parsing error: {}", e),
            NodeSetError::XmlAttribute(e) => write!(f, "XML attribute error: {}", e),
            NodeSetError::MissingElement { element } => {
                write!(f, "Missing required XML element: {}", element)
            }
            NodeSetError::MissingAttribute { attribute } => {
                write!(f, "Missing required attribute: {}", attribute)
            }
            NodeSetError::InvalidNodeId(s) => write!(f, "Invalid NodeId string: {}", s),
            NodeSetError::UnknownNamespaceIndex(i) => {
                write!(f, "Namespace index {} is not declared in the file", i)
            }
            NodeSetError::UnknownAlias(a) => write!(f, "Undeclared alias: {}", a),
            NodeSetError::InvalidNumber(s) => write!(f, "Invalid numeric value: {}", s),
            NodeSetError::Base64(e) => write!(f, "Base64 decoding error: {}", e),
            NodeSetError::Guid(e) => write!(f, "Guid parsing error: {}", e),
        }
    }
}

impl std::error::Error for NodeSetError {}

#[cfg(test)]
mod tests {
    use super::NodeSetError;
    use base64::Engine;

    #[test]
    fn test_from_base64_error() {
        let b64_err = base64::engine::general_purpose::STANDARD
            .decode("!not base64!")
            .unwrap_err();
        let err: NodeSetError = b64_err.into();
        assert!(matches!(err, NodeSetError::Base64(_)));
    }

    #[test]
    fn test_from_uuid_error() {
        let uuid_err = "not-a-guid".parse::<uuid::Uuid>().unwrap_err();
        let err: NodeSetError = uuid_err.into();
        assert!(matches!(err, NodeSetError::Guid(_)));
    }

    #[test]
    fn test_from_parse_int_error() {
        let parse_err = "not a number".parse::<u32>().unwrap_err();
        let err: NodeSetError = parse_err.into();
        assert!(matches!(err, NodeSetError::InvalidNumber(_)));
    }

    #[test]
    fn test_display_invalid_node_id() {
        let err = NodeSetError::InvalidNodeId("x=12".into());
        assert_eq!(err.to_string(), "Invalid NodeId string: x=12");
    }
}
