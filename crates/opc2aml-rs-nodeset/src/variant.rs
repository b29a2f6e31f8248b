// crates/opc2aml-rs-nodeset/src/variant.rs

//! The `Variant` value union covering every OPC UA built-in type that can
//! appear inside a NodeSet2 `<Value>` payload, and the translation from the
//! generic element tree into it.
//!
//! Translation never fails: payloads that cannot be interpreted degrade to
//! `Variant::Opaque` carrying the raw text, so a single bad value inside a
//! large standard-defined file does not abort the load. The converter reports
//! such degradations when it encodes them.

use crate::types::NodeId;
use crate::types::{LocalizedText, QualifiedName};
use crate::xml::XmlElement;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use log::warn;
use uuid::Uuid;

/// The built-in type categories of OPC UA Part 6, Section 5.1.2.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltInType {
    Boolean,
    SByte,
    Byte,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Float,
    Double,
    String,
    DateTime,
    Guid,
    ByteString,
    XmlElement,
    NodeId,
    ExpandedNodeId,
    StatusCode,
    QualifiedName,
    LocalizedText,
    Structure,
    DataValue,
    BaseDataType,
    DiagnosticInfo,
    Enumeration,
}

impl BuiltInType {
    /// Maps a ns=0 numeric data-type id to its built-in category.
    pub fn from_id(id: u32) -> Option<BuiltInType> {
        use crate::types::*;
        match id {
            ID_BOOLEAN => Some(BuiltInType::Boolean),
            ID_SBYTE => Some(BuiltInType::SByte),
            ID_BYTE => Some(BuiltInType::Byte),
            ID_INT16 => Some(BuiltInType::Int16),
            ID_UINT16 => Some(BuiltInType::UInt16),
            ID_INT32 => Some(BuiltInType::Int32),
            ID_UINT32 => Some(BuiltInType::UInt32),
            ID_INT64 => Some(BuiltInType::Int64),
            ID_UINT64 => Some(BuiltInType::UInt64),
            ID_FLOAT => Some(BuiltInType::Float),
            ID_DOUBLE => Some(BuiltInType::Double),
            ID_STRING => Some(BuiltInType::String),
            ID_DATETIME => Some(BuiltInType::DateTime),
            ID_GUID => Some(BuiltInType::Guid),
            ID_BYTESTRING => Some(BuiltInType::ByteString),
            ID_XML_ELEMENT => Some(BuiltInType::XmlElement),
            ID_NODE_ID => Some(BuiltInType::NodeId),
            ID_EXPANDED_NODE_ID => Some(BuiltInType::ExpandedNodeId),
            ID_STATUS_CODE => Some(BuiltInType::StatusCode),
            ID_QUALIFIED_NAME => Some(BuiltInType::QualifiedName),
            ID_LOCALIZED_TEXT => Some(BuiltInType::LocalizedText),
            ID_STRUCTURE => Some(BuiltInType::Structure),
            ID_DATA_VALUE => Some(BuiltInType::DataValue),
            ID_BASE_DATA_TYPE => Some(BuiltInType::BaseDataType),
            ID_DIAGNOSTIC_INFO => Some(BuiltInType::DiagnosticInfo),
            ID_ENUMERATION => Some(BuiltInType::Enumeration),
            _ => None,
        }
    }

    /// Maps a payload element name (`Int32`, `LocalizedText`, ...) to its
    /// built-in category.
    pub fn from_element_name(name: &str) -> Option<BuiltInType> {
        match name {
            "Boolean" => Some(BuiltInType::Boolean),
            "SByte" => Some(BuiltInType::SByte),
            "Byte" => Some(BuiltInType::Byte),
            "Int16" => Some(BuiltInType::Int16),
            "UInt16" => Some(BuiltInType::UInt16),
            "Int32" => Some(BuiltInType::Int32),
            "UInt32" => Some(BuiltInType::UInt32),
            "Int64" => Some(BuiltInType::Int64),
            "UInt64" => Some(BuiltInType::UInt64),
            "Float" => Some(BuiltInType::Float),
            "Double" => Some(BuiltInType::Double),
            "String" => Some(BuiltInType::String),
            "DateTime" => Some(BuiltInType::DateTime),
            "Guid" => Some(BuiltInType::Guid),
            "ByteString" => Some(BuiltInType::ByteString),
            "XmlElement" => Some(BuiltInType::XmlElement),
            "NodeId" => Some(BuiltInType::NodeId),
            "ExpandedNodeId" => Some(BuiltInType::ExpandedNodeId),
            "StatusCode" => Some(BuiltInType::StatusCode),
            "QualifiedName" => Some(BuiltInType::QualifiedName),
            "LocalizedText" => Some(BuiltInType::LocalizedText),
            "ExtensionObject" => Some(BuiltInType::Structure),
            "DataValue" => Some(BuiltInType::DataValue),
            "Variant" => Some(BuiltInType::BaseDataType),
            "DiagnosticInfo" => Some(BuiltInType::DiagnosticInfo),
            _ => None,
        }
    }
}

/// A NodeId that may carry an absolute namespace URI instead of a table index.
/// (OPC UA Part 6, Section 5.3.1.11)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpandedNodeId {
    pub namespace_uri: Option<String>,
    pub node_id: NodeId,
}

/// An extension object: a type id plus the raw, still-uninterpreted body
/// fields. Bodies are resolved against `DataTypeDefinition`s when the value
/// is encoded, because the field layout depends on the (possibly derived)
/// concrete type.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtensionObject {
    /// The encoding id (`Default XML` object) or the data type id itself.
    pub type_id: NodeId,
    /// The single element inside `<Body>`, named after the concrete type.
    pub body: Option<XmlElement>,
}

/// The fixed fields of a DataValue wrapper. (OPC UA Part 4, Section 7.11)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataValueFields {
    pub value: Option<Box<Variant>>,
    pub status_code: Option<u32>,
    pub source_timestamp: Option<String>,
    pub server_timestamp: Option<String>,
    pub source_picoseconds: Option<u16>,
    pub server_picoseconds: Option<u16>,
}

/// A typed attribute value.
///
/// `DateTime` keeps its lexical ISO-8601 form verbatim so timestamps
/// round-trip byte-identically, offset included.
#[derive(Debug, Clone, PartialEq)]
pub enum Variant {
    Boolean(bool),
    SByte(i8),
    Byte(u8),
    Int16(i16),
    UInt16(u16),
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    Float(f32),
    Double(f64),
    String(String),
    DateTime(String),
    Guid(Uuid),
    ByteString(Vec<u8>),
    XmlElement(String),
    NodeId(NodeId),
    ExpandedNodeId(ExpandedNodeId),
    StatusCode(u32),
    QualifiedName(QualifiedName),
    LocalizedText(LocalizedText),
    DataValue(DataValueFields),
    Extension(ExtensionObject),
    List(Vec<Variant>),
    /// A payload that could not be interpreted; carries the raw text.
    Opaque(String),
}

impl Variant {
    /// Translates one payload element (`<Int32>`, `<ListOfString>`,
    /// `<ExtensionObject>`, ...) into a `Variant` by its element name.
    pub fn from_element(elem: &XmlElement) -> Variant {
        if let Some(item_name) = elem.name.strip_prefix("ListOf") {
            let items = elem
                .children_named(item_name)
                .map(Variant::from_element)
                .collect();
            return Variant::List(items);
        }
        match BuiltInType::from_element_name(&elem.name) {
            Some(builtin) => Variant::from_element_as(elem, builtin),
            None => {
                warn!("Unknown value payload element <{}>", elem.name);
                Variant::Opaque(elem.text.clone())
            }
        }
    }

    /// Translates an element whose built-in category is already known, e.g. a
    /// structure field element named after the field rather than the type.
    pub fn from_element_as(elem: &XmlElement, builtin: BuiltInType) -> Variant {
        let text = elem.text.as_str();
        match builtin {
            BuiltInType::Boolean => match text.trim() {
                "true" | "1" => Variant::Boolean(true),
                "false" | "0" | "" => Variant::Boolean(false),
                other => degraded(&elem.name, other),
            },
            BuiltInType::SByte => parse_int(elem, Variant::SByte),
            BuiltInType::Byte => parse_int(elem, Variant::Byte),
            BuiltInType::Int16 => parse_int(elem, Variant::Int16),
            BuiltInType::UInt16 => parse_int(elem, Variant::UInt16),
            BuiltInType::Int32 => parse_int(elem, Variant::Int32),
            BuiltInType::UInt32 => parse_int(elem, Variant::UInt32),
            BuiltInType::Int64 => parse_int(elem, Variant::Int64),
            BuiltInType::UInt64 => parse_int(elem, Variant::UInt64),
            BuiltInType::Float => match parse_float(text) {
                Some(v) => Variant::Float(v as f32),
                None => degraded(&elem.name, text),
            },
            BuiltInType::Double => match parse_float(text) {
                Some(v) => Variant::Double(v),
                None => degraded(&elem.name, text),
            },
            BuiltInType::String => Variant::String(text.to_string()),
            BuiltInType::DateTime => {
                let lexical = text.trim();
                // Kept verbatim so the offset round-trips; only sanity-checked.
                if !lexical.is_empty()
                    && chrono::DateTime::parse_from_rfc3339(lexical).is_err()
                {
                    warn!("DateTime value is not ISO 8601: {}", lexical);
                }
                Variant::DateTime(lexical.to_string())
            }
            BuiltInType::Guid => {
                // A Guid value wraps its text in a <String> child.
                let raw = elem.child_text("String").unwrap_or(text);
                match raw.trim().parse::<Uuid>() {
                    Ok(g) => Variant::Guid(g),
                    Err(_) => degraded(&elem.name, raw),
                }
            }
            BuiltInType::ByteString => {
                let compact: String = text.split_whitespace().collect();
                match BASE64.decode(compact.as_bytes()) {
                    Ok(bytes) => Variant::ByteString(bytes),
                    Err(_) => degraded(&elem.name, text),
                }
            }
            BuiltInType::XmlElement => Variant::XmlElement(elem.inner_xml()),
            BuiltInType::NodeId => match parse_node_id_payload(elem) {
                Some(id) => Variant::NodeId(id),
                None => Variant::NodeId(NodeId::null()),
            },
            BuiltInType::ExpandedNodeId => Variant::ExpandedNodeId(parse_expanded(elem)),
            BuiltInType::StatusCode => {
                let raw = elem.child_text("Code").unwrap_or(text);
                match raw.trim().parse::<u32>() {
                    Ok(code) => Variant::StatusCode(code),
                    Err(_) if raw.trim().is_empty() => Variant::StatusCode(0),
                    Err(_) => degraded(&elem.name, raw),
                }
            }
            BuiltInType::QualifiedName => {
                let namespace = elem
                    .child_text("NamespaceIndex")
                    .and_then(|t| t.trim().parse::<u16>().ok())
                    .unwrap_or(0);
                let name = elem.child_text("Name").unwrap_or("").to_string();
                Variant::QualifiedName(QualifiedName { namespace, name })
            }
            BuiltInType::LocalizedText => Variant::LocalizedText(LocalizedText {
                locale: elem.child_text("Locale").unwrap_or("").trim().to_string(),
                text: elem.child_text("Text").unwrap_or("").to_string(),
            }),
            BuiltInType::DataValue => Variant::DataValue(parse_data_value(elem)),
            BuiltInType::BaseDataType => {
                // A <Variant> wrapper nests its payload inside <Value>.
                match elem.child("Value").and_then(|v| v.children.first()) {
                    Some(inner) => Variant::from_element(inner),
                    None => parse_extension(elem),
                }
            }
            BuiltInType::Structure => parse_extension(elem),
            BuiltInType::DiagnosticInfo | BuiltInType::Enumeration => {
                // Interpreted later by the encoder, which has the type context.
                Variant::Opaque(text.to_string())
            }
        }
    }
}

fn degraded(element: &str, raw: &str) -> Variant {
    warn!("Degrading malformed <{}> payload to opaque text: {}", element, raw);
    Variant::Opaque(raw.to_string())
}

fn parse_int<T: std::str::FromStr>(elem: &XmlElement, wrap: fn(T) -> Variant) -> Variant {
    match elem.text.trim().parse::<T>() {
        Ok(v) => wrap(v),
        Err(_) => degraded(&elem.name, &elem.text),
    }
}

/// Parses the XML Schema float lexical space, including INF/-INF/NaN.
fn parse_float(text: &str) -> Option<f64> {
    match text.trim() {
        "INF" => Some(f64::INFINITY),
        "-INF" => Some(f64::NEG_INFINITY),
        "NaN" => Some(f64::NAN),
        other => other.parse::<f64>().ok(),
    }
}

fn parse_node_id_payload(elem: &XmlElement) -> Option<NodeId> {
    let raw = elem.child_text("Identifier")?.trim();
    if raw.is_empty() {
        return Some(NodeId::null());
    }
    match NodeId::parse(raw) {
        Ok(id) => Some(id),
        Err(e) => {
            warn!("Malformed NodeId value payload: {}", e);
            None
        }
    }
}

fn parse_expanded(elem: &XmlElement) -> ExpandedNodeId {
    let raw = elem.child_text("Identifier").unwrap_or("").trim().to_string();
    // Strip an optional server index, then split off an optional nsu= part.
    let without_server = match raw.strip_prefix("svr=") {
        Some(tail) => tail.split_once(';').map(|(_, r)| r).unwrap_or(""),
        None => raw.as_str(),
    };
    let (namespace_uri, rest) = match without_server.strip_prefix("nsu=") {
        Some(tail) => match tail.split_once(';') {
            Some((uri, rest)) => (Some(uri.to_string()), rest),
            None => (Some(tail.to_string()), ""),
        },
        None => (None, without_server),
    };
    let node_id = if rest.is_empty() {
        NodeId::null()
    } else {
        NodeId::parse(rest).unwrap_or_else(|e| {
            warn!("Malformed ExpandedNodeId value payload: {}", e);
            NodeId::null()
        })
    };
    ExpandedNodeId {
        namespace_uri,
        node_id,
    }
}

fn parse_data_value(elem: &XmlElement) -> DataValueFields {
    let value = elem
        .child("Value")
        .and_then(|v| v.children.first())
        .map(|inner| Box::new(Variant::from_element(inner)));
    let status_code = elem
        .child("StatusCode")
        .and_then(|sc| sc.child_text("Code"))
        .and_then(|t| t.trim().parse::<u32>().ok());
    DataValueFields {
        value,
        status_code,
        source_timestamp: elem.child_text("SourceTimestamp").map(|t| t.trim().to_string()),
        server_timestamp: elem.child_text("ServerTimestamp").map(|t| t.trim().to_string()),
        source_picoseconds: elem
            .child_text("SourcePicoseconds")
            .and_then(|t| t.trim().parse::<u16>().ok()),
        server_picoseconds: elem
            .child_text("ServerPicoseconds")
            .and_then(|t| t.trim().parse::<u16>().ok()),
    }
}

fn parse_extension(elem: &XmlElement) -> Variant {
    if elem.name != "ExtensionObject" {
        // A structure field embedded without the ExtensionObject wrapper;
        // keep it raw under a null type id and let the encoder resolve it.
        return Variant::Extension(ExtensionObject {
            type_id: NodeId::null(),
            body: Some(elem.clone()),
        });
    }
    let type_id = elem
        .child("TypeId")
        .and_then(|t| t.child_text("Identifier"))
        .and_then(|raw| NodeId::parse(raw.trim()).ok())
        .unwrap_or_else(NodeId::null);
    let body = elem
        .child("Body")
        .and_then(|b| b.children.first())
        .cloned();
    Variant::Extension(ExtensionObject { type_id, body })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Identifier;

    fn parse_payload(xml: &str) -> Variant {
        let elem = XmlElement::parse(xml).expect("fixture XML must parse");
        Variant::from_element(&elem)
    }

    #[test]
    fn test_scalar_payloads() {
        assert_eq!(parse_payload("<Boolean>true</Boolean>"), Variant::Boolean(true));
        assert_eq!(parse_payload("<Int32>-42</Int32>"), Variant::Int32(-42));
        assert_eq!(parse_payload("<UInt64>18446744073709551615</UInt64>"), Variant::UInt64(u64::MAX));
        assert_eq!(parse_payload("<Float>123.456</Float>"), Variant::Float(123.456));
        assert_eq!(parse_payload("<Double>-INF</Double>"), Variant::Double(f64::NEG_INFINITY));
        assert_eq!(
            parse_payload("<String>hello world</String>"),
            Variant::String("hello world".into())
        );
    }

    #[test]
    fn test_date_time_keeps_lexical_form() {
        let v = parse_payload("<DateTime>2023-09-13T14:39:08-06:00</DateTime>");
        assert_eq!(v, Variant::DateTime("2023-09-13T14:39:08-06:00".into()));
    }

    #[test]
    fn test_byte_string_decodes_base64() {
        assert_eq!(
            parse_payload("<ByteString>AQID</ByteString>"),
            Variant::ByteString(vec![1, 2, 3])
        );
    }

    #[test]
    fn test_guid_wraps_string_child() {
        let v = parse_payload(
            "<Guid><String>09087e75-8e5e-499b-954f-f2a9603db28a</String></Guid>",
        );
        match v {
            Variant::Guid(g) => assert_eq!(g.to_string(), "09087e75-8e5e-499b-954f-f2a9603db28a"),
            other => panic!("Expected Guid, got {:?}", other),
        }
    }

    #[test]
    fn test_node_id_payload() {
        let v = parse_payload("<NodeId><Identifier>ns=2;s=StringNodeId</Identifier></NodeId>");
        match v {
            Variant::NodeId(id) => {
                assert_eq!(id.namespace, 2);
                assert_eq!(id.identifier, Identifier::String("StringNodeId".into()));
            }
            other => panic!("Expected NodeId, got {:?}", other),
        }
    }

    #[test]
    fn test_expanded_node_id_with_uri() {
        let v = parse_payload(
            "<ExpandedNodeId><Identifier>nsu=http://example.com/UA/;i=12</Identifier></ExpandedNodeId>",
        );
        match v {
            Variant::ExpandedNodeId(e) => {
                assert_eq!(e.namespace_uri.as_deref(), Some("http://example.com/UA/"));
                assert_eq!(e.node_id.identifier, Identifier::Numeric(12));
            }
            other => panic!("Expected ExpandedNodeId, got {:?}", other),
        }
    }

    #[test]
    fn test_list_payload() {
        let v = parse_payload(
            "<ListOfInt32><Int32>1</Int32><Int32>2</Int32><Int32>3</Int32></ListOfInt32>",
        );
        assert_eq!(
            v,
            Variant::List(vec![Variant::Int32(1), Variant::Int32(2), Variant::Int32(3)])
        );
    }

    #[test]
    fn test_localized_text_payload() {
        let v = parse_payload("<LocalizedText><Locale>de</Locale><Text>Hallo</Text></LocalizedText>");
        assert_eq!(v, Variant::LocalizedText(LocalizedText::new("de", "Hallo")));
    }

    #[test]
    fn test_extension_object_keeps_raw_body() {
        let v = parse_payload(
            "<ExtensionObject><TypeId><Identifier>i=297</Identifier></TypeId>\
             <Body><Argument><Name>In</Name></Argument></Body></ExtensionObject>",
        );
        match v {
            Variant::Extension(ext) => {
                assert_eq!(ext.type_id, NodeId::numeric(0, 297));
                let body = ext.body.expect("body missing");
                assert_eq!(body.name, "Argument");
                assert_eq!(body.child_text("Name"), Some("In"));
            }
            other => panic!("Expected Extension, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_scalar_degrades_to_opaque() {
        assert_eq!(
            parse_payload("<Int32>not a number</Int32>"),
            Variant::Opaque("not a number".into())
        );
        assert_eq!(
            parse_payload("<NoSuchType>x</NoSuchType>"),
            Variant::Opaque("x".into())
        );
    }

    #[test]
    fn test_data_value_wrapper() {
        let v = parse_payload(
            "<DataValue><Value><Int16>7</Int16></Value>\
             <StatusCode><Code>2153840640</Code></StatusCode>\
             <SourceTimestamp>2023-01-01T00:00:00Z</SourceTimestamp></DataValue>",
        );
        match v {
            Variant::DataValue(dv) => {
                assert_eq!(dv.value.as_deref(), Some(&Variant::Int16(7)));
                assert_eq!(dv.status_code, Some(2_153_840_640));
                assert_eq!(dv.source_timestamp.as_deref(), Some("2023-01-01T00:00:00Z"));
                assert_eq!(dv.server_picoseconds, None);
            }
            other => panic!("Expected DataValue, got {:?}", other),
        }
    }
}
