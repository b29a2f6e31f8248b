// crates/opc2aml-rs-nodeset/src/types.rs

//! Core OPC UA identifier and naming types shared by the parser and the
//! address-space graph.

use crate::error::NodeSetError;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use std::fmt;
use uuid::Uuid;

/// The OPC UA base namespace, always present at namespace index 0.
/// (OPC UA Part 6, Section F.1: index 0 is implied and never listed.)
pub const BASE_NAMESPACE_URI: &str = "http://opcfoundation.org/UA/";

// --- Well-known ns=0 numeric ids (OPC UA Part 6, Annex A) ---
// Data types

/// Boolean built-in type.
pub const ID_BOOLEAN: u32 = 1;
/// SByte built-in type (8-bit signed).
pub const ID_SBYTE: u32 = 2;
/// Byte built-in type (8-bit unsigned).
pub const ID_BYTE: u32 = 3;
/// Int16 built-in type.
pub const ID_INT16: u32 = 4;
/// UInt16 built-in type.
pub const ID_UINT16: u32 = 5;
/// Int32 built-in type.
pub const ID_INT32: u32 = 6;
/// UInt32 built-in type.
pub const ID_UINT32: u32 = 7;
/// Int64 built-in type.
pub const ID_INT64: u32 = 8;
/// UInt64 built-in type.
pub const ID_UINT64: u32 = 9;
/// Float built-in type.
pub const ID_FLOAT: u32 = 10;
/// Double built-in type.
pub const ID_DOUBLE: u32 = 11;
/// String built-in type.
pub const ID_STRING: u32 = 12;
/// DateTime built-in type.
pub const ID_DATETIME: u32 = 13;
/// Guid built-in type.
pub const ID_GUID: u32 = 14;
/// ByteString built-in type.
pub const ID_BYTESTRING: u32 = 15;
/// XmlElement built-in type.
pub const ID_XML_ELEMENT: u32 = 16;
/// NodeId built-in type.
pub const ID_NODE_ID: u32 = 17;
/// ExpandedNodeId built-in type.
pub const ID_EXPANDED_NODE_ID: u32 = 18;
/// StatusCode built-in type.
pub const ID_STATUS_CODE: u32 = 19;
/// QualifiedName built-in type.
pub const ID_QUALIFIED_NAME: u32 = 20;
/// LocalizedText built-in type.
pub const ID_LOCALIZED_TEXT: u32 = 21;
/// Structure abstract base type.
pub const ID_STRUCTURE: u32 = 22;
/// DataValue wrapper type.
pub const ID_DATA_VALUE: u32 = 23;
/// BaseDataType abstract root.
pub const ID_BASE_DATA_TYPE: u32 = 24;
/// DiagnosticInfo type.
pub const ID_DIAGNOSTIC_INFO: u32 = 25;
/// Enumeration abstract base type.
pub const ID_ENUMERATION: u32 = 29;
/// Duration type (a Double subtype, OPC UA Part 3, Section 8.13).
pub const ID_DURATION: u32 = 290;

// Reference types

/// References abstract root reference type.
pub const ID_REFERENCES: u32 = 31;
/// NonHierarchicalReferences abstract reference type.
pub const ID_NON_HIERARCHICAL_REFERENCES: u32 = 32;
/// HierarchicalReferences abstract reference type; the ancestor that makes a
/// reference type hierarchical (OPC UA Part 3, Section 7.2).
pub const ID_HIERARCHICAL_REFERENCES: u32 = 33;
/// HasChild abstract reference type.
pub const ID_HAS_CHILD: u32 = 34;
/// Organizes reference type.
pub const ID_ORGANIZES: u32 = 35;
/// HasEventSource reference type.
pub const ID_HAS_EVENT_SOURCE: u32 = 36;
/// HasModellingRule reference type.
pub const ID_HAS_MODELLING_RULE: u32 = 37;
/// HasEncoding reference type (data type to encoding object).
pub const ID_HAS_ENCODING: u32 = 38;
/// HasDescription reference type.
pub const ID_HAS_DESCRIPTION: u32 = 39;
/// HasTypeDefinition reference type (instance to its type).
pub const ID_HAS_TYPE_DEFINITION: u32 = 40;
/// GeneratesEvent reference type.
pub const ID_GENERATES_EVENT: u32 = 41;
/// Aggregates abstract reference type.
pub const ID_AGGREGATES: u32 = 44;
/// HasSubtype reference type (type inheritance).
pub const ID_HAS_SUBTYPE: u32 = 45;
/// HasProperty reference type.
pub const ID_HAS_PROPERTY: u32 = 46;
/// HasComponent reference type.
pub const ID_HAS_COMPONENT: u32 = 47;
/// HasNotifier reference type.
pub const ID_HAS_NOTIFIER: u32 = 48;
/// HasOrderedComponent reference type.
pub const ID_HAS_ORDERED_COMPONENT: u32 = 49;
/// HasHistoricalConfiguration reference type.
pub const ID_HAS_HISTORICAL_CONFIGURATION: u32 = 56;

// Standard objects

/// The Root folder object.
pub const ID_ROOT_FOLDER: u32 = 84;
/// The Objects folder object.
pub const ID_OBJECTS_FOLDER: u32 = 85;
/// The Types folder object.
pub const ID_TYPES_FOLDER: u32 = 86;

/// Fallback facts about a base reference type, used when the working set does
/// not include the ns=0 file that defines it.
#[derive(Debug, Clone, Copy)]
pub struct WellKnownReference {
    pub id: u32,
    pub name: &'static str,
    /// The registered inverse name, when the type declares one.
    pub inverse: Option<&'static str>,
    /// Whether the type descends from HierarchicalReferences.
    pub hierarchical: bool,
}

/// The base reference types of OPC UA Part 3, Section 7 with their inverse
/// names. Subtype ancestry is resolved from the loaded graph when the defining
/// node is present; this table is only the fallback.
pub const WELL_KNOWN_REFERENCES: &[WellKnownReference] = &[
    WellKnownReference { id: ID_REFERENCES, name: "References", inverse: None, hierarchical: false },
    WellKnownReference { id: ID_NON_HIERARCHICAL_REFERENCES, name: "NonHierarchicalReferences", inverse: None, hierarchical: false },
    WellKnownReference { id: ID_HIERARCHICAL_REFERENCES, name: "HierarchicalReferences", inverse: None, hierarchical: true },
    WellKnownReference { id: ID_HAS_CHILD, name: "HasChild", inverse: Some("ChildOf"), hierarchical: true },
    WellKnownReference { id: ID_ORGANIZES, name: "Organizes", inverse: Some("OrganizedBy"), hierarchical: true },
    WellKnownReference { id: ID_HAS_EVENT_SOURCE, name: "HasEventSource", inverse: Some("EventSourceOf"), hierarchical: true },
    WellKnownReference { id: ID_HAS_MODELLING_RULE, name: "HasModellingRule", inverse: Some("ModellingRuleOf"), hierarchical: false },
    WellKnownReference { id: ID_HAS_ENCODING, name: "HasEncoding", inverse: Some("EncodingOf"), hierarchical: false },
    WellKnownReference { id: ID_HAS_DESCRIPTION, name: "HasDescription", inverse: Some("DescriptionOf"), hierarchical: false },
    WellKnownReference { id: ID_HAS_TYPE_DEFINITION, name: "HasTypeDefinition", inverse: Some("TypeDefinitionOf"), hierarchical: false },
    WellKnownReference { id: ID_GENERATES_EVENT, name: "GeneratesEvent", inverse: Some("GeneratedBy"), hierarchical: false },
    WellKnownReference { id: ID_AGGREGATES, name: "Aggregates", inverse: Some("AggregatedBy"), hierarchical: true },
    WellKnownReference { id: ID_HAS_SUBTYPE, name: "HasSubtype", inverse: Some("SubtypeOf"), hierarchical: true },
    WellKnownReference { id: ID_HAS_PROPERTY, name: "HasProperty", inverse: Some("PropertyOf"), hierarchical: true },
    WellKnownReference { id: ID_HAS_COMPONENT, name: "HasComponent", inverse: Some("ComponentOf"), hierarchical: true },
    WellKnownReference { id: ID_HAS_NOTIFIER, name: "HasNotifier", inverse: Some("NotifierOf"), hierarchical: true },
    WellKnownReference { id: ID_HAS_ORDERED_COMPONENT, name: "HasOrderedComponent", inverse: Some("OrderedComponentOf"), hierarchical: true },
    WellKnownReference { id: ID_HAS_HISTORICAL_CONFIGURATION, name: "HasHistoricalConfiguration", inverse: Some("HistoricalConfigurationOf"), hierarchical: true },
];

/// Looks up the fallback table by ns=0 numeric id.
pub fn well_known_reference(id: u32) -> Option<&'static WellKnownReference> {
    WELL_KNOWN_REFERENCES.iter().find(|r| r.id == id)
}

/// The identifier part of a NodeId, one of the four wire kinds.
/// (OPC UA Part 6, Section 5.3.1.10)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Identifier {
    /// `i=...`
    Numeric(u32),
    /// `s=...`
    String(String),
    /// `g=...`
    Guid(Uuid),
    /// `b=...` (base64 on the wire)
    Opaque(Vec<u8>),
}

/// A namespace-qualified node identifier.
///
/// The namespace index is file-local until the owning `AddressSpace` remaps it
/// during a merge; all lookups go through the space's namespace table.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId {
    pub namespace: u16,
    pub identifier: Identifier,
}

impl NodeId {
    /// A ns=0 numeric id, the common case for standard-defined nodes.
    pub fn numeric(namespace: u16, value: u32) -> Self {
        NodeId {
            namespace,
            identifier: Identifier::Numeric(value),
        }
    }

    /// A string id.
    pub fn string(namespace: u16, value: impl Into<String>) -> Self {
        NodeId {
            namespace,
            identifier: Identifier::String(value.into()),
        }
    }

    /// The null NodeId (`ns=0;i=0`), serialized in minimized empty form.
    pub fn null() -> Self {
        NodeId::numeric(0, 0)
    }

    pub fn is_null(&self) -> bool {
        self.namespace == 0 && self.identifier == Identifier::Numeric(0)
    }

    /// True for a ns=0 numeric id equal to `value`.
    pub fn is_base(&self, value: u32) -> bool {
        self.namespace == 0 && self.identifier == Identifier::Numeric(value)
    }

    /// Parses the textual forms `i=...`, `s=...`, `g=...`, `b=...` with an
    /// optional `ns=N;` prefix. An alias name is not a valid form here; alias
    /// substitution happens before this is called.
    pub fn parse(s: &str) -> Result<NodeId, NodeSetError> {
        let trimmed = s.trim();
        let (namespace, rest) = match trimmed.strip_prefix("ns=") {
            Some(tail) => {
                let (ns, rest) = tail
                    .split_once(';')
                    .ok_or_else(|| NodeSetError::InvalidNodeId(s.to_string()))?;
                let ns = ns
                    .parse::<u16>()
                    .map_err(|_| NodeSetError::InvalidNodeId(s.to_string()))?;
                (ns, rest)
            }
            None => (0, trimmed),
        };

        let identifier = if let Some(v) = rest.strip_prefix("i=") {
            Identifier::Numeric(
                v.parse::<u32>()
                    .map_err(|_| NodeSetError::InvalidNodeId(s.to_string()))?,
            )
        } else if let Some(v) = rest.strip_prefix("s=") {
            Identifier::String(v.to_string())
        } else if let Some(v) = rest.strip_prefix("g=") {
            Identifier::Guid(
                v.parse::<Uuid>()
                    .map_err(|_| NodeSetError::InvalidNodeId(s.to_string()))?,
            )
        } else if let Some(v) = rest.strip_prefix("b=") {
            Identifier::Opaque(
                BASE64
                    .decode(v)
                    .map_err(|_| NodeSetError::InvalidNodeId(s.to_string()))?,
            )
        } else {
            return Err(NodeSetError::InvalidNodeId(s.to_string()));
        };

        Ok(NodeId {
            namespace,
            identifier,
        })
    }

    /// Returns a copy carrying a different namespace index; used when a merge
    /// remaps file-local indices into the combined table.
    pub fn with_namespace(&self, namespace: u16) -> NodeId {
        NodeId {
            namespace,
            identifier: self.identifier.clone(),
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace != 0 {
            write!(f, "ns={};", self.namespace)?;
        }
        match &self.identifier {
            Identifier::Numeric(v) => write!(f, "i={}", v),
            Identifier::String(v) => write!(f, "s={}", v),
            Identifier::Guid(v) => write!(f, "g={}", v),
            Identifier::Opaque(v) => write!(f, "b={}", BASE64.encode(v)),
        }
    }
}

/// A namespace-qualified browse name (`2:StartMotor` in the file).
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct QualifiedName {
    pub namespace: u16,
    pub name: String,
}

impl QualifiedName {
    pub fn new(namespace: u16, name: impl Into<String>) -> Self {
        QualifiedName {
            namespace,
            name: name.into(),
        }
    }

    /// Parses the `ns:Name` attribute form; a missing prefix means index 0.
    pub fn parse(s: &str) -> QualifiedName {
        match s.split_once(':') {
            Some((ns, name)) => match ns.parse::<u16>() {
                Ok(namespace) => QualifiedName::new(namespace, name),
                // A colon inside the name itself, not an index prefix.
                Err(_) => QualifiedName::new(0, s),
            },
            None => QualifiedName::new(0, s),
        }
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace != 0 {
            write!(f, "{}:{}", self.namespace, self.name)
        } else {
            write!(f, "{}", self.name)
        }
    }
}

/// One localized variant of a human-readable text.
/// (OPC UA Part 3, Section 8.5; an empty locale means "no locale".)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalizedText {
    pub locale: String,
    pub text: String,
}

impl LocalizedText {
    pub fn new(locale: impl Into<String>, text: impl Into<String>) -> Self {
        LocalizedText {
            locale: locale.into(),
            text: text.into(),
        }
    }
}

/// The eight OPC UA node classes. (OPC UA Part 3, Section 5.9)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeClass {
    Object,
    Variable,
    Method,
    View,
    ObjectType,
    VariableType,
    DataType,
    ReferenceType,
}

impl NodeClass {
    /// Maps a NodeSet2 element name (`UAObject`, ...) to its node class.
    pub fn from_element_name(name: &str) -> Option<NodeClass> {
        match name {
            "UAObject" => Some(NodeClass::Object),
            "UAVariable" => Some(NodeClass::Variable),
            "UAMethod" => Some(NodeClass::Method),
            "UAView" => Some(NodeClass::View),
            "UAObjectType" => Some(NodeClass::ObjectType),
            "UAVariableType" => Some(NodeClass::VariableType),
            "UADataType" => Some(NodeClass::DataType),
            "UAReferenceType" => Some(NodeClass::ReferenceType),
            _ => None,
        }
    }

    /// True for the four type-defining classes, which become library entries.
    pub fn is_type(self) -> bool {
        matches!(
            self,
            NodeClass::ObjectType
                | NodeClass::VariableType
                | NodeClass::DataType
                | NodeClass::ReferenceType
        )
    }

    /// True for the instance classes, which become tree elements.
    pub fn is_instance(self) -> bool {
        !self.is_type()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_numeric_node_id() {
        let id = NodeId::parse("i=35").expect("parse failed");
        assert_eq!(id, NodeId::numeric(0, 35));
        assert_eq!(id.to_string(), "i=35");
    }

    #[test]
    fn test_parse_string_node_id_with_namespace() {
        let id = NodeId::parse("ns=2;s=Motor;Left").expect("parse failed");
        assert_eq!(id.namespace, 2);
        // Everything after `s=` belongs to the identifier, semicolons included.
        assert_eq!(id.identifier, Identifier::String("Motor;Left".into()));
        assert_eq!(id.to_string(), "ns=2;s=Motor;Left");
    }

    #[test]
    fn test_parse_guid_node_id() {
        let id = NodeId::parse("g=09087e75-8e5e-499b-954f-f2a9603db28a").expect("parse failed");
        match &id.identifier {
            Identifier::Guid(g) => {
                assert_eq!(g.to_string(), "09087e75-8e5e-499b-954f-f2a9603db28a")
            }
            other => panic!("Expected Guid identifier, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_opaque_node_id() {
        let id = NodeId::parse("ns=1;b=AQID").expect("parse failed");
        assert_eq!(id.identifier, Identifier::Opaque(vec![1, 2, 3]));
        assert_eq!(id.to_string(), "ns=1;b=AQID");
    }

    #[test]
    fn test_parse_rejects_malformed_forms() {
        assert!(NodeId::parse("x=7").is_err());
        assert!(NodeId::parse("i=notanumber").is_err());
        assert!(NodeId::parse("ns=abc;i=1").is_err());
        assert!(NodeId::parse("g=zz").is_err());
        assert!(NodeId::parse("HasComponent").is_err());
    }

    #[test]
    fn test_qualified_name_parsing() {
        assert_eq!(QualifiedName::parse("2:Motor"), QualifiedName::new(2, "Motor"));
        assert_eq!(QualifiedName::parse("Motor"), QualifiedName::new(0, "Motor"));
        // A colon without a numeric prefix stays part of the name.
        assert_eq!(
            QualifiedName::parse("http://x:y"),
            QualifiedName::new(0, "http://x:y")
        );
    }

    #[test]
    fn test_well_known_table() {
        let has_component = well_known_reference(ID_HAS_COMPONENT).expect("missing entry");
        assert_eq!(has_component.name, "HasComponent");
        assert_eq!(has_component.inverse, Some("ComponentOf"));
        assert!(has_component.hierarchical);
        assert!(!well_known_reference(ID_HAS_TYPE_DEFINITION).unwrap().hierarchical);
        assert!(well_known_reference(9999).is_none());
    }

    #[test]
    fn test_null_node_id() {
        assert!(NodeId::null().is_null());
        assert!(!NodeId::numeric(0, 84).is_null());
        assert!(NodeId::numeric(0, 84).is_base(ID_ROOT_FOLDER));
    }
}
