// src/lib.rs

#![doc = "Parses OPC UA NodeSet2 (UANodeSet) address-space files."]
#![doc = ""]
#![doc = "This library reads the XML information model exchange format into a"]
#![doc = "typed node graph that keeps declaration order, resolves aliases and"]
#![doc = "namespace indices, and normalizes references so every logical edge"]
#![doc = "has exactly one forward representation."]
#![doc = ""]
#![doc = "It supports:"]
#![doc = "- `load_nodeset_from_str`: Parsing one NodeSet2 file into an `AddressSpace`."]
#![doc = "- `AddressSpace::merge`: Folding several files into one working set."]
#![doc = "- Typed `<Value>` payloads for every built-in type via `Variant`."]

// --- Crate Modules ---

mod error;
mod parser;
mod space;
mod types;
mod variant;
mod xml;

// --- Public API Re-exports ---

pub use error::NodeSetError;
pub use parser::load_nodeset_from_str;
pub use space::{
    AddressSpace, DataTypeDefinition, DataTypeField, ModelInfo, SkippedNode, UaNode, UaReference,
};
pub use types::{
    BASE_NAMESPACE_URI, ID_AGGREGATES, ID_BASE_DATA_TYPE, ID_BOOLEAN, ID_BYTE, ID_BYTESTRING,
    ID_DATA_VALUE, ID_DATETIME, ID_DIAGNOSTIC_INFO, ID_DOUBLE, ID_DURATION, ID_ENUMERATION,
    ID_EXPANDED_NODE_ID, ID_FLOAT, ID_GENERATES_EVENT, ID_GUID, ID_HAS_CHILD, ID_HAS_COMPONENT,
    ID_HAS_DESCRIPTION, ID_HAS_ENCODING, ID_HAS_EVENT_SOURCE, ID_HAS_HISTORICAL_CONFIGURATION,
    ID_HAS_MODELLING_RULE, ID_HAS_NOTIFIER, ID_HAS_ORDERED_COMPONENT, ID_HAS_PROPERTY,
    ID_HAS_SUBTYPE, ID_HAS_TYPE_DEFINITION, ID_HIERARCHICAL_REFERENCES, ID_INT16, ID_INT32,
    ID_INT64, ID_LOCALIZED_TEXT, ID_NODE_ID, ID_NON_HIERARCHICAL_REFERENCES, ID_OBJECTS_FOLDER,
    ID_ORGANIZES, ID_QUALIFIED_NAME, ID_REFERENCES, ID_ROOT_FOLDER, ID_SBYTE, ID_STATUS_CODE,
    ID_STRING, ID_STRUCTURE, ID_TYPES_FOLDER, ID_UINT16, ID_UINT32, ID_UINT64, ID_XML_ELEMENT,
    Identifier, LocalizedText, NodeClass, NodeId, QualifiedName, WELL_KNOWN_REFERENCES,
    WellKnownReference, well_known_reference,
};
pub use variant::{
    BuiltInType, DataValueFields, ExpandedNodeId, ExtensionObject, Variant,
};
pub use xml::XmlElement;
