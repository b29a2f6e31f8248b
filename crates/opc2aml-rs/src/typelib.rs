// crates/opc2aml-rs/src/typelib.rs

//! The type-system mirror: type nodes become class-library entries.
//!
//! Four libraries exist per namespace URI, created on demand. Reference types
//! land in the interface-class library, object types in both the role-class
//! and the system-unit-class library, variable types in the system-unit-class
//! library, data types in the attribute-type library. Derivation between
//! entries uses name-based CAEX paths, so an entry never has to exist before
//! the entries that point at it.

use crate::encode::ValueEncoder;
use crate::ident;
use crate::report::ConversionReport;
use log::debug;
use opc2aml_rs_caex::{Attribute, CaexDocument, CaexKind, Handle, PayloadRole};
use opc2aml_rs_nodeset::{AddressSpace, NodeClass, NodeId, UaNode};
use std::collections::BTreeMap;

// Library name prefixes, one per CAEX section.
pub(crate) const INTERFACE_LIB: &str = "ICL_";
pub(crate) const ROLE_LIB: &str = "RCL_";
pub(crate) const SYSTEM_UNIT_LIB: &str = "SUC_";
pub(crate) const ATTRIBUTE_LIB: &str = "ATL_";

/// Mirrors every type node of the working set into its library entries.
///
/// Returns the object each type node materialized as, keyed by node id.
/// Object and variable types map to their system-unit entry, where instance
/// declarations attach during the hierarchy walk.
pub(crate) fn mirror_space(
    document: &mut CaexDocument,
    space: &AddressSpace,
    encoder: &ValueEncoder<'_>,
    report: &mut ConversionReport,
) -> BTreeMap<NodeId, Handle> {
    let mut placed = BTreeMap::new();
    for node in space.visit_order() {
        if !node.node_class.is_type() {
            continue;
        }
        if let Some(handle) = mirror_type_node(document, space, encoder, node, report) {
            placed.insert(node.node_id.clone(), handle);
        }
    }
    placed
}

/// Mirrors the type nodes of one namespace only; the insert engine's write
/// phase.
pub(crate) fn mirror_namespace(
    document: &mut CaexDocument,
    space: &AddressSpace,
    encoder: &ValueEncoder<'_>,
    namespace: u16,
    report: &mut ConversionReport,
) {
    for node in space.visit_order() {
        if node.node_id.namespace == namespace && node.node_class.is_type() {
            mirror_type_node(document, space, encoder, node, report);
        }
    }
}

fn mirror_type_node(
    document: &mut CaexDocument,
    space: &AddressSpace,
    encoder: &ValueEncoder<'_>,
    node: &UaNode,
    report: &mut ConversionReport,
) -> Option<Handle> {
    let Some(uri) = space.namespace_uri(node.node_id.namespace) else {
        debug!("Type {} has no namespace table entry", node.node_id);
        return None;
    };
    let uri = uri.to_string();
    match node.node_class {
        NodeClass::ReferenceType => {
            Some(mirror_reference_type(document, space, encoder, node, &uri, report))
        }
        NodeClass::ObjectType => {
            mirror_role_class(document, space, encoder, node, &uri, report);
            Some(mirror_system_unit(document, space, encoder, node, &uri, report))
        }
        NodeClass::VariableType => {
            Some(mirror_system_unit(document, space, encoder, node, &uri, report))
        }
        NodeClass::DataType => {
            Some(mirror_attribute_type(document, space, encoder, node, &uri, report))
        }
        _ => None,
    }
}

fn mirror_reference_type(
    document: &mut CaexDocument,
    space: &AddressSpace,
    encoder: &ValueEncoder<'_>,
    node: &UaNode,
    uri: &str,
    report: &mut ConversionReport,
) -> Handle {
    let library = document
        .find_or_add_library(CaexKind::InterfaceClassLib, &format!("{}{}", INTERFACE_LIB, uri));
    let entry = document.add_child(library, CaexKind::InterfaceClass, node.browse_name.name.as_str());
    document.set_id(
        entry,
        ident::encode_with_prefix(ident::PREFIX_INTERFACE_CLASS, uri, &node.node_id),
    );

    let mut attributes = encoder.node_attributes(node, PayloadRole::Definition, report);
    if node.symmetric {
        attributes.push(Attribute::scalar(
            PayloadRole::Definition,
            "Symmetric",
            "xs:boolean",
            "true",
        ));
    }
    if let Some(inverse) = &node.inverse_name {
        let texts = [inverse.clone()];
        if let Some(attribute) =
            encoder.localized_attribute("InverseName", PayloadRole::Definition, &texts)
        {
            attributes.push(attribute);
        }
    }
    document.object_mut(entry).attributes = attributes;

    if let Some(supertype) = node.supertype() {
        document.object_mut(entry).ref_base_class_path = interface_class_path(space, supertype);
    }
    entry
}

fn mirror_role_class(
    document: &mut CaexDocument,
    space: &AddressSpace,
    encoder: &ValueEncoder<'_>,
    node: &UaNode,
    uri: &str,
    report: &mut ConversionReport,
) -> Handle {
    let library =
        document.find_or_add_library(CaexKind::RoleClassLib, &format!("{}{}", ROLE_LIB, uri));
    let entry = document.add_child(library, CaexKind::RoleClass, node.browse_name.name.as_str());
    document.set_id(
        entry,
        ident::encode_with_prefix(ident::PREFIX_ROLE_CLASS, uri, &node.node_id),
    );
    document.object_mut(entry).attributes =
        encoder.node_attributes(node, PayloadRole::Definition, report);
    if let Some(supertype) = node.supertype() {
        document.object_mut(entry).ref_base_class_path = role_class_path(space, supertype);
    }
    entry
}

fn mirror_system_unit(
    document: &mut CaexDocument,
    space: &AddressSpace,
    encoder: &ValueEncoder<'_>,
    node: &UaNode,
    uri: &str,
    report: &mut ConversionReport,
) -> Handle {
    let library = document
        .find_or_add_library(CaexKind::SystemUnitClassLib, &format!("{}{}", SYSTEM_UNIT_LIB, uri));
    let entry =
        document.add_child(library, CaexKind::SystemUnitClass, node.browse_name.name.as_str());
    document.set_id(
        entry,
        ident::encode_with_prefix(ident::PREFIX_SYSTEM_UNIT_CLASS, uri, &node.node_id),
    );
    document.object_mut(entry).attributes =
        encoder.node_attributes(node, PayloadRole::Definition, report);
    if let Some(supertype) = node.supertype() {
        document.object_mut(entry).ref_base_class_path = system_unit_path(space, supertype);
    }
    entry
}

fn mirror_attribute_type(
    document: &mut CaexDocument,
    space: &AddressSpace,
    encoder: &ValueEncoder<'_>,
    node: &UaNode,
    uri: &str,
    report: &mut ConversionReport,
) -> Handle {
    let library = document
        .find_or_add_library(CaexKind::AttributeTypeLib, &format!("{}{}", ATTRIBUTE_LIB, uri));
    let entry =
        document.add_child(library, CaexKind::AttributeType, node.browse_name.name.as_str());
    document.set_id(
        entry,
        ident::encode_with_prefix(ident::PREFIX_ATTRIBUTE_TYPE, uri, &node.node_id),
    );
    let mut attributes = encoder.node_attributes(node, PayloadRole::Definition, report);
    if let Some(definition) = &node.definition {
        attributes.push(encoder.definition_attribute(definition, None));
    }
    document.object_mut(entry).attributes = attributes;
    entry
}

// --- Name-based CAEX paths ---

/// `ICL_<uri>/<name>`: the interface-class entry of a reference type. The
/// name resolves through the registered base table for ns=0 types missing
/// from the working set.
pub(crate) fn interface_class_path(space: &AddressSpace, reference_type: &NodeId) -> Option<String> {
    let uri = space.namespace_uri(reference_type.namespace)?;
    let name = space.reference_type_name(reference_type)?;
    Some(format!("{}{}/{}", INTERFACE_LIB, uri, name))
}

/// `RCL_<uri>/<name>`: the role-class entry of an object type.
pub(crate) fn role_class_path(space: &AddressSpace, type_id: &NodeId) -> Option<String> {
    entry_path(space, ROLE_LIB, type_id)
}

/// `SUC_<uri>/<name>`: the system-unit entry of an object or variable type.
pub(crate) fn system_unit_path(space: &AddressSpace, type_id: &NodeId) -> Option<String> {
    entry_path(space, SYSTEM_UNIT_LIB, type_id)
}

/// `ATL_<uri>/<name>`: the attribute-type entry of a data type.
pub(crate) fn attribute_type_path(space: &AddressSpace, data_type: &NodeId) -> Option<String> {
    entry_path(space, ATTRIBUTE_LIB, data_type)
}

fn entry_path(space: &AddressSpace, lib_prefix: &str, id: &NodeId) -> Option<String> {
    let uri = space.namespace_uri(id.namespace)?;
    let node = space.node(id)?;
    Some(format!("{}{}/{}", lib_prefix, uri, node.browse_name.name))
}
