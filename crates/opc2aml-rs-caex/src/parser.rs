// crates/opc2aml-rs-caex/src/parser.rs

use crate::attribute::{Attribute, PayloadRole};
use crate::document::{CaexDocument, CaexKind, Handle, SourceDocumentInfo};
use crate::error::CaexError;
use crate::model;
use log::{debug, info, warn};

/// Parses a CAEX 3.0 XML string into a [`CaexDocument`].
///
/// Only schema version 3.x files are accepted; the 2.x family moved
/// attributes and renamed container elements, so reading it with these
/// structures would silently drop content.
///
/// # Errors
/// Returns a `CaexError` if XML parsing fails or the schema version is
/// unsupported.
pub fn load_caex_from_str(xml: &str) -> Result<CaexDocument, CaexError> {
    // 1. Deserialize the XML into the serde model.
    let file: model::CaexFileXml = quick_xml::de::from_str(xml)?;

    if !file.schema_version.starts_with("3.") {
        return Err(CaexError::UnsupportedSchemaVersion(file.schema_version));
    }

    // 2. Rebuild the arena, section by section.
    let mut document = CaexDocument::new(&file.file_name);
    if let Some(source) = file.source_document_information.first() {
        document.set_source_info(SourceDocumentInfo {
            origin_name: source.origin_name.clone(),
            origin_id: source.origin_id.clone(),
            origin_version: source.origin_version.clone(),
            last_writing_date_time: source.last_writing_date_time.clone(),
        });
    }
    if file.source_document_information.len() > 1 {
        debug!(
            "{} extra SourceDocumentInformation entries ignored",
            file.source_document_information.len() - 1
        );
    }

    for hierarchy in &file.instance_hierarchy {
        let root = document.add_root(CaexKind::InstanceHierarchy, &hierarchy.name);
        if let Some(id) = &hierarchy.id {
            document.set_id(root, id);
        }
        for element in &hierarchy.internal_element {
            read_internal_element(&mut document, root, element);
        }
    }
    for library in &file.interface_class_lib {
        let root = document.add_root(CaexKind::InterfaceClassLib, &library.name);
        for class in &library.interface_class {
            read_interface_class(&mut document, root, class);
        }
    }
    for library in &file.role_class_lib {
        let root = document.add_root(CaexKind::RoleClassLib, &library.name);
        for class in &library.role_class {
            read_role_class(&mut document, root, class);
        }
    }
    for library in &file.system_unit_class_lib {
        let root = document.add_root(CaexKind::SystemUnitClassLib, &library.name);
        for class in &library.system_unit_class {
            read_system_unit_class(&mut document, root, class);
        }
    }
    for library in &file.attribute_type_lib {
        let root = document.add_root(CaexKind::AttributeTypeLib, &library.name);
        for attribute_type in &library.attribute_type {
            read_attribute_type(&mut document, root, attribute_type);
        }
    }

    info!(
        "Loaded CAEX file '{}': {} objects, {} links",
        document.file_name(),
        document.len(),
        document.links().len()
    );
    Ok(document)
}

/// Rebuilds one attribute subtree.
///
/// The wire format carries no role marker, so the role is re-derived: an
/// attribute named `Definition` opens a definition subtree, everything else
/// inherits the role of its container.
fn read_attribute(xml: &model::AttributeXml, inherited: PayloadRole) -> Attribute {
    let role = if xml.name == "Definition" {
        PayloadRole::Definition
    } else {
        inherited
    };
    Attribute {
        name: xml.name.clone(),
        data_type: xml.attribute_data_type.clone(),
        value: xml.value.clone(),
        role,
        ref_attribute_type: xml.ref_attribute_type.clone(),
        children: xml.attribute.iter().map(|a| read_attribute(a, role)).collect(),
    }
}

fn read_internal_element(
    document: &mut CaexDocument,
    parent: Handle,
    xml: &model::InternalElementXml,
) {
    let handle = document.add_child(parent, CaexKind::InternalElement, &xml.name);
    if let Some(id) = &xml.id {
        document.set_id(handle, id);
    }

    let object = document.object_mut(handle);
    object.ref_base_system_unit_path = xml.ref_base_system_unit_path.clone();
    object.role_requirement = xml
        .role_requirements
        .as_ref()
        .map(|r| r.ref_base_role_class_path.clone());
    object.attributes = xml
        .attribute
        .iter()
        .map(|a| read_attribute(a, PayloadRole::Instance))
        .collect();

    for interface in &xml.external_interface {
        read_external_interface(document, handle, interface, PayloadRole::Instance);
    }
    for nested in &xml.internal_element {
        read_internal_element(document, handle, nested);
    }
    for link in &xml.internal_link {
        document.add_link(handle, &link.name, &link.ref_partner_side_a, &link.ref_partner_side_b);
    }
}

fn read_external_interface(
    document: &mut CaexDocument,
    parent: Handle,
    xml: &model::ExternalInterfaceXml,
    role: PayloadRole,
) {
    let handle = document.add_child(parent, CaexKind::ExternalInterface, &xml.name);
    if let Some(id) = &xml.id {
        document.set_id(handle, id);
    }
    let object = document.object_mut(handle);
    object.ref_base_class_path = xml.ref_base_class_path.clone();
    object.attributes = xml.attribute.iter().map(|a| read_attribute(a, role)).collect();
}

fn read_interface_class(
    document: &mut CaexDocument,
    parent: Handle,
    xml: &model::InterfaceClassXml,
) {
    let handle = document.add_child(parent, CaexKind::InterfaceClass, &xml.name);
    if let Some(id) = &xml.id {
        document.set_id(handle, id);
    }
    let object = document.object_mut(handle);
    object.ref_base_class_path = xml.ref_base_class_path.clone();
    object.attributes = xml
        .attribute
        .iter()
        .map(|a| read_attribute(a, PayloadRole::Definition))
        .collect();
    for nested in &xml.interface_class {
        read_interface_class(document, handle, nested);
    }
}

fn read_role_class(document: &mut CaexDocument, parent: Handle, xml: &model::RoleClassXml) {
    let handle = document.add_child(parent, CaexKind::RoleClass, &xml.name);
    if let Some(id) = &xml.id {
        document.set_id(handle, id);
    }
    let object = document.object_mut(handle);
    object.ref_base_class_path = xml.ref_base_class_path.clone();
    object.attributes = xml
        .attribute
        .iter()
        .map(|a| read_attribute(a, PayloadRole::Definition))
        .collect();
    for nested in &xml.role_class {
        read_role_class(document, handle, nested);
    }
}

fn read_system_unit_class(
    document: &mut CaexDocument,
    parent: Handle,
    xml: &model::SystemUnitClassXml,
) {
    let handle = document.add_child(parent, CaexKind::SystemUnitClass, &xml.name);
    if let Some(id) = &xml.id {
        document.set_id(handle, id);
    }
    let object = document.object_mut(handle);
    object.ref_base_class_path = xml.ref_base_class_path.clone();
    object.attributes = xml
        .attribute
        .iter()
        .map(|a| read_attribute(a, PayloadRole::Definition))
        .collect();

    for interface in &xml.external_interface {
        read_external_interface(document, handle, interface, PayloadRole::Definition);
    }
    // Children materialized under a class carry instance payloads.
    for element in &xml.internal_element {
        read_internal_element(document, handle, element);
    }
    for link in &xml.internal_link {
        document.add_link(handle, &link.name, &link.ref_partner_side_a, &link.ref_partner_side_b);
    }
}

fn read_attribute_type(
    document: &mut CaexDocument,
    parent: Handle,
    xml: &model::AttributeTypeXml,
) {
    let handle = document.add_child(parent, CaexKind::AttributeType, &xml.name);
    if let Some(id) = &xml.id {
        document.set_id(handle, id);
    }
    if xml.attribute_data_type.is_some() {
        warn!(
            "AttributeType '{}' carries an AttributeDataType; the writer never emits one",
            xml.name
        );
    }
    document.object_mut(handle).attributes = xml
        .attribute
        .iter()
        .map(|a| read_attribute(a, PayloadRole::Definition))
        .collect();
}
