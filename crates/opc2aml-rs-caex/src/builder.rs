// crates/opc2aml-rs-caex/src/builder.rs

use crate::attribute::Attribute;
use crate::document::{CaexDocument, CaexKind, Handle};
use crate::error::CaexError;
use crate::model;
use log::warn;
use serde::Serialize;
use std::fmt::Write;

/// Serializes a [`CaexDocument`] into a CAEX 3.0 XML `String`.
///
/// This function converts the arena into the internal `serde` model and then
/// uses `quick-xml` to generate the XML string. Sections appear in schema
/// order (instance hierarchies, then the four library kinds); within a
/// section, libraries and entries keep their insertion order.
///
/// # Errors
/// Returns a `CaexError` if serialization fails.
pub fn save_caex_to_string(document: &CaexDocument) -> Result<String, CaexError> {
    // 1. Start from the header defaults (xmlns, schema version, standard tag).
    let mut file = model::CaexFileXml {
        file_name: document.file_name().to_string(),
        ..Default::default()
    };
    if let Some(info) = document.source_info() {
        file.source_document_information
            .push(model::SourceDocumentInformationXml {
                origin_name: info.origin_name.clone(),
                origin_id: info.origin_id.clone(),
                origin_version: info.origin_version.clone(),
                last_writing_date_time: info.last_writing_date_time.clone(),
            });
    }

    // 2. Partition the roots into their sections.
    for &root in document.roots() {
        match document.object(root).kind {
            CaexKind::InstanceHierarchy => file
                .instance_hierarchy
                .push(build_instance_hierarchy(document, root)),
            CaexKind::InterfaceClassLib => file
                .interface_class_lib
                .push(build_interface_class_lib(document, root)),
            CaexKind::RoleClassLib => file.role_class_lib.push(build_role_class_lib(document, root)),
            CaexKind::SystemUnitClassLib => file
                .system_unit_class_lib
                .push(build_system_unit_class_lib(document, root)),
            CaexKind::AttributeTypeLib => file
                .attribute_type_lib
                .push(build_attribute_type_lib(document, root)),
            other => warn!("Top-level {:?} object has no CAEX section; skipped", other),
        }
    }

    // 3. Serialize. The XML declaration is written manually.
    let mut buffer = String::new();
    write!(&mut buffer, "{}", "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\r\n")?;

    let mut serializer = quick_xml::se::Serializer::new(&mut buffer);
    serializer.indent(' ', 2);

    file.serialize(serializer)?;

    Ok(buffer)
}

fn build_instance_hierarchy(document: &CaexDocument, handle: Handle) -> model::InstanceHierarchyXml {
    let object = document.object(handle);
    let mut hierarchy = model::InstanceHierarchyXml {
        name: object.name.clone(),
        id: object.id.clone(),
        internal_element: Vec::new(),
    };
    for &child in document.children_of(handle) {
        match document.object(child).kind {
            CaexKind::InternalElement => hierarchy
                .internal_element
                .push(build_internal_element(document, child)),
            other => warn!("{:?} inside an instance hierarchy; skipped", other),
        }
    }
    hierarchy
}

fn build_internal_element(document: &CaexDocument, handle: Handle) -> model::InternalElementXml {
    let object = document.object(handle);
    let mut element = model::InternalElementXml {
        name: object.name.clone(),
        id: object.id.clone(),
        ref_base_system_unit_path: object.ref_base_system_unit_path.clone(),
        attribute: object.attributes.iter().map(build_attribute).collect(),
        role_requirements: object
            .role_requirement
            .as_ref()
            .map(|path| model::RoleRequirementsXml {
                ref_base_role_class_path: path.clone(),
            }),
        internal_link: build_links(document, handle),
        ..Default::default()
    };
    for &child in document.children_of(handle) {
        match document.object(child).kind {
            CaexKind::ExternalInterface => element
                .external_interface
                .push(build_external_interface(document, child)),
            CaexKind::InternalElement => element
                .internal_element
                .push(build_internal_element(document, child)),
            other => warn!("{:?} inside an internal element; skipped", other),
        }
    }
    element
}

fn build_external_interface(document: &CaexDocument, handle: Handle) -> model::ExternalInterfaceXml {
    let object = document.object(handle);
    model::ExternalInterfaceXml {
        name: object.name.clone(),
        id: object.id.clone(),
        ref_base_class_path: object.ref_base_class_path.clone(),
        attribute: object.attributes.iter().map(build_attribute).collect(),
    }
}

fn build_links(document: &CaexDocument, handle: Handle) -> Vec<model::InternalLinkXml> {
    document
        .links_at(handle)
        .map(|link| model::InternalLinkXml {
            name: link.name.clone(),
            ref_partner_side_a: link.ref_partner_side_a.clone(),
            ref_partner_side_b: link.ref_partner_side_b.clone(),
        })
        .collect()
}

fn build_attribute(attribute: &Attribute) -> model::AttributeXml {
    model::AttributeXml {
        name: attribute.name.clone(),
        attribute_data_type: attribute.data_type.clone(),
        ref_attribute_type: attribute.ref_attribute_type.clone(),
        value: attribute.value.clone(),
        attribute: attribute.children.iter().map(build_attribute).collect(),
    }
}

fn build_interface_class_lib(document: &CaexDocument, handle: Handle) -> model::InterfaceClassLibXml {
    model::InterfaceClassLibXml {
        name: document.object(handle).name.clone(),
        interface_class: document
            .children_of(handle)
            .iter()
            .map(|&child| build_interface_class(document, child))
            .collect(),
    }
}

fn build_interface_class(document: &CaexDocument, handle: Handle) -> model::InterfaceClassXml {
    let object = document.object(handle);
    model::InterfaceClassXml {
        name: object.name.clone(),
        id: object.id.clone(),
        ref_base_class_path: object.ref_base_class_path.clone(),
        attribute: object.attributes.iter().map(build_attribute).collect(),
        interface_class: document
            .children_of(handle)
            .iter()
            .filter(|&&c| document.object(c).kind == CaexKind::InterfaceClass)
            .map(|&c| build_interface_class(document, c))
            .collect(),
    }
}

fn build_role_class_lib(document: &CaexDocument, handle: Handle) -> model::RoleClassLibXml {
    model::RoleClassLibXml {
        name: document.object(handle).name.clone(),
        role_class: document
            .children_of(handle)
            .iter()
            .map(|&child| build_role_class(document, child))
            .collect(),
    }
}

fn build_role_class(document: &CaexDocument, handle: Handle) -> model::RoleClassXml {
    let object = document.object(handle);
    model::RoleClassXml {
        name: object.name.clone(),
        id: object.id.clone(),
        ref_base_class_path: object.ref_base_class_path.clone(),
        attribute: object.attributes.iter().map(build_attribute).collect(),
        role_class: document
            .children_of(handle)
            .iter()
            .filter(|&&c| document.object(c).kind == CaexKind::RoleClass)
            .map(|&c| build_role_class(document, c))
            .collect(),
    }
}

fn build_system_unit_class_lib(
    document: &CaexDocument,
    handle: Handle,
) -> model::SystemUnitClassLibXml {
    model::SystemUnitClassLibXml {
        name: document.object(handle).name.clone(),
        system_unit_class: document
            .children_of(handle)
            .iter()
            .map(|&child| build_system_unit_class(document, child))
            .collect(),
    }
}

fn build_system_unit_class(document: &CaexDocument, handle: Handle) -> model::SystemUnitClassXml {
    let object = document.object(handle);
    let mut class = model::SystemUnitClassXml {
        name: object.name.clone(),
        id: object.id.clone(),
        ref_base_class_path: object.ref_base_class_path.clone(),
        attribute: object.attributes.iter().map(build_attribute).collect(),
        internal_link: build_links(document, handle),
        ..Default::default()
    };
    for &child in document.children_of(handle) {
        match document.object(child).kind {
            CaexKind::ExternalInterface => class
                .external_interface
                .push(build_external_interface(document, child)),
            CaexKind::InternalElement => class
                .internal_element
                .push(build_internal_element(document, child)),
            other => warn!("{:?} inside a system unit class; skipped", other),
        }
    }
    class
}

fn build_attribute_type_lib(document: &CaexDocument, handle: Handle) -> model::AttributeTypeLibXml {
    model::AttributeTypeLibXml {
        name: document.object(handle).name.clone(),
        attribute_type: document
            .children_of(handle)
            .iter()
            .map(|&child| {
                let object = document.object(child);
                model::AttributeTypeXml {
                    name: object.name.clone(),
                    id: object.id.clone(),
                    attribute_data_type: None,
                    attribute: object.attributes.iter().map(build_attribute).collect(),
                }
            })
            .collect(),
    }
}
