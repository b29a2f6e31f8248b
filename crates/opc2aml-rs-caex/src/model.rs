// crates/opc2aml-rs-caex/src/model.rs

//! Internal `serde` data structures that map directly to the CAEX 3.0 XML
//! schema (IEC 62424). These are used for raw deserialization and
//! serialization; the semantic arena in `document.rs` is built from them.

use serde::{Deserialize, Serialize};

/// The root element of a CAEX file.
/// (IEC 62424:2016, CAEX_ClassModel_V3.0)
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename = "CAEXFile")]
pub struct CaexFileXml {
    #[serde(rename = "@FileName")]
    pub file_name: String,

    #[serde(rename = "@SchemaVersion")]
    pub schema_version: String,

    #[serde(rename = "@xmlns")]
    pub xmlns: String,

    #[serde(rename = "@xmlns:xsi")]
    pub xmlns_xsi: String,

    // quick-xml strips namespace prefixes from attribute keys on read, so the
    // deserializer sees this attribute as `@schemaLocation`.
    #[serde(rename = "@xsi:schemaLocation", alias = "@schemaLocation")]
    pub xsi_schema_location: String,

    /// `<SuperiorStandardVersion>AutomationML 2.10</SuperiorStandardVersion>`
    #[serde(rename = "SuperiorStandardVersion", default, skip_serializing_if = "Vec::is_empty")]
    pub superior_standard_version: Vec<String>,

    #[serde(rename = "SourceDocumentInformation", default, skip_serializing_if = "Vec::is_empty")]
    pub source_document_information: Vec<SourceDocumentInformationXml>,

    #[serde(rename = "InstanceHierarchy", default, skip_serializing_if = "Vec::is_empty")]
    pub instance_hierarchy: Vec<InstanceHierarchyXml>,

    #[serde(rename = "InterfaceClassLib", default, skip_serializing_if = "Vec::is_empty")]
    pub interface_class_lib: Vec<InterfaceClassLibXml>,

    #[serde(rename = "RoleClassLib", default, skip_serializing_if = "Vec::is_empty")]
    pub role_class_lib: Vec<RoleClassLibXml>,

    #[serde(rename = "SystemUnitClassLib", default, skip_serializing_if = "Vec::is_empty")]
    pub system_unit_class_lib: Vec<SystemUnitClassLibXml>,

    #[serde(rename = "AttributeTypeLib", default, skip_serializing_if = "Vec::is_empty")]
    pub attribute_type_lib: Vec<AttributeTypeLibXml>,
}

impl Default for CaexFileXml {
    fn default() -> Self {
        Self {
            file_name: String::new(),
            schema_version: "3.0".into(),
            xmlns: "http://www.dke.de/CAEX".into(),
            xmlns_xsi: "http://www.w3.org/2001/XMLSchema-instance".into(),
            xsi_schema_location: "http://www.dke.de/CAEX CAEX_ClassModel_V.3.0.xsd".into(),
            superior_standard_version: vec!["AutomationML 2.10".into()],
            source_document_information: Vec::new(),
            instance_hierarchy: Vec::new(),
            interface_class_lib: Vec::new(),
            role_class_lib: Vec::new(),
            system_unit_class_lib: Vec::new(),
            attribute_type_lib: Vec::new(),
        }
    }
}

/// Provenance header. (IEC 62424, `SourceDocumentInformationType`)
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct SourceDocumentInformationXml {
    #[serde(rename = "@OriginName")]
    pub origin_name: String,

    #[serde(rename = "@OriginID")]
    pub origin_id: String,

    #[serde(rename = "@OriginVersion")]
    pub origin_version: String,

    #[serde(rename = "@LastWritingDateTime")]
    pub last_writing_date_time: String,
}

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct InstanceHierarchyXml {
    #[serde(rename = "@Name")]
    pub name: String,

    #[serde(rename = "@ID", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(rename = "InternalElement", default, skip_serializing_if = "Vec::is_empty")]
    pub internal_element: Vec<InternalElementXml>,
}

/// A tree element. (IEC 62424, `InternalElementType`)
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct InternalElementXml {
    #[serde(rename = "@Name")]
    pub name: String,

    #[serde(rename = "@ID", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(rename = "@RefBaseSystemUnitPath", default, skip_serializing_if = "Option::is_none")]
    pub ref_base_system_unit_path: Option<String>,

    #[serde(rename = "Attribute", default, skip_serializing_if = "Vec::is_empty")]
    pub attribute: Vec<AttributeXml>,

    #[serde(rename = "ExternalInterface", default, skip_serializing_if = "Vec::is_empty")]
    pub external_interface: Vec<ExternalInterfaceXml>,

    #[serde(rename = "InternalElement", default, skip_serializing_if = "Vec::is_empty")]
    pub internal_element: Vec<InternalElementXml>,

    #[serde(rename = "RoleRequirements", default, skip_serializing_if = "Option::is_none")]
    pub role_requirements: Option<RoleRequirementsXml>,

    #[serde(rename = "InternalLink", default, skip_serializing_if = "Vec::is_empty")]
    pub internal_link: Vec<InternalLinkXml>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct RoleRequirementsXml {
    #[serde(rename = "@RefBaseRoleClassPath")]
    pub ref_base_role_class_path: String,
}

/// A nestable attribute. (IEC 62424, `AttributeType`)
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct AttributeXml {
    #[serde(rename = "@Name")]
    pub name: String,

    #[serde(rename = "@AttributeDataType", default, skip_serializing_if = "Option::is_none")]
    pub attribute_data_type: Option<String>,

    #[serde(rename = "@RefAttributeType", default, skip_serializing_if = "Option::is_none")]
    pub ref_attribute_type: Option<String>,

    #[serde(rename = "Value", default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    #[serde(rename = "Attribute", default, skip_serializing_if = "Vec::is_empty")]
    pub attribute: Vec<AttributeXml>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct ExternalInterfaceXml {
    #[serde(rename = "@Name")]
    pub name: String,

    #[serde(rename = "@ID", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(rename = "@RefBaseClassPath", default, skip_serializing_if = "Option::is_none")]
    pub ref_base_class_path: Option<String>,

    #[serde(rename = "Attribute", default, skip_serializing_if = "Vec::is_empty")]
    pub attribute: Vec<AttributeXml>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct InternalLinkXml {
    #[serde(rename = "@Name")]
    pub name: String,

    #[serde(rename = "@RefPartnerSideA")]
    pub ref_partner_side_a: String,

    #[serde(rename = "@RefPartnerSideB")]
    pub ref_partner_side_b: String,
}

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct InterfaceClassLibXml {
    #[serde(rename = "@Name")]
    pub name: String,

    #[serde(rename = "InterfaceClass", default, skip_serializing_if = "Vec::is_empty")]
    pub interface_class: Vec<InterfaceClassXml>,
}

/// An interface class; nesting is read for foreign documents but the writer
/// emits flat libraries with `RefBaseClassPath` derivation.
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct InterfaceClassXml {
    #[serde(rename = "@Name")]
    pub name: String,

    #[serde(rename = "@ID", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(rename = "@RefBaseClassPath", default, skip_serializing_if = "Option::is_none")]
    pub ref_base_class_path: Option<String>,

    #[serde(rename = "Attribute", default, skip_serializing_if = "Vec::is_empty")]
    pub attribute: Vec<AttributeXml>,

    #[serde(rename = "InterfaceClass", default, skip_serializing_if = "Vec::is_empty")]
    pub interface_class: Vec<InterfaceClassXml>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct RoleClassLibXml {
    #[serde(rename = "@Name")]
    pub name: String,

    #[serde(rename = "RoleClass", default, skip_serializing_if = "Vec::is_empty")]
    pub role_class: Vec<RoleClassXml>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct RoleClassXml {
    #[serde(rename = "@Name")]
    pub name: String,

    #[serde(rename = "@ID", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(rename = "@RefBaseClassPath", default, skip_serializing_if = "Option::is_none")]
    pub ref_base_class_path: Option<String>,

    #[serde(rename = "Attribute", default, skip_serializing_if = "Vec::is_empty")]
    pub attribute: Vec<AttributeXml>,

    #[serde(rename = "RoleClass", default, skip_serializing_if = "Vec::is_empty")]
    pub role_class: Vec<RoleClassXml>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct SystemUnitClassLibXml {
    #[serde(rename = "@Name")]
    pub name: String,

    #[serde(rename = "SystemUnitClass", default, skip_serializing_if = "Vec::is_empty")]
    pub system_unit_class: Vec<SystemUnitClassXml>,
}

/// A system-unit class; may own internal elements (instance declarations).
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct SystemUnitClassXml {
    #[serde(rename = "@Name")]
    pub name: String,

    #[serde(rename = "@ID", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(rename = "@RefBaseClassPath", default, skip_serializing_if = "Option::is_none")]
    pub ref_base_class_path: Option<String>,

    #[serde(rename = "Attribute", default, skip_serializing_if = "Vec::is_empty")]
    pub attribute: Vec<AttributeXml>,

    #[serde(rename = "ExternalInterface", default, skip_serializing_if = "Vec::is_empty")]
    pub external_interface: Vec<ExternalInterfaceXml>,

    #[serde(rename = "InternalElement", default, skip_serializing_if = "Vec::is_empty")]
    pub internal_element: Vec<InternalElementXml>,

    #[serde(rename = "InternalLink", default, skip_serializing_if = "Vec::is_empty")]
    pub internal_link: Vec<InternalLinkXml>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct AttributeTypeLibXml {
    #[serde(rename = "@Name")]
    pub name: String,

    #[serde(rename = "AttributeType", default, skip_serializing_if = "Vec::is_empty")]
    pub attribute_type: Vec<AttributeTypeXml>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct AttributeTypeXml {
    #[serde(rename = "@Name")]
    pub name: String,

    #[serde(rename = "@ID", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(rename = "@AttributeDataType", default, skip_serializing_if = "Option::is_none")]
    pub attribute_data_type: Option<String>,

    #[serde(rename = "Attribute", default, skip_serializing_if = "Vec::is_empty")]
    pub attribute: Vec<AttributeXml>,
}
