// crates/opc2aml-rs-nodeset/tests/robustness.rs

//! Integration tests focused on error handling and edge cases.
//!
//! These tests ensure the loader correctly reports structural errors, contains
//! damage from malformed identifiers and references, and decodes awkward but
//! legal XML, without panicking.

use opc2aml_rs_nodeset::{NodeId, NodeSetError, Variant, load_nodeset_from_str};

/// A minimal valid NodeSet used as a base for creating corrupted test cases.
const MINIMAL_VALID_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<UANodeSet xmlns="http://opcfoundation.org/UA/2011/03/UANodeSet.xsd">
  <NamespaceUris>
    <Uri>http://example.com/Robust/</Uri>
  </NamespaceUris>
  <Aliases>
    <Alias Alias="HasComponent">i=47</Alias>
  </Aliases>
  <UAObject NodeId="ns=1;i=100" BrowseName="1:Rig">
    <DisplayName>Rig</DisplayName>
    <References>
      <Reference ReferenceType="HasComponent">ns=1;i=200</Reference>
    </References>
  </UAObject>
  <UAVariable NodeId="ns=1;i=200" BrowseName="1:Gauge" DataType="i=11">
    <DisplayName>Gauge</DisplayName>
    <Value>
      <Double>42.5</Double>
    </Value>
  </UAVariable>
</UANodeSet>"#;

/// Verifies that the loader catches malformed XML syntax (e.g., unclosed tags).
#[test]
fn test_malformed_xml_syntax() {
    let xml = r#"<UANodeSet><UAObject NodeId="i=1" ... missing closing tags"#;
    let result = load_nodeset_from_str(xml);
    assert!(
        matches!(result, Err(NodeSetError::XmlParsing(_))),
        "Expected XmlParsing error, got {:?}",
        result
    );
}

/// Verifies that a document without the UANodeSet root is rejected outright.
#[test]
fn test_wrong_root_element() {
    let result = load_nodeset_from_str("<CAEXFile></CAEXFile>");
    assert!(
        matches!(result, Err(NodeSetError::MissingElement { element: "UANodeSet" })),
        "Expected MissingElement error, got {:?}",
        result
    );
}

/// Verifies that a node with an unparseable id is skipped and recorded while
/// the rest of the file loads normally.
#[test]
fn test_bad_node_id_is_contained() {
    let xml = MINIMAL_VALID_XML.replace(r#"NodeId="ns=1;i=100""#, r#"NodeId="ns=1;q=100""#);
    let space = load_nodeset_from_str(&xml).expect("Damage must stay contained");

    assert!(space.node(&NodeId::numeric(1, 100)).is_none());
    assert!(space.node(&NodeId::numeric(1, 200)).is_some());
    assert_eq!(space.skipped_nodes().len(), 1);
    assert_eq!(space.skipped_nodes()[0].raw_id, "ns=1;q=100");
}

/// Verifies that a reference pointing at an unparseable target is dropped
/// without taking its owner down.
#[test]
fn test_bad_reference_target_is_contained() {
    let xml = MINIMAL_VALID_XML.replace(">ns=1;i=200</Reference>", ">garbage</Reference>");
    let space = load_nodeset_from_str(&xml).expect("Damage must stay contained");

    let rig = space.node(&NodeId::numeric(1, 100)).expect("Rig must survive");
    assert!(rig.references.is_empty(), "Broken reference must be dropped");
    assert_eq!(space.skipped_nodes().len(), 1);
}

/// Verifies that XML entities in text content are correctly decoded.
#[test]
fn test_xml_entity_decoding() {
    let xml = MINIMAL_VALID_XML.replace(
        "<DisplayName>Rig</DisplayName>",
        "<DisplayName>Rig &amp; Tackle &lt;2&gt;</DisplayName>",
    );
    let space = load_nodeset_from_str(&xml).expect("Failed to parse XML with entities");
    let rig = space.node(&NodeId::numeric(1, 100)).expect("Rig not found");
    assert_eq!(rig.label(), "Rig & Tackle <2>");
}

/// Verifies that a malformed scalar payload degrades to opaque text instead of
/// failing the load.
#[test]
fn test_bad_value_degrades() {
    let xml = MINIMAL_VALID_XML.replace("<Double>42.5</Double>", "<Double>forty-two</Double>");
    let space = load_nodeset_from_str(&xml).expect("Parse should succeed");
    let gauge = space.node(&NodeId::numeric(1, 200)).expect("Gauge not found");
    assert_eq!(gauge.value, Some(Variant::Opaque("forty-two".into())));
}

/// Verifies that unknown elements inside and around nodes are ignored.
#[test]
fn test_unknown_elements_are_ignored() {
    let xml = MINIMAL_VALID_XML.replace(
        "<DisplayName>Rig</DisplayName>",
        "<DisplayName>Rig</DisplayName><Extensions><Extension>vendor stuff</Extension></Extensions>",
    );
    let space = load_nodeset_from_str(&xml).expect("Unknown elements must be ignored");
    assert_eq!(space.len(), 2);
}

/// Verifies that an empty file (header only, no nodes) is a valid empty space.
#[test]
fn test_header_only_file() {
    let xml = r#"<UANodeSet>
  <NamespaceUris>
    <Uri>http://example.com/Empty/</Uri>
  </NamespaceUris>
</UANodeSet>"#;
    let space = load_nodeset_from_str(xml).expect("Header-only file must load");
    assert!(space.is_empty());
    assert_eq!(space.namespaces().len(), 2);
}

/// Verifies that CDATA sections inside values survive verbatim.
#[test]
fn test_cdata_string_value() {
    let xml = MINIMAL_VALID_XML.replace(
        "<Double>42.5</Double>",
        "<String><![CDATA[a < b && c]]></String>",
    );
    let space = load_nodeset_from_str(&xml).expect("CDATA must parse");
    let gauge = space.node(&NodeId::numeric(1, 200)).expect("Gauge not found");
    assert_eq!(gauge.value, Some(Variant::String("a < b && c".into())));
}
