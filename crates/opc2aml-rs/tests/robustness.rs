// crates/opc2aml-rs/tests/robustness.rs

//! Defective input never panics the converter: bad material degrades into
//! report entries and only identifier collisions abort.

use opc2aml_rs::{ConvertError, ConvertOptions, IssueKind, convert, ident};
use opc2aml_rs_caex::CaexKind;
use opc2aml_rs_nodeset::{AddressSpace, NodeId, load_nodeset_from_str};

fn space_from(xml: &str) -> AddressSpace {
    let mut space = AddressSpace::new();
    space.merge(load_nodeset_from_str(xml).expect("load failed"));
    space.finalize();
    space
}

#[test]
fn test_malformed_node_id_is_skipped_and_reported() {
    let space = space_from(
        r#"<UANodeSet>
  <NamespaceUris>
    <Uri>http://example.com/Broken/</Uri>
  </NamespaceUris>
  <UAObject NodeId="ns=1;x=99" BrowseName="1:Broken">
    <DisplayName>Broken</DisplayName>
  </UAObject>
  <UAObject NodeId="ns=1;i=1" BrowseName="1:Fine">
    <DisplayName>Fine</DisplayName>
    <References>
      <Reference ReferenceType="i=47">ns=1;i=2</Reference>
    </References>
  </UAObject>
  <UAObject NodeId="ns=1;i=2" BrowseName="1:Child">
    <DisplayName>Child</DisplayName>
  </UAObject>
</UANodeSet>"#,
    );

    let conversion = convert(&space, &ConvertOptions::default()).expect("conversion failed");
    assert_eq!(
        conversion.report.count_of(IssueKind::MalformedIdentifier),
        1
    );
    assert!(!conversion.report.has_fatal());

    // The well-formed half of the file still converts.
    let fine = ident::encode("http://example.com/Broken/", &NodeId::numeric(1, 1));
    assert!(conversion.document.find_by_id(&fine).is_some());
}

#[test]
fn test_unresolvable_reference_target_is_reported() {
    let space = space_from(
        r#"<UANodeSet>
  <NamespaceUris>
    <Uri>http://example.com/Dangling/</Uri>
  </NamespaceUris>
  <UAObject NodeId="ns=1;i=1" BrowseName="1:Rack">
    <DisplayName>Rack</DisplayName>
    <References>
      <Reference ReferenceType="i=47">ns=1;i=2</Reference>
      <Reference ReferenceType="i=47">ns=1;i=99</Reference>
    </References>
  </UAObject>
  <UAObject NodeId="ns=1;i=2" BrowseName="1:Slot">
    <DisplayName>Slot</DisplayName>
  </UAObject>
</UANodeSet>"#,
    );

    let conversion = convert(&space, &ConvertOptions::default()).expect("conversion failed");
    assert_eq!(
        conversion.report.count_of(IssueKind::UnresolvedReference),
        1,
        "unexpected report: {}",
        conversion.report
    );
    assert!(!conversion.report.has_fatal());

    // The present child is still placed under the rack.
    let rack = conversion
        .document
        .find_by_id(&ident::encode("http://example.com/Dangling/", &NodeId::numeric(1, 1)))
        .expect("Rack not found");
    assert_eq!(
        conversion
            .document
            .children_of(rack)
            .iter()
            .filter(|&&c| conversion.document.object(c).kind == CaexKind::InternalElement)
            .count(),
        1
    );
}

#[test]
fn test_childless_unclaimed_node_is_an_orphan() {
    let space = space_from(
        r#"<UANodeSet>
  <NamespaceUris>
    <Uri>http://example.com/Lonely/</Uri>
  </NamespaceUris>
  <UAObject NodeId="ns=1;i=1" BrowseName="1:Stray">
    <DisplayName>Stray</DisplayName>
  </UAObject>
</UANodeSet>"#,
    );

    let conversion = convert(&space, &ConvertOptions::default()).expect("conversion failed");
    assert_eq!(conversion.report.count_of(IssueKind::OrphanNode), 1);
    let stray = ident::encode("http://example.com/Lonely/", &NodeId::numeric(1, 1));
    assert!(
        conversion.document.find_by_id(&stray).is_none(),
        "an orphan must not materialize"
    );
}

/// A reference type named like an entry-kind prefix collides with the entry
/// identifier space; the guard refuses to emit the document.
#[test]
fn test_identifier_collision_aborts_conversion() {
    let space = space_from(
        r#"<UANodeSet>
  <NamespaceUris>
    <Uri>http://example.com/Collide/</Uri>
  </NamespaceUris>
  <UAReferenceType NodeId="ns=1;i=5001" BrowseName="1:SUC">
    <DisplayName>SUC</DisplayName>
    <InverseName>CUS</InverseName>
  </UAReferenceType>
  <UAObjectType NodeId="ns=1;i=5000" BrowseName="1:HoistType">
    <DisplayName>HoistType</DisplayName>
    <References>
      <Reference ReferenceType="ns=1;i=5001">ns=1;i=5002</Reference>
    </References>
  </UAObjectType>
  <UAObjectType NodeId="ns=1;i=5002" BrowseName="1:WinchType">
    <DisplayName>WinchType</DisplayName>
  </UAObjectType>
</UANodeSet>"#,
    );

    let error = convert(&space, &ConvertOptions::default()).expect_err("conversion should abort");
    assert!(matches!(
        error,
        ConvertError::DuplicateIdentifiers { count: 1 }
    ));
}

#[test]
fn test_quirk_toggle_switches_renditions() {
    let space = space_from(
        r#"<UANodeSet>
  <NamespaceUris>
    <Uri>http://example.com/Quirks/</Uri>
  </NamespaceUris>
  <UAObject NodeId="ns=1;i=1" BrowseName="1:Line">
    <DisplayName>Line</DisplayName>
    <References>
      <Reference ReferenceType="i=46">ns=1;i=2</Reference>
    </References>
  </UAObject>
  <UAVariable NodeId="ns=1;i=2" BrowseName="1:Timeout" DataType="i=290" ValueRank="1" ArrayDimensions="3">
    <DisplayName>Timeout</DisplayName>
    <Value>
      <Double xmlns="http://opcfoundation.org/UA/2008/02/Types.xsd">90.5</Double>
    </Value>
  </UAVariable>
</UANodeSet>"#,
    );

    let uri = "http://example.com/Quirks/";
    let legacy = convert(&space, &ConvertOptions::new("quirks.aml")).expect("conversion failed");
    let mut strict_options = ConvertOptions::new("quirks.aml");
    strict_options.legacy_datatype_quirks = false;
    let strict = convert(&space, &strict_options).expect("conversion failed");

    let timeout_id = ident::encode(uri, &NodeId::numeric(1, 2));

    let handle = legacy.document.find_by_id(&timeout_id).expect("Timeout not found");
    let attributes = &legacy.document.object(handle).attributes;
    let value = attributes.iter().find(|a| a.name == "Value").expect("Value");
    assert_eq!(value.data_type.as_deref(), Some("xs:unsignedByte"));
    assert_eq!(value.value.as_deref(), Some("90"), "durations truncate to whole seconds");
    let dimensions = attributes
        .iter()
        .find(|a| a.name == "ArrayDimensions")
        .expect("ArrayDimensions");
    assert!(dimensions.data_type.is_none());

    let handle = strict.document.find_by_id(&timeout_id).expect("Timeout not found");
    let attributes = &strict.document.object(handle).attributes;
    let value = attributes.iter().find(|a| a.name == "Value").expect("Value");
    assert_eq!(value.data_type.as_deref(), Some("xs:double"));
    assert_eq!(value.value.as_deref(), Some("90.5"));
    let dimensions = attributes
        .iter()
        .find(|a| a.name == "ArrayDimensions")
        .expect("ArrayDimensions");
    assert_eq!(dimensions.data_type.as_deref(), Some("xs:string"));
}
