// crates/opc2aml-rs-nodeset/tests/parsing.rs

use opc2aml_rs_nodeset::{
    AddressSpace, ID_HAS_COMPONENT, ID_ORGANIZES, NodeClass, NodeId, Variant,
    load_nodeset_from_str,
};
use std::fs;
use std::path::PathBuf;

/// Helper function to load a test file from the `tests/data/` directory.
fn load_test_file(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("data");
    path.push(name);

    fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read test file {:?}: {}", path, e))
}

/// This test validates the full header and body of a small machine model:
/// namespaces, models, alias resolution, typed values, and the reference
/// normalization applied after loading.
#[test]
fn test_load_press_line() {
    let xml_content = load_test_file("press_line.nodeset2.xml");
    let space = load_nodeset_from_str(&xml_content).expect("Failed to parse press line model");

    // 1. Header: the base namespace is implied at index 0.
    assert_eq!(space.namespaces().len(), 2);
    assert_eq!(space.namespace_index("http://example.com/PressLine/"), Some(1));
    let model = &space.models()[0];
    assert_eq!(model.model_uri, "http://example.com/PressLine/");
    assert_eq!(model.version.as_deref(), Some("1.0.0"));
    assert_eq!(model.required_models, vec!["http://opcfoundation.org/UA/"]);

    // 2. Alias resolution: `HasComponent` resolves to i=47.
    let press = space
        .node(&NodeId::numeric(1, 5001))
        .expect("Press 1 not found");
    assert_eq!(press.node_class, NodeClass::Object);
    assert!(
        press
            .forward_references()
            .any(|r| r.reference_type == NodeId::numeric(0, ID_HAS_COMPONENT)
                && r.target == NodeId::numeric(1, 6001)),
        "HasComponent alias was not resolved"
    );

    // 3. The Organizes edge comes from the absent Objects folder; only its
    // inverse half can be stored.
    assert!(
        press
            .references
            .iter()
            .any(|r| !r.is_forward
                && r.reference_type == NodeId::numeric(0, ID_ORGANIZES)
                && r.target == NodeId::numeric(0, 85)),
        "Organizes edge from the Objects folder is missing"
    );

    // 4. Typed values survive with their built-in type.
    let stroke_rate = space
        .node(&NodeId::numeric(1, 6001))
        .expect("StrokeRate not found");
    assert_eq!(stroke_rate.value, Some(Variant::Float(123.456)));
    let serial = space
        .node(&NodeId::string(1, "Press1.Serial"))
        .expect("Serial not found");
    assert_eq!(serial.value, Some(Variant::String("PL-0042".into())));

    // 5. The enumeration definition keeps its literals in order.
    let state = space
        .node(&NodeId::numeric(1, 3001))
        .expect("PressState not found");
    let definition = state.definition.as_ref().expect("Definition missing");
    let names: Vec<&str> = definition.fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["Idle", "Forming", "Fault"]);
    assert_eq!(state.supertype(), Some(&NodeId::numeric(0, 29)));
}

/// Loading two files must produce one coherent working set: shared namespaces
/// collapse, new ones append, and cross-file edges get their missing halves.
#[test]
fn test_merge_two_files() {
    let first = load_nodeset_from_str(&load_test_file("press_line.nodeset2.xml"))
        .expect("Failed to parse press line model");

    let second_xml = r#"<UANodeSet>
  <NamespaceUris>
    <Uri>http://example.com/Plant/</Uri>
    <Uri>http://example.com/PressLine/</Uri>
  </NamespaceUris>
  <UAObject NodeId="ns=1;i=9001" BrowseName="1:Cell">
    <DisplayName>Cell</DisplayName>
    <References>
      <Reference ReferenceType="i=47">ns=2;i=5001</Reference>
    </References>
  </UAObject>
</UANodeSet>"#;
    let second = load_nodeset_from_str(second_xml).expect("Failed to parse plant model");

    let mut combined = AddressSpace::new();
    combined.merge(first);
    combined.merge(second);
    combined.finalize();

    // PressLine was loaded first and keeps index 1; Plant appends at 2.
    assert_eq!(combined.namespace_index("http://example.com/PressLine/"), Some(1));
    assert_eq!(combined.namespace_index("http://example.com/Plant/"), Some(2));

    // The cell's component reference was remapped onto the combined table.
    let cell = combined
        .node(&NodeId::numeric(2, 9001))
        .expect("Cell not found after merge");
    let component = cell
        .forward_references()
        .next()
        .expect("Cell component reference missing");
    assert_eq!(component.target, NodeId::numeric(1, 5001));

    // After the second finalize the press carries the inverse half.
    let press = combined
        .node(&NodeId::numeric(1, 5001))
        .expect("Press 1 not found after merge");
    assert!(
        press
            .references
            .iter()
            .any(|r| !r.is_forward && r.target == NodeId::numeric(2, 9001)),
        "Cross-file edge was not normalized"
    );
}
