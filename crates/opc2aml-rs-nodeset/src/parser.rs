// crates/opc2aml-rs-nodeset/src/parser.rs

//! Reads a UANodeSet document into an `AddressSpace`.
//!
//! The reader is lenient where the format allows damage to be contained: a
//! node with an unparseable id is skipped and recorded on the space, and a
//! reference with an unparseable partner is dropped the same way. Structural
//! problems (no UANodeSet root) fail the whole load.

use crate::error::NodeSetError;
use crate::space::{
    AddressSpace, DataTypeDefinition, DataTypeField, ModelInfo, UaNode, UaReference,
};
use crate::types::{LocalizedText, NodeClass, NodeId, QualifiedName};
use crate::variant::Variant;
use crate::xml::XmlElement;
use log::{debug, info, warn};
use std::collections::BTreeMap;

/// Parses one NodeSet2 file into a finalized address space.
///
/// When several files make up the working set, load each one and fold them
/// together with [`AddressSpace::merge`], then call
/// [`AddressSpace::finalize`] once more to normalize edges across files.
pub fn load_nodeset_from_str(xml: &str) -> Result<AddressSpace, NodeSetError> {
    let root = XmlElement::parse(xml)?;
    if root.name != "UANodeSet" {
        return Err(NodeSetError::MissingElement {
            element: "UANodeSet",
        });
    }

    let mut space = AddressSpace::new();

    // File-local namespace index -> combined table index. Index 0 is the
    // implied base namespace and never listed.
    let mut remap: Vec<u16> = vec![0];
    if let Some(uris) = root.child("NamespaceUris") {
        for uri in uris.children_named("Uri") {
            remap.push(space.register_namespace(uri.text.trim()));
        }
    }

    if let Some(models) = root.child("Models") {
        for model in models.children_named("Model") {
            space.push_model(parse_model(model));
        }
    }

    let mut aliases: BTreeMap<String, String> = BTreeMap::new();
    if let Some(alias_block) = root.child("Aliases") {
        for alias in alias_block.children_named("Alias") {
            if let Some(name) = alias.attribute("Alias") {
                aliases.insert(name.to_string(), alias.text.trim().to_string());
            }
        }
    }
    debug!(
        "Header: {} namespace(s), {} model(s), {} alias(es)",
        space.namespaces().len(),
        space.models().len(),
        aliases.len()
    );

    let context = ParseContext { aliases, remap };
    for element in &root.children {
        let Some(node_class) = NodeClass::from_element_name(&element.name) else {
            continue;
        };
        match parse_node(element, node_class, &context, &mut space) {
            Ok(node) => space.insert_node(node),
            Err(reason) => {
                let raw = element.attribute("NodeId").unwrap_or("<missing>");
                warn!("Skipping <{}> {}: {}", element.name, raw, reason);
                space.record_skipped(raw, reason);
            }
        }
    }

    space.finalize();
    info!(
        "Loaded {} nodes ({} skipped) from {} namespace(s)",
        space.len(),
        space.skipped_nodes().len(),
        space.namespaces().len()
    );
    Ok(space)
}

struct ParseContext {
    aliases: BTreeMap<String, String>,
    remap: Vec<u16>,
}

impl ParseContext {
    /// Resolves an alias or textual NodeId into the combined namespace table.
    fn resolve_id(&self, raw: &str) -> Result<NodeId, NodeSetError> {
        let resolved = self
            .aliases
            .get(raw.trim())
            .map(String::as_str)
            .unwrap_or(raw);
        let id = NodeId::parse(resolved)?;
        self.remap_namespace(id)
    }

    fn remap_namespace(&self, id: NodeId) -> Result<NodeId, NodeSetError> {
        match self.remap.get(id.namespace as usize) {
            Some(&mapped) => Ok(id.with_namespace(mapped)),
            None => Err(NodeSetError::UnknownNamespaceIndex(id.namespace)),
        }
    }

    fn remap_browse_name(&self, name: QualifiedName) -> QualifiedName {
        match self.remap.get(name.namespace as usize) {
            Some(&mapped) => QualifiedName::new(mapped, name.name),
            None => {
                warn!("Browse name {} uses an unlisted namespace index", name);
                name
            }
        }
    }
}

fn parse_model(element: &XmlElement) -> ModelInfo {
    ModelInfo {
        model_uri: element.attribute("ModelUri").unwrap_or("").to_string(),
        version: element.attribute("Version").map(str::to_string),
        publication_date: element.attribute("PublicationDate").map(str::to_string),
        required_models: element
            .children_named("RequiredModel")
            .filter_map(|r| r.attribute("ModelUri"))
            .map(str::to_string)
            .collect(),
    }
}

fn parse_node(
    element: &XmlElement,
    node_class: NodeClass,
    context: &ParseContext,
    space: &mut AddressSpace,
) -> Result<UaNode, String> {
    let raw_id = element
        .attribute("NodeId")
        .ok_or_else(|| "missing NodeId attribute".to_string())?;
    let node_id = context
        .resolve_id(raw_id)
        .map_err(|e| format!("unparseable NodeId: {}", e))?;

    let browse_name = element
        .attribute("BrowseName")
        .map(QualifiedName::parse)
        .map(|q| context.remap_browse_name(q))
        .unwrap_or_default();

    let mut node = UaNode::new(node_id, node_class, browse_name);
    node.display_name = localized_children(element, "DisplayName");
    node.description = localized_children(element, "Description");
    node.is_abstract = bool_attribute(element, "IsAbstract");
    node.symmetric = bool_attribute(element, "Symmetric");
    node.inverse_name = localized_children(element, "InverseName").into_iter().next();
    node.value_rank = element
        .attribute("ValueRank")
        .and_then(|v| v.trim().parse::<i32>().ok())
        .unwrap_or(-1);
    node.array_dimensions = element.attribute("ArrayDimensions").map(str::to_string);
    node.event_notifier = element
        .attribute("EventNotifier")
        .and_then(|v| v.trim().parse::<u8>().ok());
    node.access_level = element
        .attribute("AccessLevel")
        .and_then(|v| v.trim().parse::<u8>().ok());
    node.minimum_sampling_interval = element
        .attribute("MinimumSamplingInterval")
        .and_then(|v| v.trim().parse::<f64>().ok());
    node.historizing = element
        .attribute("Historizing")
        .map(|v| matches!(v.trim(), "true" | "1"));
    node.executable = element
        .attribute("Executable")
        .map(|v| matches!(v.trim(), "true" | "1"));
    node.contains_no_loops = element
        .attribute("ContainsNoLoops")
        .map(|v| matches!(v.trim(), "true" | "1"));
    if let Some(raw) = element.attribute("ParentNodeId") {
        match context.resolve_id(raw) {
            Ok(id) => node.parent_node_id = Some(id),
            Err(e) => warn!("Ignoring ParentNodeId of {}: {}", node.node_id, e),
        }
    }

    if matches!(node_class, NodeClass::Variable | NodeClass::VariableType) {
        if let Some(raw) = element.attribute("DataType") {
            match context.resolve_id(raw) {
                Ok(id) => node.data_type = Some(id),
                Err(e) => warn!("Ignoring DataType of {}: {}", node.node_id, e),
            }
        }
        node.value = element
            .child("Value")
            .and_then(|v| v.children.first())
            .map(Variant::from_element);
    }

    if node_class == NodeClass::DataType {
        node.definition = element
            .child("Definition")
            .map(|d| parse_definition(d, context));
    }

    if let Some(references) = element.child("References") {
        for reference in references.children_named("Reference") {
            match parse_reference(reference, context) {
                Ok(r) => node.references.push(r),
                Err(e) => {
                    warn!("Dropping reference on {}: {}", node.node_id, e);
                    space.record_skipped(
                        reference.text.trim(),
                        format!("unparseable reference on {}: {}", node.node_id, e),
                    );
                }
            }
        }
    }

    Ok(node)
}

fn parse_reference(element: &XmlElement, context: &ParseContext) -> Result<UaReference, String> {
    let reference_type = element
        .attribute("ReferenceType")
        .ok_or_else(|| "missing ReferenceType attribute".to_string())?;
    let reference_type = context
        .resolve_id(reference_type)
        .map_err(|e| format!("bad reference type: {}", e))?;
    let target = context
        .resolve_id(element.text.trim())
        .map_err(|e| format!("bad target: {}", e))?;
    let is_forward = element
        .attribute("IsForward")
        .map(|v| matches!(v.trim(), "true" | "1"))
        .unwrap_or(true);
    Ok(UaReference {
        reference_type,
        target,
        is_forward,
    })
}

fn parse_definition(element: &XmlElement, context: &ParseContext) -> DataTypeDefinition {
    let mut definition = DataTypeDefinition {
        name: element.attribute("Name").unwrap_or("").to_string(),
        is_union: bool_attribute(element, "IsUnion"),
        is_option_set: bool_attribute(element, "IsOptionSet"),
        fields: Vec::new(),
    };
    for field in element.children_named("Field") {
        let data_type = match field.attribute("DataType") {
            Some(raw) => match context.resolve_id(raw) {
                Ok(id) => id,
                Err(e) => {
                    warn!("Field {} keeps a null type: {}", definition.name, e);
                    NodeId::null()
                }
            },
            None => NodeId::null(),
        };
        definition.fields.push(DataTypeField {
            name: field.attribute("Name").unwrap_or("").to_string(),
            data_type,
            value_rank: field
                .attribute("ValueRank")
                .and_then(|v| v.trim().parse::<i32>().ok())
                .unwrap_or(-1),
            value: field
                .attribute("Value")
                .and_then(|v| v.trim().parse::<i64>().ok()),
            is_optional: bool_attribute(field, "IsOptional"),
        });
    }
    definition
}

fn bool_attribute(element: &XmlElement, name: &str) -> bool {
    element
        .attribute(name)
        .map(|v| matches!(v.trim(), "true" | "1"))
        .unwrap_or(false)
}

fn localized_children(element: &XmlElement, name: &str) -> Vec<LocalizedText> {
    element
        .children_named(name)
        .map(|child| LocalizedText {
            locale: child.attribute("Locale").unwrap_or("").trim().to_string(),
            text: child.text.clone(),
        })
        .collect()
}
