// crates/opc2aml-rs-nodeset/src/space.rs

//! The in-memory address-space graph: nodes in declaration order, an id index,
//! the combined namespace table, and the reference normalization that gives
//! every logical edge exactly one forward representation.

use crate::types::{
    BASE_NAMESPACE_URI, ID_HAS_ENCODING, ID_HAS_SUBTYPE, ID_HAS_TYPE_DEFINITION,
    ID_HIERARCHICAL_REFERENCES, LocalizedText, NodeClass, NodeId, QualifiedName,
    well_known_reference,
};
use crate::variant::{BuiltInType, Variant};
use log::{debug, warn};
use std::collections::{BTreeMap, BTreeSet};

/// One directed, typed edge as stored on a node. `is_forward == false` means
/// the node is the target of the logical edge and `target` names its source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UaReference {
    pub reference_type: NodeId,
    pub target: NodeId,
    pub is_forward: bool,
}

/// One field of a data-type definition: a structure member, an enumeration
/// literal, or an option-set bit.
#[derive(Debug, Clone, PartialEq)]
pub struct DataTypeField {
    pub name: String,
    /// The field's declared type; null for enumeration literals.
    pub data_type: NodeId,
    pub value_rank: i32,
    /// Literal value (enumerations) or bit position (option sets).
    pub value: Option<i64>,
    pub is_optional: bool,
}

/// The `<Definition>` block of a UADataType node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataTypeDefinition {
    pub name: String,
    pub is_union: bool,
    pub is_option_set: bool,
    pub fields: Vec<DataTypeField>,
}

/// A `<Model>` entry from the file header, with the models it builds on.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelInfo {
    pub model_uri: String,
    pub version: Option<String>,
    pub publication_date: Option<String>,
    pub required_models: Vec<String>,
}

/// A node element that had to be dropped during parsing, kept so the converter
/// can fold the loss into its report instead of losing it silently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedNode {
    pub raw_id: String,
    pub reason: String,
}

/// One node of any of the eight classes. Class-specific attributes that do not
/// apply stay at their defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct UaNode {
    pub node_id: NodeId,
    pub node_class: NodeClass,
    pub browse_name: QualifiedName,
    pub display_name: Vec<LocalizedText>,
    pub description: Vec<LocalizedText>,
    pub references: Vec<UaReference>,
    pub is_abstract: bool,
    /// ReferenceType only.
    pub symmetric: bool,
    /// ReferenceType only; absent for symmetric types.
    pub inverse_name: Option<LocalizedText>,
    /// Variable/VariableType: the declared value type.
    pub data_type: Option<NodeId>,
    /// Variable/VariableType; -1 (scalar) when the attribute is absent.
    pub value_rank: i32,
    /// Variable/VariableType: the raw `ArrayDimensions` attribute text.
    pub array_dimensions: Option<String>,
    /// DataType only.
    pub definition: Option<DataTypeDefinition>,
    /// Variable/VariableType: the parsed `<Value>` payload.
    pub value: Option<Variant>,
    /// Object/View: the EventNotifier bit mask, when declared.
    pub event_notifier: Option<u8>,
    /// Variable: the AccessLevel bit mask, when declared.
    pub access_level: Option<u8>,
    /// Variable, in milliseconds.
    pub minimum_sampling_interval: Option<f64>,
    /// Variable.
    pub historizing: Option<bool>,
    /// Method.
    pub executable: Option<bool>,
    /// View.
    pub contains_no_loops: Option<bool>,
    /// Informational only; the tree is derived from references.
    pub parent_node_id: Option<NodeId>,
}

impl UaNode {
    pub fn new(node_id: NodeId, node_class: NodeClass, browse_name: QualifiedName) -> Self {
        UaNode {
            node_id,
            node_class,
            browse_name,
            display_name: Vec::new(),
            description: Vec::new(),
            references: Vec::new(),
            is_abstract: false,
            symmetric: false,
            inverse_name: None,
            data_type: None,
            value_rank: -1,
            array_dimensions: None,
            definition: None,
            value: None,
            event_notifier: None,
            access_level: None,
            minimum_sampling_interval: None,
            historizing: None,
            executable: None,
            contains_no_loops: None,
            parent_node_id: None,
        }
    }

    /// The first non-empty display name, the usual label for output objects.
    pub fn display_text(&self) -> Option<&str> {
        self.display_name
            .iter()
            .map(|t| t.text.as_str())
            .find(|t| !t.is_empty())
    }

    /// Display name with browse-name fallback; empty only for degenerate input.
    pub fn label(&self) -> &str {
        self.display_text().unwrap_or(&self.browse_name.name)
    }

    /// The supertype of a type node, read from the inverse HasSubtype edge.
    pub fn supertype(&self) -> Option<&NodeId> {
        self.references
            .iter()
            .find(|r| !r.is_forward && r.reference_type.is_base(ID_HAS_SUBTYPE))
            .map(|r| &r.target)
    }

    /// The type definition of an instance node.
    pub fn type_definition(&self) -> Option<&NodeId> {
        self.references
            .iter()
            .find(|r| r.is_forward && r.reference_type.is_base(ID_HAS_TYPE_DEFINITION))
            .map(|r| &r.target)
    }

    pub fn forward_references(&self) -> impl Iterator<Item = &UaReference> {
        self.references.iter().filter(|r| r.is_forward)
    }
}

/// The merged working set of one or more NodeSet2 files.
///
/// Nodes keep their declaration order; the namespace table is global, with
/// index 0 fixed to the OPC UA base namespace. Lookups by id go through a
/// sorted index.
#[derive(Debug, Clone, Default)]
pub struct AddressSpace {
    namespaces: Vec<String>,
    models: Vec<ModelInfo>,
    nodes: Vec<UaNode>,
    index: BTreeMap<NodeId, usize>,
    skipped: Vec<SkippedNode>,
}

impl AddressSpace {
    pub fn new() -> Self {
        AddressSpace {
            namespaces: vec![BASE_NAMESPACE_URI.to_string()],
            models: Vec::new(),
            nodes: Vec::new(),
            index: BTreeMap::new(),
            skipped: Vec::new(),
        }
    }

    /// The namespace table; index 0 is always the OPC UA base namespace.
    pub fn namespaces(&self) -> &[String] {
        &self.namespaces
    }

    pub fn namespace_index(&self, uri: &str) -> Option<u16> {
        self.namespaces.iter().position(|n| n == uri).map(|i| i as u16)
    }

    pub fn namespace_uri(&self, index: u16) -> Option<&str> {
        self.namespaces.get(index as usize).map(String::as_str)
    }

    /// Returns the index for `uri`, appending it to the table if new.
    pub fn register_namespace(&mut self, uri: &str) -> u16 {
        if let Some(index) = self.namespace_index(uri) {
            return index;
        }
        self.namespaces.push(uri.to_string());
        (self.namespaces.len() - 1) as u16
    }

    pub fn models(&self) -> &[ModelInfo] {
        &self.models
    }

    pub fn push_model(&mut self, model: ModelInfo) {
        self.models.push(model);
    }

    /// True when a `<Model>` entry (or, for header-less files, a namespace
    /// table entry) declares the given URI.
    pub fn contains_model(&self, uri: &str) -> bool {
        self.models.iter().any(|m| m.model_uri == uri)
            || self.namespaces.iter().any(|n| n == uri)
    }

    pub fn nodes(&self) -> &[UaNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: &NodeId) -> Option<&UaNode> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.index.contains_key(id)
    }

    /// Appends a node, keeping the first declaration when an id repeats.
    pub fn insert_node(&mut self, node: UaNode) {
        if self.index.contains_key(&node.node_id) {
            warn!("Ignoring redeclaration of node {}", node.node_id);
            return;
        }
        self.index.insert(node.node_id.clone(), self.nodes.len());
        self.nodes.push(node);
    }

    pub fn record_skipped(&mut self, raw_id: impl Into<String>, reason: impl Into<String>) {
        self.skipped.push(SkippedNode {
            raw_id: raw_id.into(),
            reason: reason.into(),
        });
    }

    pub fn skipped_nodes(&self) -> &[SkippedNode] {
        &self.skipped
    }

    /// Nodes ordered for deterministic traversal: ascending namespace index of
    /// the owning id, declaration order within a namespace.
    pub fn visit_order(&self) -> Vec<&UaNode> {
        let mut ordered: Vec<&UaNode> = self.nodes.iter().collect();
        ordered.sort_by_key(|n| n.node_id.namespace);
        ordered
    }

    /// Folds another file's space into this one. Namespace indices of the
    /// other space are remapped into the combined table, so ids stay stable
    /// across any load order. Nodes already present keep their first
    /// declaration.
    pub fn merge(&mut self, other: AddressSpace) {
        let mut remap: Vec<u16> = Vec::with_capacity(other.namespaces.len());
        for uri in &other.namespaces {
            remap.push(self.register_namespace(uri));
        }
        let map_id = |id: &NodeId| -> NodeId {
            match remap.get(id.namespace as usize) {
                Some(&mapped) => id.with_namespace(mapped),
                None => {
                    warn!("Namespace index {} out of table range in {}", id.namespace, id);
                    id.clone()
                }
            }
        };

        for model in other.models {
            if !self.models.iter().any(|m| m.model_uri == model.model_uri) {
                self.models.push(model);
            }
        }
        self.skipped.extend(other.skipped);

        let mut added = 0usize;
        for mut node in other.nodes {
            node.node_id = map_id(&node.node_id);
            for reference in &mut node.references {
                reference.reference_type = map_id(&reference.reference_type);
                reference.target = map_id(&reference.target);
            }
            if let Some(data_type) = &node.data_type {
                node.data_type = Some(map_id(data_type));
            }
            if let Some(parent) = &node.parent_node_id {
                node.parent_node_id = Some(map_id(parent));
            }
            if let Some(definition) = &mut node.definition {
                for field in &mut definition.fields {
                    if !field.data_type.is_null() {
                        field.data_type = map_id(&field.data_type);
                    }
                }
            }
            if !self.index.contains_key(&node.node_id) {
                added += 1;
            }
            self.insert_node(node);
        }
        debug!(
            "Merged {} new nodes; namespace table now has {} entries",
            added,
            self.namespaces.len()
        );
    }

    /// Normalizes references so each logical edge appears exactly once in
    /// forward form at its source and once in inverse form at its target.
    ///
    /// Files may declare an edge at either end, at both, or only inversely;
    /// after this pass all duplicates are collapsed and the missing direction
    /// is injected wherever the partner node exists in the working set.
    pub fn finalize(&mut self) {
        let mut seen: BTreeSet<(NodeId, NodeId, NodeId)> = BTreeSet::new();
        let mut edges: Vec<(NodeId, NodeId, NodeId)> = Vec::new();

        for node in &self.nodes {
            for reference in &node.references {
                let (source, target) = if reference.is_forward {
                    (node.node_id.clone(), reference.target.clone())
                } else {
                    (reference.target.clone(), node.node_id.clone())
                };
                let key = (source, reference.reference_type.clone(), target);
                if seen.insert(key.clone()) {
                    edges.push(key);
                }
            }
        }

        for node in &mut self.nodes {
            node.references.clear();
        }
        for (source, reference_type, target) in edges {
            let source_index = self.index.get(&source).copied();
            let target_index = self.index.get(&target).copied();
            match source_index {
                Some(i) => {
                    self.nodes[i].references.push(UaReference {
                        reference_type: reference_type.clone(),
                        target: target.clone(),
                        is_forward: true,
                    });
                    if let Some(j) = target_index {
                        self.nodes[j].references.push(UaReference {
                            reference_type,
                            target: source,
                            is_forward: false,
                        });
                    }
                }
                None => {
                    // Source outside the working set; keep the inverse entry
                    // so the edge stays visible to integrity reporting.
                    if let Some(j) = target_index {
                        self.nodes[j].references.push(UaReference {
                            reference_type,
                            target: source,
                            is_forward: false,
                        });
                    }
                }
            }
        }
    }

    /// One step up the subtype hierarchy.
    pub fn supertype_of(&self, id: &NodeId) -> Option<NodeId> {
        self.node(id).and_then(|n| n.supertype().cloned())
    }

    /// Whether a reference type descends from HierarchicalReferences, resolved
    /// from the loaded graph with the registered base table as fallback when
    /// the defining ns=0 node is not part of the working set.
    pub fn is_hierarchical_reference(&self, reference_type: &NodeId) -> bool {
        let mut current = reference_type.clone();
        let mut visited: BTreeSet<NodeId> = BTreeSet::new();
        loop {
            if current.is_base(ID_HIERARCHICAL_REFERENCES) {
                return true;
            }
            if !visited.insert(current.clone()) {
                warn!("Subtype cycle at reference type {}", current);
                return false;
            }
            match self.supertype_of(&current) {
                Some(parent) => current = parent,
                None => {
                    return match &current.identifier {
                        crate::types::Identifier::Numeric(v) if current.namespace == 0 => {
                            well_known_reference(*v).is_some_and(|r| r.hierarchical)
                        }
                        _ => false,
                    };
                }
            }
        }
    }

    /// The browse name of a reference type, falling back to the registered
    /// base table for ns=0 types missing from the working set.
    pub fn reference_type_name(&self, id: &NodeId) -> Option<String> {
        if let Some(node) = self.node(id) {
            return Some(node.browse_name.name.clone());
        }
        match &id.identifier {
            crate::types::Identifier::Numeric(v) if id.namespace == 0 => {
                well_known_reference(*v).map(|r| r.name.to_string())
            }
            _ => None,
        }
    }

    /// The inverse name of a reference type, if it declares one.
    pub fn reference_inverse_name(&self, id: &NodeId) -> Option<String> {
        if let Some(node) = self.node(id) {
            return node.inverse_name.as_ref().map(|t| t.text.clone());
        }
        match &id.identifier {
            crate::types::Identifier::Numeric(v) if id.namespace == 0 => {
                well_known_reference(*v).and_then(|r| r.inverse.map(str::to_string))
            }
            _ => None,
        }
    }

    /// Resolves a data type to its built-in base by walking the supertype
    /// chain until a ns=0 built-in id is reached.
    pub fn builtin_base(&self, data_type: &NodeId) -> Option<BuiltInType> {
        let mut current = data_type.clone();
        let mut visited: BTreeSet<NodeId> = BTreeSet::new();
        loop {
            if current.namespace == 0 {
                if let crate::types::Identifier::Numeric(v) = current.identifier {
                    if let Some(builtin) = BuiltInType::from_id(v) {
                        return Some(builtin);
                    }
                }
            }
            if !visited.insert(current.clone()) {
                warn!("Subtype cycle at data type {}", current);
                return None;
            }
            current = self.supertype_of(&current)?;
        }
    }

    /// Maps an encoding object (the target of a HasEncoding edge) back to the
    /// data type that owns it.
    pub fn data_type_for_encoding(&self, encoding_id: &NodeId) -> Option<NodeId> {
        let node = self.node(encoding_id)?;
        node.references
            .iter()
            .find(|r| !r.is_forward && r.reference_type.is_base(ID_HAS_ENCODING))
            .map(|r| r.target.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ID_HAS_COMPONENT, ID_ORGANIZES};

    fn node(id: NodeId, class: NodeClass, name: &str) -> UaNode {
        UaNode::new(id, class, QualifiedName::new(0, name))
    }

    fn forward(reference_type: u32, target: NodeId) -> UaReference {
        UaReference {
            reference_type: NodeId::numeric(0, reference_type),
            target,
            is_forward: true,
        }
    }

    #[test]
    fn test_insert_keeps_first_declaration() {
        let mut space = AddressSpace::new();
        let mut first = node(NodeId::numeric(1, 5), NodeClass::Object, "First");
        first.is_abstract = true;
        space.insert_node(first);
        space.insert_node(node(NodeId::numeric(1, 5), NodeClass::Object, "Second"));
        assert_eq!(space.len(), 1);
        assert_eq!(space.node(&NodeId::numeric(1, 5)).unwrap().browse_name.name, "First");
    }

    #[test]
    fn test_merge_remaps_namespace_indices() {
        let mut target = AddressSpace::new();
        target.register_namespace("http://vendor-a.example/UA/");

        let mut incoming = AddressSpace::new();
        incoming.register_namespace("http://vendor-b.example/UA/");
        let mut n = node(NodeId::numeric(1, 7), NodeClass::Object, "Widget");
        n.references.push(forward(ID_HAS_COMPONENT, NodeId::numeric(1, 8)));
        incoming.insert_node(n);

        target.merge(incoming);
        // vendor-b lands at index 2 in the combined table.
        assert_eq!(target.namespace_index("http://vendor-b.example/UA/"), Some(2));
        let merged = target.node(&NodeId::numeric(2, 7)).expect("node not remapped");
        assert_eq!(merged.references[0].target, NodeId::numeric(2, 8));
        assert!(target.node(&NodeId::numeric(1, 7)).is_none());
    }

    #[test]
    fn test_finalize_injects_inverse_and_deduplicates() {
        let mut space = AddressSpace::new();
        let mut parent = node(NodeId::numeric(1, 1), NodeClass::Object, "Parent");
        parent.references.push(forward(ID_HAS_COMPONENT, NodeId::numeric(1, 2)));
        space.insert_node(parent);
        // The child declares the same edge inversely; it must not double up.
        let mut child = node(NodeId::numeric(1, 2), NodeClass::Object, "Child");
        child.references.push(UaReference {
            reference_type: NodeId::numeric(0, ID_HAS_COMPONENT),
            target: NodeId::numeric(1, 1),
            is_forward: false,
        });
        space.insert_node(child);
        space.finalize();

        let parent = space.node(&NodeId::numeric(1, 1)).unwrap();
        assert_eq!(parent.references.len(), 1);
        assert!(parent.references[0].is_forward);
        let child = space.node(&NodeId::numeric(1, 2)).unwrap();
        assert_eq!(child.references.len(), 1);
        assert!(!child.references[0].is_forward);
        assert_eq!(child.references[0].target, NodeId::numeric(1, 1));
    }

    #[test]
    fn test_finalize_materializes_forward_from_inverse_only() {
        let mut space = AddressSpace::new();
        space.insert_node(node(NodeId::numeric(1, 1), NodeClass::Object, "Parent"));
        let mut child = node(NodeId::numeric(1, 2), NodeClass::Object, "Child");
        child.references.push(UaReference {
            reference_type: NodeId::numeric(0, ID_ORGANIZES),
            target: NodeId::numeric(1, 1),
            is_forward: false,
        });
        space.insert_node(child);
        space.finalize();

        let parent = space.node(&NodeId::numeric(1, 1)).unwrap();
        assert_eq!(parent.references.len(), 1, "forward edge must be materialized");
        assert!(parent.references[0].is_forward);
        assert_eq!(parent.references[0].target, NodeId::numeric(1, 2));
    }

    #[test]
    fn test_hierarchical_classification_from_graph() {
        let mut space = AddressSpace::new();
        space.register_namespace("http://vendor.example/UA/");
        // A custom reference type derived from Organizes.
        let mut custom = node(NodeId::numeric(1, 100), NodeClass::ReferenceType, "Routes");
        custom.references.push(UaReference {
            reference_type: NodeId::numeric(0, ID_HAS_SUBTYPE),
            target: NodeId::numeric(0, ID_ORGANIZES),
            is_forward: false,
        });
        space.insert_node(custom);

        assert!(space.is_hierarchical_reference(&NodeId::numeric(1, 100)));
        // Fallback table serves types that are not part of the working set.
        assert!(space.is_hierarchical_reference(&NodeId::numeric(0, ID_HAS_COMPONENT)));
        assert!(!space.is_hierarchical_reference(&NodeId::numeric(0, ID_HAS_TYPE_DEFINITION)));
    }

    #[test]
    fn test_builtin_base_walks_supertype_chain() {
        let mut space = AddressSpace::new();
        space.register_namespace("http://vendor.example/UA/");
        // VendorDouble -> Double (i=11)
        let mut vendor = node(NodeId::numeric(1, 200), NodeClass::DataType, "VendorDouble");
        vendor.references.push(UaReference {
            reference_type: NodeId::numeric(0, ID_HAS_SUBTYPE),
            target: NodeId::numeric(0, 11),
            is_forward: false,
        });
        space.insert_node(vendor);

        assert_eq!(space.builtin_base(&NodeId::numeric(1, 200)), Some(BuiltInType::Double));
        assert_eq!(space.builtin_base(&NodeId::numeric(0, 12)), Some(BuiltInType::String));
        assert_eq!(space.builtin_base(&NodeId::numeric(1, 999)), None);
    }

    #[test]
    fn test_data_type_for_encoding() {
        let mut space = AddressSpace::new();
        let mut data_type = node(NodeId::numeric(0, 296), NodeClass::DataType, "Argument");
        data_type.references.push(forward(ID_HAS_ENCODING, NodeId::numeric(0, 297)));
        space.insert_node(data_type);
        space.insert_node(node(NodeId::numeric(0, 297), NodeClass::Object, "Default XML"));
        space.finalize();

        assert_eq!(
            space.data_type_for_encoding(&NodeId::numeric(0, 297)),
            Some(NodeId::numeric(0, 296))
        );
    }
}
