// crates/opc2aml-rs/src/hierarchy.rs

//! The hierarchy builder: the reference graph becomes an exact tree.
//!
//! Hierarchical forward edges (HasSubtype excepted) claim their targets in a
//! fixed global order: nodes grouped by namespace index ascending, then
//! declaration order, each node's edges in declaration order. A node
//! reachable through more than one hierarchical reference stays under the
//! first parent that claimed it; the losing edges are externalized later as
//! internal links. Unclaimed instance nodes root one instance hierarchy each
//! when they own children (or are the well-known Root folder); childless
//! unclaimed instances are orphans: excluded, logged, reported.

use crate::encode::ValueEncoder;
use crate::ident;
use crate::report::{ConversionReport, Issue};
use crate::typelib;
use log::debug;
use opc2aml_rs_caex::{CaexDocument, CaexKind, Handle, PayloadRole};
use opc2aml_rs_nodeset::{
    AddressSpace, ID_HAS_SUBTYPE, ID_ROOT_FOLDER, NodeClass, NodeId, UaNode,
};
use std::collections::{BTreeMap, BTreeSet};

/// One realized parent/child containment edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TreeEdge {
    pub source: NodeId,
    pub target: NodeId,
    pub reference_type: NodeId,
}

/// The materialized tree: object placement plus the edges that shaped it.
pub(crate) struct BuiltTree {
    /// Source node to its output object, library entries included.
    pub placed: BTreeMap<NodeId, Handle>,
    /// Containment edges realized as parent/child pairs, in output order.
    pub tree_edges: Vec<TreeEdge>,
    /// Edges consumed by claiming, as (source, reference type, target);
    /// includes claims whose subtree could not be rendered.
    pub consumed: BTreeSet<(NodeId, NodeId, NodeId)>,
}

/// Parent assignment resolved over the whole graph before anything
/// materializes, so "first writer wins" is independent of tree shape.
struct Claims {
    parent_of: BTreeMap<NodeId, NodeId>,
    /// Claimed children per parent, in the parent's edge declaration order.
    children_of: BTreeMap<NodeId, Vec<(NodeId, NodeId)>>,
    consumed: BTreeSet<(NodeId, NodeId, NodeId)>,
}

impl Claims {
    fn resolve(space: &AddressSpace) -> Self {
        let mut claims = Claims {
            parent_of: BTreeMap::new(),
            children_of: BTreeMap::new(),
            consumed: BTreeSet::new(),
        };
        for node in space.visit_order() {
            for reference in &node.references {
                if !reference.is_forward
                    || reference.reference_type.is_base(ID_HAS_SUBTYPE)
                    || !space.is_hierarchical_reference(&reference.reference_type)
                {
                    continue;
                }
                // A self edge cannot parent; the externalizer picks it up.
                if reference.target == node.node_id {
                    continue;
                }
                // Targets outside the working set stay unconsumed so the
                // externalizer reports them.
                let Some(target) = space.node(&reference.target) else {
                    continue;
                };
                // Types belong to their libraries, never to a parent element.
                if target.node_class.is_type() {
                    continue;
                }
                if claims.parent_of.contains_key(&reference.target) {
                    continue;
                }
                claims
                    .parent_of
                    .insert(reference.target.clone(), node.node_id.clone());
                claims
                    .children_of
                    .entry(node.node_id.clone())
                    .or_default()
                    .push((reference.target.clone(), reference.reference_type.clone()));
                claims.consumed.insert((
                    node.node_id.clone(),
                    reference.reference_type.clone(),
                    reference.target.clone(),
                ));
            }
        }
        claims
    }

    fn owns_children(&self, id: &NodeId) -> bool {
        self.children_of.get(id).is_some_and(|c| !c.is_empty())
    }
}

/// Materializes every instance node into the document.
///
/// `placed_types` is the type mirror's placement; instance declarations
/// claimed by an object or variable type land inside its system-unit entry,
/// everything else builds up from the unclaimed roots.
pub(crate) fn build(
    document: &mut CaexDocument,
    space: &AddressSpace,
    encoder: &ValueEncoder<'_>,
    placed_types: BTreeMap<NodeId, Handle>,
    report: &mut ConversionReport,
) -> BuiltTree {
    let claims = Claims::resolve(space);
    let mut tree = BuiltTree {
        placed: placed_types,
        tree_edges: Vec::new(),
        consumed: claims.consumed.clone(),
    };
    let walker = Walker {
        space,
        encoder,
        claims,
    };

    // 1. Instance declarations under types.
    for node in space.visit_order() {
        if !node.node_class.is_type() {
            continue;
        }
        let Some(&container) = tree.placed.get(&node.node_id) else {
            continue;
        };
        if document.object(container).kind != CaexKind::SystemUnitClass {
            // Interface-class and attribute-type entries own no elements;
            // their claimed children are already covered by the entry's
            // definitional payload.
            if walker.claims.owns_children(&node.node_id) {
                debug!(
                    "Dropping instance declarations under {}; its library entry holds no elements",
                    node.node_id
                );
            }
            continue;
        }
        walker.subtree(document, node, container, &mut tree, report);
    }

    // 2. Unclaimed instance roots and orphans.
    for node in space.visit_order() {
        if node.node_class.is_type() || walker.claims.parent_of.contains_key(&node.node_id) {
            continue;
        }
        if walker.claims.owns_children(&node.node_id) || node.node_id.is_base(ID_ROOT_FOLDER) {
            let hierarchy = document.add_root(CaexKind::InstanceHierarchy, node.label());
            let handle = walker.element(document, node, hierarchy, report);
            tree.placed.insert(node.node_id.clone(), handle);
            walker.subtree(document, node, handle, &mut tree, report);
        } else {
            debug!("Orphan node {} has no parent and no children", node.node_id);
            report.push(Issue::OrphanNode {
                node: node.node_id.to_string(),
            });
        }
    }

    // Claim loops disconnected from any root stay unreachable.
    for node in space.visit_order() {
        if node.node_class.is_instance()
            && !tree.placed.contains_key(&node.node_id)
            && walker.claims.parent_of.contains_key(&node.node_id)
        {
            debug!("Node {} is claimed but unreachable from any root", node.node_id);
        }
    }

    tree
}

/// The recursive element writer; bundles the read-only state of one build.
struct Walker<'a, 'e> {
    space: &'a AddressSpace,
    encoder: &'e ValueEncoder<'a>,
    claims: Claims,
}

impl Walker<'_, '_> {
    fn subtree(
        &self,
        document: &mut CaexDocument,
        parent_node: &UaNode,
        parent_handle: Handle,
        tree: &mut BuiltTree,
        report: &mut ConversionReport,
    ) {
        let Some(children) = self.claims.children_of.get(&parent_node.node_id) else {
            return;
        };
        for (child_id, reference_type) in children {
            let Some(child) = self.space.node(child_id) else {
                continue;
            };
            let handle = self.element(document, child, parent_handle, report);
            tree.placed.insert(child_id.clone(), handle);
            tree.tree_edges.push(TreeEdge {
                source: parent_node.node_id.clone(),
                target: child_id.clone(),
                reference_type: reference_type.clone(),
            });
            self.subtree(document, child, handle, tree, report);
        }
    }

    /// One instance node as an internal element: codec id, attribute prelude,
    /// and the class paths derived from its type definition.
    fn element(
        &self,
        document: &mut CaexDocument,
        node: &UaNode,
        parent: Handle,
        report: &mut ConversionReport,
    ) -> Handle {
        let handle = document.add_child(parent, CaexKind::InternalElement, node.label());
        let uri = self
            .space
            .namespace_uri(node.node_id.namespace)
            .unwrap_or_default();
        document.set_id(handle, ident::encode(uri, &node.node_id));
        document.object_mut(handle).attributes =
            self.encoder.node_attributes(node, PayloadRole::Instance, report);

        if let Some(type_id) = node.type_definition() {
            match self.space.node(type_id).map(|n| n.node_class) {
                Some(NodeClass::ObjectType) => {
                    document.object_mut(handle).ref_base_system_unit_path =
                        typelib::system_unit_path(self.space, type_id);
                    document.object_mut(handle).role_requirement =
                        typelib::role_class_path(self.space, type_id);
                }
                Some(NodeClass::VariableType) => {
                    document.object_mut(handle).ref_base_system_unit_path =
                        typelib::system_unit_path(self.space, type_id);
                }
                _ => debug!(
                    "Type definition {} of {} is not in the working set",
                    type_id, node.node_id
                ),
            }
        }
        handle
    }
}
