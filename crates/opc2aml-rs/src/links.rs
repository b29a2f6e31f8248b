// crates/opc2aml-rs/src/links.rs

//! The reference externalizer: edges the tree could not absorb become
//! external interfaces and internal links.
//!
//! Tree edges are mirrored too, one link per realized parent/child pair, so
//! a node's element count and its containment-link count stay equal. The
//! rest is grouped by source and reference type: single targets get an
//! interface pair and a link at the nearest common owning ancestor, fan-outs
//! collapse to one interface carrying the indexed target paths.

use crate::hierarchy::BuiltTree;
use crate::ident;
use crate::report::{ConversionReport, Issue};
use crate::typelib;
use log::debug;
use opc2aml_rs_caex::{Attribute, CaexDocument, Handle, PayloadRole};
use opc2aml_rs_nodeset::{AddressSpace, ID_HAS_SUBTYPE, ID_HAS_TYPE_DEFINITION, NodeId};

pub(crate) fn externalize(
    document: &mut CaexDocument,
    space: &AddressSpace,
    tree: &BuiltTree,
    report: &mut ConversionReport,
) {
    // 1. Containment the tree realized: the interface pair plus exactly one
    //    link at the parent.
    for edge in &tree.tree_edges {
        let (Some(&source), Some(&target)) = (
            tree.placed.get(&edge.source),
            tree.placed.get(&edge.target),
        ) else {
            continue;
        };
        link_pair(
            document,
            space,
            &edge.reference_type,
            (&edge.source, source),
            (&edge.target, target),
            source,
        );
    }

    // 2. Everything else, except subtype edges (derivation paths) and type
    //    definitions (system-unit paths).
    for node in space.visit_order() {
        for reference in &node.references {
            // An inverse entry whose source never entered the working set;
            // subtype and type-definition edges are consumed as paths and do
            // not count.
            if !reference.is_forward
                && !reference.reference_type.is_base(ID_HAS_SUBTYPE)
                && !reference.reference_type.is_base(ID_HAS_TYPE_DEFINITION)
                && space.node(&reference.target).is_none()
            {
                report.push(Issue::UnresolvedReference {
                    source: reference.target.to_string(),
                    reference_type: type_label(space, &reference.reference_type),
                    target: node.node_id.to_string(),
                });
            }
        }

        let Some(&source_handle) = tree.placed.get(&node.node_id) else {
            continue;
        };

        let mut groups: Vec<(&NodeId, Vec<&NodeId>)> = Vec::new();
        for reference in &node.references {
            if !reference.is_forward {
                continue;
            }
            let reference_type = &reference.reference_type;
            if reference_type.is_base(ID_HAS_SUBTYPE)
                || reference_type.is_base(ID_HAS_TYPE_DEFINITION)
            {
                continue;
            }
            let key = (
                node.node_id.clone(),
                reference_type.clone(),
                reference.target.clone(),
            );
            if tree.consumed.contains(&key) {
                continue;
            }
            match groups.iter_mut().find(|(t, _)| *t == reference_type) {
                Some((_, targets)) => targets.push(&reference.target),
                None => groups.push((reference_type, vec![&reference.target])),
            }
        }

        for (reference_type, targets) in groups {
            if let [target_id] = targets.as_slice() {
                let Some(&target_handle) = tree.placed.get(target_id) else {
                    report.push(Issue::UnresolvedReference {
                        source: node.node_id.to_string(),
                        reference_type: type_label(space, reference_type),
                        target: target_id.to_string(),
                    });
                    continue;
                };
                let anchor = document
                    .common_ancestor(source_handle, target_handle)
                    .filter(|&h| document.object(h).kind.can_anchor_links())
                    .unwrap_or(source_handle);
                link_pair(
                    document,
                    space,
                    reference_type,
                    (&node.node_id, source_handle),
                    (target_id, target_handle),
                    anchor,
                );
            } else {
                fan_out(
                    document,
                    space,
                    tree,
                    reference_type,
                    (&node.node_id, source_handle),
                    &targets,
                    report,
                );
            }
        }
    }
}

/// One edge as a pair of external interfaces and one internal link.
///
/// Without a registered inverse name the target side stays bare and the link
/// points at the target object's own id.
fn link_pair(
    document: &mut CaexDocument,
    space: &AddressSpace,
    reference_type: &NodeId,
    source: (&NodeId, Handle),
    target: (&NodeId, Handle),
    anchor: Handle,
) {
    let forward = type_label(space, reference_type);
    let class_path = typelib::interface_class_path(space, reference_type);
    let side_a = interface_id(space, &forward, source.0);
    document.find_or_add_interface(source.1, &forward, &side_a, class_path.as_deref());

    let side_b = match space.reference_inverse_name(reference_type) {
        Some(inverse) => {
            let id = interface_id(space, &inverse, target.0);
            document.find_or_add_interface(target.1, &inverse, &id, class_path.as_deref());
            id
        }
        None => {
            debug!("Reference type {} has no inverse name; target side stays bare", forward);
            document
                .object(target.1)
                .id
                .clone()
                .unwrap_or_else(|| target.0.to_string())
        }
    };
    document.add_link(anchor, &forward, &side_a, &side_b);
}

/// Fan-out under one semantic role: one interface on the source carrying the
/// indexed target paths, no per-target links.
fn fan_out(
    document: &mut CaexDocument,
    space: &AddressSpace,
    tree: &BuiltTree,
    reference_type: &NodeId,
    source: (&NodeId, Handle),
    targets: &[&NodeId],
    report: &mut ConversionReport,
) {
    let forward = type_label(space, reference_type);
    let class_path = typelib::interface_class_path(space, reference_type);
    let id = interface_id(space, &forward, source.0);
    let interface = document.find_or_add_interface(source.1, &forward, &id, class_path.as_deref());

    let role = payload_role_at(document, interface);
    let mut paths = Attribute::new(role, "TargetPaths");
    for target_id in targets {
        let Some(&handle) = tree.placed.get(*target_id) else {
            report.push(Issue::UnresolvedReference {
                source: source.0.to_string(),
                reference_type: forward.clone(),
                target: target_id.to_string(),
            });
            continue;
        };
        let index = paths.children.len().to_string();
        paths
            .children
            .push(Attribute::scalar(role, index, "xs:string", object_path(document, handle)));
    }
    document.object_mut(interface).attributes.push(paths);
}

/// `<InterfaceName>_` + the codec id of the owning node.
fn interface_id(space: &AddressSpace, interface_name: &str, owner: &NodeId) -> String {
    let uri = space.namespace_uri(owner.namespace).unwrap_or_default();
    format!("{}_{}", interface_name, ident::encode(uri, owner))
}

fn type_label(space: &AddressSpace, reference_type: &NodeId) -> String {
    space
        .reference_type_name(reference_type)
        .unwrap_or_else(|| reference_type.to_string())
}

/// The name path of an object from its root, the form CAEX references use.
fn object_path(document: &CaexDocument, handle: Handle) -> String {
    let mut names: Vec<&str> = document
        .ancestors(handle)
        .iter()
        .map(|&h| document.object(h).name.as_str())
        .collect();
    names.reverse();
    names.join("/")
}

/// Attributes under a library subtree mirror definitions; everything else is
/// instance payload.
fn payload_role_at(document: &CaexDocument, handle: Handle) -> PayloadRole {
    let definitional = document
        .ancestors(handle)
        .iter()
        .any(|&h| document.object(h).kind.is_library());
    if definitional {
        PayloadRole::Definition
    } else {
        PayloadRole::Instance
    }
}
