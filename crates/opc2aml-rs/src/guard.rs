// crates/opc2aml-rs/src/guard.rs

//! The integrity gate: one depth-first pass over the finished document.
//!
//! Counts every output identifier, objects and interfaces alike, and reports
//! each one seen more than once. Identifiers that collapsed to bare GUID
//! syntax are flagged as codec escapes, and identity attributes must not mix
//! payload roles within their subtree.

use crate::report::{ConversionReport, Issue};
use opc2aml_rs_caex::{Attribute, CaexDocument, PayloadRole};
use std::collections::BTreeMap;

pub(crate) fn run(document: &CaexDocument, report: &mut ConversionReport) {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for handle in document.walk() {
        let object = document.object(handle);
        if let Some(id) = object.id.as_deref() {
            *counts.entry(id).or_insert(0) += 1;
        }
        if let Some(identity) = object.attributes.iter().find(|a| a.name == "NodeId") {
            if mixes_roles(identity) {
                report.push(Issue::MixedPayloadRole {
                    id: object.id.clone().unwrap_or_else(|| object.name.clone()),
                    detail: "identity attribute mixes definition and instance payloads"
                        .to_string(),
                });
            }
        }
    }

    for (id, count) in &counts {
        if *count > 1 {
            report.push(Issue::DuplicateIdentifier {
                id: (*id).to_string(),
                count: *count,
            });
        }
        if is_bare_guid(id) {
            report.push(Issue::RawGuidIdentifier {
                id: (*id).to_string(),
            });
        }
    }
}

/// Bare 8-4-4-4-12 hex syntax. Codec products are percent-encoded and carry
/// a key prefix, so they never match.
fn is_bare_guid(id: &str) -> bool {
    let parts: Vec<&str> = id.split('-').collect();
    parts.len() == 5
        && [8usize, 4, 4, 4, 12]
            .iter()
            .zip(&parts)
            .all(|(len, part)| part.len() == *len && part.chars().all(|c| c.is_ascii_hexdigit()))
}

fn mixes_roles(attribute: &Attribute) -> bool {
    fn differs(attribute: &Attribute, role: PayloadRole) -> bool {
        attribute
            .children
            .iter()
            .any(|child| child.role != role || differs(child, role))
    }
    differs(attribute, attribute.role)
}
