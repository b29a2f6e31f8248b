// crates/opc2aml-rs/src/ident.rs

//! The output identifier codec.
//!
//! Every materialized object gets an id built from its absolute namespace URI
//! and node identifier, so ids never depend on a file-local namespace index
//! and stay stable across merges. The expanded form `nsu=<uri>;<kind>=<value>`
//! is percent-encoded in one piece; an optional raw kind prefix separates the
//! identifier spaces of the different object kinds (an ObjectType becomes both
//! a system-unit class and a role class, which must not collide).

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use opc2aml_rs_nodeset::{Identifier, NodeId};

/// System-unit-class entries.
pub const PREFIX_SYSTEM_UNIT_CLASS: &str = "SUC_";
/// Role-class entries.
pub const PREFIX_ROLE_CLASS: &str = "RC_";
/// Interface-class entries.
pub const PREFIX_INTERFACE_CLASS: &str = "IC_";
/// Attribute-type entries.
pub const PREFIX_ATTRIBUTE_TYPE: &str = "AT_";

/// Encodes `(namespace URI, node id)` into the output identifier.
///
/// `nsu=http://opcfoundation.org/UA/FX/AC/;i=35` percent-encodes to
/// `nsu%3Dhttp%3A%2F%2Fopcfoundation.org%2FUA%2FFX%2FAC%2F%3Bi%3D35`.
pub fn encode(namespace_uri: &str, node_id: &NodeId) -> String {
    let expanded = format!("nsu={};{}", namespace_uri, literal(node_id));
    urlencoding::encode(&expanded).into_owned()
}

/// Like [`encode`], with a raw kind prefix prepended outside the encoded part.
pub fn encode_with_prefix(prefix: &str, namespace_uri: &str, node_id: &NodeId) -> String {
    let mut id = String::with_capacity(prefix.len() + 48);
    id.push_str(prefix);
    id.push_str(&encode(namespace_uri, node_id));
    id
}

/// The kind-lettered identifier literal, namespace index excluded.
fn literal(node_id: &NodeId) -> String {
    match &node_id.identifier {
        Identifier::Numeric(v) => format!("i={}", v),
        Identifier::String(v) => format!("s={}", v),
        // uuid's Display is the canonical hyphenated lowercase form.
        Identifier::Guid(v) => format!("g={}", v),
        Identifier::Opaque(v) => format!("b={}", BASE64.encode(v)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_encode_matches_wire_format() {
        let id = encode(
            "http://opcfoundation.org/UA/FX/AC/",
            &NodeId::numeric(3, 35),
        );
        assert_eq!(
            id,
            "nsu%3Dhttp%3A%2F%2Fopcfoundation.org%2FUA%2FFX%2FAC%2F%3Bi%3D35",
            "The namespace index must not leak into the encoded id"
        );
    }

    #[test]
    fn test_encode_all_four_kinds() {
        let uri = "http://example.com/UA/";
        assert!(encode(uri, &NodeId::numeric(1, 12345)).ends_with("%3Bi%3D12345"));
        assert!(encode(uri, &NodeId::string(1, "Pump A")).ends_with("%3Bs%3DPump%20A"));

        let guid = NodeId {
            namespace: 1,
            identifier: Identifier::Guid(
                "72962B91-FA75-4AE6-8D28-B404DC7DAF63".parse::<Uuid>().unwrap(),
            ),
        };
        assert!(
            encode(uri, &guid).ends_with("%3Bg%3D72962b91-fa75-4ae6-8d28-b404dc7daf63"),
            "Guid literals are hyphenated lowercase"
        );

        let opaque = NodeId {
            namespace: 1,
            identifier: Identifier::Opaque(vec![0xCA, 0xFE]),
        };
        assert!(encode(uri, &opaque).contains("%3Bb%3D"));
    }

    #[test]
    fn test_prefix_stays_raw() {
        let id = encode_with_prefix(
            PREFIX_SYSTEM_UNIT_CLASS,
            "http://example.com/UA/",
            &NodeId::numeric(1, 7),
        );
        assert!(id.starts_with("SUC_nsu%3D"), "The kind prefix is not percent-encoded");
    }

    #[test]
    fn test_distinct_kinds_never_collide() {
        let uri = "http://example.com/UA/";
        let node = NodeId::numeric(1, 7);
        let suc = encode_with_prefix(PREFIX_SYSTEM_UNIT_CLASS, uri, &node);
        let rc = encode_with_prefix(PREFIX_ROLE_CLASS, uri, &node);
        let plain = encode(uri, &node);
        assert_ne!(suc, rc);
        assert_ne!(suc, plain);
        assert_ne!(rc, plain);
    }
}
