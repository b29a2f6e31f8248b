// crates/opc2aml-rs/src/insert.rs

//! The insert engine: merges the type libraries of requested namespaces into
//! an existing document.
//!
//! All reads happen before the first write. Every requested URI must resolve
//! to a working set, and every model prerequisite must already be in the
//! target (probed by library name) or in the requested batch; a failed check
//! aborts with the target untouched. Namespaces the target already carries
//! are skipped, so re-inserting is a no-op.

use std::collections::BTreeMap;

use log::{debug, info};

use opc2aml_rs_caex::{CaexDocument, CaexKind};
use opc2aml_rs_nodeset::AddressSpace;

use crate::convert::ConvertOptions;
use crate::encode::ValueEncoder;
use crate::error::ConvertError;
use crate::report::ConversionReport;
use crate::typelib;

/// Supplies the working set that defines a namespace URI.
pub trait NamespaceResolver {
    fn resolve(&self, namespace_uri: &str) -> Option<&AddressSpace>;
}

impl NamespaceResolver for BTreeMap<String, AddressSpace> {
    fn resolve(&self, namespace_uri: &str) -> Option<&AddressSpace> {
        self.get(namespace_uri)
    }
}

/// Inserts the type libraries of `requested` namespaces into `document`.
///
/// Instance hierarchies are never touched; only class libraries and their
/// entries are added. Returns the report of the mirroring pass.
pub fn insert_namespaces(
    document: &mut CaexDocument,
    requested: &[&str],
    resolver: &dyn NamespaceResolver,
    options: &ConvertOptions,
) -> Result<ConversionReport, ConvertError> {
    // --- Read Phase ---
    let mut sources = Vec::new();
    for &uri in requested {
        let Some(space) = resolver.resolve(uri) else {
            return Err(ConvertError::UnresolvedNamespace {
                namespace: uri.to_string(),
            });
        };
        let Some(namespace) = space.namespace_index(uri) else {
            return Err(ConvertError::UnresolvedNamespace {
                namespace: uri.to_string(),
            });
        };
        sources.push((uri, space, namespace));
    }
    for (uri, space, _) in &sources {
        for model in space.models().iter().filter(|m| m.model_uri == *uri) {
            for prerequisite in &model.required_models {
                let satisfied = is_present(document, prerequisite)
                    || requested.contains(&prerequisite.as_str());
                if !satisfied {
                    return Err(ConvertError::MissingPrerequisiteNamespace {
                        namespace: uri.to_string(),
                        prerequisite: prerequisite.clone(),
                    });
                }
            }
        }
    }

    // --- Write Phase ---
    let mut report = ConversionReport::new();
    for (uri, space, namespace) in sources {
        if is_present(document, uri) {
            debug!("Namespace {} is already present; skipping", uri);
            continue;
        }
        let encoder = ValueEncoder::new(space, options.legacy_datatype_quirks);
        typelib::mirror_namespace(document, space, &encoder, namespace, &mut report);
        info!("Inserted the type libraries of {}", uri);
    }
    Ok(report)
}

/// True when the target already carries any class library of the namespace.
fn is_present(document: &CaexDocument, namespace_uri: &str) -> bool {
    [
        (CaexKind::InterfaceClassLib, typelib::INTERFACE_LIB),
        (CaexKind::RoleClassLib, typelib::ROLE_LIB),
        (CaexKind::SystemUnitClassLib, typelib::SYSTEM_UNIT_LIB),
        (CaexKind::AttributeTypeLib, typelib::ATTRIBUTE_LIB),
    ]
    .iter()
    .any(|(kind, prefix)| {
        document
            .find_library(*kind, &format!("{}{}", prefix, namespace_uri))
            .is_some()
    })
}
