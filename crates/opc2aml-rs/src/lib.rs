// crates/opc2aml-rs/src/lib.rs

#![doc = "OPC UA `NodeSet2` to AutomationML/CAEX transcoding engine.

This crate turns a finalized OPC UA address space into a CAEX 3.0 document:
type nodes mirror into the four class-library sections, instance nodes
materialize as an `InternalElement` tree under first-writer-wins hierarchy
claiming, the remaining references externalize as interface pairs and
internal links, and every node identity survives as a reversible,
percent-encoded CAEX identifier.

The input model lives in `opc2aml-rs-nodeset` and the output model in
`opc2aml-rs-caex`; both re-export here so one dependency is enough for the
common load, convert and save path. Conversion never panics on bad input:
malformed or unresolvable material degrades into [`ConversionReport`]
entries, and only duplicate output identifiers abort."]

// --- Crate Modules ---
mod convert;
mod encode;
mod error;
mod guard;
mod hierarchy;
mod insert;
mod links;
mod report;
mod typelib;

pub mod ident;

// --- Public API Re-exports ---
pub use error::ConvertError;

pub use convert::{convert, Conversion, ConvertOptions};
pub use insert::{insert_namespaces, NamespaceResolver};
pub use report::{ConversionReport, Issue, IssueKind, Severity};

pub use opc2aml_rs_caex::{load_caex_from_str, save_caex_to_string, CaexDocument};
pub use opc2aml_rs_nodeset::{load_nodeset_from_str, AddressSpace};
