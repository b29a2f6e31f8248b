// crates/opc2aml-rs-caex/src/lib.rs

#![doc = "In-memory CAEX 3.0 document model and XML codec.

This crate owns the output side of the transcoder: a handle-based arena of
CAEX objects (instance hierarchies, the four library kinds, internal
elements, external interfaces), attribute trees with an explicit payload
role, document-level internal links, and the `quick-xml`/`serde` reader and
writer for the AutomationML CAEX 3.0 schema.

The arena is deliberately dumb: it stores what it is given and keeps
insertion order everywhere. Placement rules, identifier schemes and
integrity checks live in the conversion engine built on top of it."]

// --- Crate Modules ---
mod attribute;
mod builder;
mod document;
mod error;
mod model;
mod parser;

// --- Public API Re-exports ---
pub use error::CaexError;

pub use attribute::{Attribute, PayloadRole};
pub use document::{
    CaexDocument, CaexKind, CaexObject, Handle, InternalLink, SourceDocumentInfo, Walk,
};

pub use builder::save_caex_to_string;
pub use parser::load_caex_from_str;
