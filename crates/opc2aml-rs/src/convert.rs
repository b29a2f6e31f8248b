// crates/opc2aml-rs/src/convert.rs

//! The conversion pipeline: one working set in, one CAEX document out.
//!
//! The phases run in a fixed order. Type nodes mirror into class libraries
//! first, the instance tree materializes against those entries, remaining
//! references externalize as interfaces and links, and an integrity pass
//! checks the finished document. Only duplicate output identifiers abort;
//! everything else degrades and lands in the report.

use chrono::{SecondsFormat, Utc};
use log::info;
use uuid::Uuid;

use opc2aml_rs_caex::{CaexDocument, SourceDocumentInfo};
use opc2aml_rs_nodeset::AddressSpace;

use crate::encode::ValueEncoder;
use crate::error::ConvertError;
use crate::report::{ConversionReport, Issue, IssueKind};
use crate::{guard, hierarchy, links, typelib};

/// Conversion switches.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// The file name recorded in the document header.
    pub file_name: String,
    /// Keeps the historical datatype renditions: unsigned-byte durations,
    /// untyped dimension lists and untyped degraded payloads.
    pub legacy_datatype_quirks: bool,
}

impl ConvertOptions {
    pub fn new(file_name: impl Into<String>) -> Self {
        ConvertOptions {
            file_name: file_name.into(),
            legacy_datatype_quirks: true,
        }
    }
}

impl Default for ConvertOptions {
    fn default() -> Self {
        ConvertOptions::new("nodeset.aml")
    }
}

/// A finished conversion: the document plus everything worth knowing about
/// how it went.
#[derive(Debug)]
pub struct Conversion {
    pub document: CaexDocument,
    pub report: ConversionReport,
}

/// Converts a finalized working set into a CAEX document.
pub fn convert(space: &AddressSpace, options: &ConvertOptions) -> Result<Conversion, ConvertError> {
    let mut document = CaexDocument::new(options.file_name.as_str());
    document.set_source_info(SourceDocumentInfo {
        origin_name: env!("CARGO_PKG_NAME").to_string(),
        origin_id: Uuid::new_v4().to_string(),
        origin_version: env!("CARGO_PKG_VERSION").to_string(),
        last_writing_date_time: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
    });

    let mut report = ConversionReport::new();
    for skipped in space.skipped_nodes() {
        report.push(Issue::MalformedIdentifier {
            raw_id: skipped.raw_id.clone(),
            reason: skipped.reason.clone(),
        });
    }

    let encoder = ValueEncoder::new(space, options.legacy_datatype_quirks);
    let placed_types = typelib::mirror_space(&mut document, space, &encoder, &mut report);
    let tree = hierarchy::build(&mut document, space, &encoder, placed_types, &mut report);
    links::externalize(&mut document, space, &tree, &mut report);
    guard::run(&document, &mut report);

    let duplicates = report.count_of(IssueKind::DuplicateIdentifier);
    if duplicates > 0 {
        return Err(ConvertError::DuplicateIdentifiers { count: duplicates });
    }

    info!(
        "Converted {} nodes into {} objects with {} issues",
        space.len(),
        document.len(),
        report.len()
    );
    Ok(Conversion { document, report })
}
