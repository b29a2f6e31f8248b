// crates/opc2aml-rs/src/error.rs

use opc2aml_rs_caex::CaexError;
use std::fmt;

/// Errors that sink a whole conversion or merge operation.
///
/// Recoverable defects never surface here; they land in the
/// [`ConversionReport`](crate::ConversionReport) instead.
#[derive(Debug)]
pub enum ConvertError {
    /// An error from the CAEX document reader or writer.
    Caex(CaexError),

    /// The integrity guard found identifiers occurring more than once; the
    /// report carries one entry per offending id.
    DuplicateIdentifiers { count: usize },

    /// A requested namespace URI that the resolver cannot supply.
    UnresolvedNamespace { namespace: String },

    /// An insert prerequisite satisfied neither by the target document nor by
    /// the requested set. Nothing was written.
    MissingPrerequisiteNamespace {
        namespace: String,
        prerequisite: String,
    },
}

impl From<CaexError> for ConvertError {
    fn from(e: CaexError) -> Self {
        ConvertError::Caex(e)
    }
}

impl fmt::Display for ConvertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConvertError::Caex(e) => write!(f, "CAEX document error: {}", e),
            ConvertError::DuplicateIdentifiers { count } => {
                write!(f, "{} duplicate output identifier(s) in the finished document", count)
            }
            ConvertError::UnresolvedNamespace { namespace } => {
                write!(f, "No source available for namespace {}", namespace)
            }
            ConvertError::MissingPrerequisiteNamespace {
                namespace,
                prerequisite,
            } => write!(
                f,
                "Namespace {} requires {} which is neither present nor requested",
                namespace, prerequisite
            ),
        }
    }
}

impl std::error::Error for ConvertError {}
