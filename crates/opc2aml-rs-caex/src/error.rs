// crates/opc2aml-rs-caex/src/error.rs

use quick_xml::errors::serialize::DeError;
use quick_xml::errors::serialize::SeError;
use std::fmt;

/// Errors that can occur while reading or writing a CAEX document.
#[derive(Debug)]
pub enum CaexError {
    /// An error from the underlying `quick-xml` deserializer.
    XmlParsing(DeError),

    /// An error from the underlying `quick-xml` serializer.
    XmlSerializing(SeError),

    /// An error occurred during string formatting (e.g., in helpers).
    FmtError(fmt::Error),

    /// A required XML element was missing (e.g., CAEXFile).
    MissingElement { element: &'static str },

    /// The document declares a schema version this library does not handle.
    UnsupportedSchemaVersion(String),
}

impl From<DeError> for CaexError {
    fn from(e: DeError) -> Self {
        CaexError::XmlParsing(e)
    }
}

impl From<SeError> for CaexError {
    fn from(e: SeError) -> Self {
        CaexError::XmlSerializing(e)
    }
}

impl From<fmt::Error> for CaexError {
    fn from(e: fmt::Error) -> Self {
        CaexError::FmtError(e)
    }
}

impl fmt::Display for CaexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaexError::XmlParsing(e) => write!(f, "XML parsing error: {}", e),
            CaexError::XmlSerializing(e) => write!(f, "XML serializing error: {}", e),
            CaexError::FmtError(e) => write!(f, "Formatting error: {}", e),
            CaexError::MissingElement { element } => {
                write!(f, "Missing required XML element: {}", element)
            }
            CaexError::UnsupportedSchemaVersion(v) => {
                write!(f, "Unsupported CAEX schema version: {}", v)
            }
        }
    }
}

impl std::error::Error for CaexError {}

#[cfg(test)]
mod tests {
    use super::CaexError;

    #[test]
    fn test_from_de_error() {
        // Create a dummy DeError by failing to parse
        let xml_err = quick_xml::de::from_str::<()>("<invalid xml").unwrap_err();
        let caex_err: CaexError = xml_err.into();
        assert!(matches!(caex_err, CaexError::XmlParsing(_)));
    }

    #[test]
    fn test_from_se_error() {
        // Create a dummy SeError
        let xml_err = quick_xml::errors::serialize::SeError::Custom("test error".to_string());
        let caex_err: CaexError = xml_err.into();
        assert!(matches!(caex_err, CaexError::XmlSerializing(_)));
    }

    #[test]
    fn test_from_fmt_error() {
        let fmt_err = std::fmt::Error;
        let caex_err: CaexError = fmt_err.into();
        assert!(matches!(caex_err, CaexError::FmtError(_)));
    }

    #[test]
    fn test_display_messages() {
        let err = CaexError::MissingElement { element: "CAEXFile" };
        assert_eq!(err.to_string(), "Missing required XML element: CAEXFile");
        let err = CaexError::UnsupportedSchemaVersion("2.15".into());
        assert_eq!(err.to_string(), "Unsupported CAEX schema version: 2.15");
    }
}
