//! XML parsing errors.

use toprank_model::TopRankError;

/// Errors that can occur while parsing an upstream XML response.
#[derive(Debug, thiserror::Error)]
pub enum XmlError {
    /// An error from the underlying quick-xml library.
    #[error("XML processing error: {0}")]
    QuickXml(#[from] quick_xml::Error),

    /// A required XML element was missing.
    #[error("missing required XML element: {0}")]
    MissingElement(String),

    /// An unexpected XML element or end of input was encountered.
    #[error("unexpected XML element: {0}")]
    UnexpectedElement(String),

    /// An error parsing a value from XML text content.
    #[error("failed to parse value: {0}")]
    ParseError(String),
}

impl From<XmlError> for TopRankError {
    fn from(err: XmlError) -> Self {
        TopRankError::parse(format!("malformed upstream response: {err}")).with_source(err)
    }
}
