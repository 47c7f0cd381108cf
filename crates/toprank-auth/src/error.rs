//! Error types for SigV4 request signing.
//!
//! Signing has two failure families: configuration problems that are detected
//! before any request is built, and signing invariant violations that abort a
//! single request. Both are represented by [`AuthError`].

/// Errors that can occur while building a signing context or signing a request.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// A credential value is missing or empty.
    #[error("missing credential: {0}")]
    MissingCredential(&'static str),

    /// The signing region or service name is empty.
    #[error("invalid signing scope: {0}")]
    InvalidScope(&'static str),

    /// A header name or value cannot be represented in a canonical request.
    #[error("invalid header for signing: {0}")]
    InvalidHeader(String),

    /// A query parameter cannot be represented in a canonical query string.
    #[error("invalid query parameter for signing: {0}")]
    InvalidQueryParam(String),

    /// The HTTP method is empty or not an uppercase token.
    #[error("invalid HTTP method: {0}")]
    InvalidMethod(String),
}

impl AuthError {
    /// Whether this error stems from configuration rather than request content.
    ///
    /// Configuration errors are fatal for the process; signing errors only fail
    /// the request being signed.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::MissingCredential(_) | Self::InvalidScope(_))
    }
}
