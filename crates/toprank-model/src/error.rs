//! Toprank error types.
//!
//! Every failure that crosses a crate boundary is eventually expressed as a
//! [`TopRankError`], which carries a [`TopRankErrorCode`] and the HTTP status
//! the service layer responds with.

use std::fmt;

/// Well-known Toprank error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[non_exhaustive]
pub enum TopRankErrorCode {
    /// Missing or invalid credentials or signing scope.
    ConfigurationError,
    /// A request could not be canonicalized or signed.
    SigningError,
    /// The upstream call failed or returned a non-2xx status.
    UpstreamError,
    /// The upstream response was not well-formed or missed fields.
    ParseError,
    /// Invalid caller input.
    #[default]
    ValidationError,
    /// No route matches the request path.
    NotFound,
    /// The route exists but not for this method.
    MethodNotAllowed,
    /// Internal error.
    InternalError,
}

impl TopRankErrorCode {
    /// Returns the short error code string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConfigurationError => "ConfigurationError",
            Self::SigningError => "SigningError",
            Self::UpstreamError => "UpstreamError",
            Self::ParseError => "ParseError",
            Self::ValidationError => "ValidationError",
            Self::NotFound => "NotFound",
            Self::MethodNotAllowed => "MethodNotAllowed",
            Self::InternalError => "InternalError",
        }
    }

    /// Returns the default HTTP status code for this error.
    #[must_use]
    pub fn default_status_code(&self) -> http::StatusCode {
        match self {
            Self::ConfigurationError | Self::SigningError | Self::InternalError => {
                http::StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::UpstreamError | Self::ParseError => http::StatusCode::BAD_GATEWAY,
            Self::ValidationError => http::StatusCode::BAD_REQUEST,
            Self::NotFound => http::StatusCode::NOT_FOUND,
            Self::MethodNotAllowed => http::StatusCode::METHOD_NOT_ALLOWED,
        }
    }
}

impl fmt::Display for TopRankErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A Toprank error.
#[derive(Debug)]
pub struct TopRankError {
    /// The error code.
    pub code: TopRankErrorCode,
    /// A human-readable error message.
    pub message: String,
    /// The HTTP status code.
    pub status_code: http::StatusCode,
    /// The underlying source error, if any.
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for TopRankError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TopRankError({}): {}", self.code, self.message)
    }
}

impl std::error::Error for TopRankError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl TopRankError {
    /// Create a new `TopRankError` from an error code.
    #[must_use]
    pub fn new(code: TopRankErrorCode) -> Self {
        Self {
            status_code: code.default_status_code(),
            message: code.as_str().to_owned(),
            code,
            source: None,
        }
    }

    /// Create a new `TopRankError` with a custom message.
    #[must_use]
    pub fn with_message(code: TopRankErrorCode, message: impl Into<String>) -> Self {
        Self {
            status_code: code.default_status_code(),
            message: message.into(),
            code,
            source: None,
        }
    }

    /// Set the source error.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Configuration error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::with_message(TopRankErrorCode::ConfigurationError, message)
    }

    /// Signing error.
    #[must_use]
    pub fn signing(message: impl Into<String>) -> Self {
        Self::with_message(TopRankErrorCode::SigningError, message)
    }

    /// Upstream call failure.
    #[must_use]
    pub fn upstream(message: impl Into<String>) -> Self {
        Self::with_message(TopRankErrorCode::UpstreamError, message)
    }

    /// Malformed upstream response.
    #[must_use]
    pub fn parse(message: impl Into<String>) -> Self {
        Self::with_message(TopRankErrorCode::ParseError, message)
    }

    /// Validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::with_message(TopRankErrorCode::ValidationError, message)
    }

    /// No route for the given path.
    #[must_use]
    pub fn not_found(path: &str) -> Self {
        Self::with_message(TopRankErrorCode::NotFound, format!("No route for {path}"))
    }

    /// Unsupported method.
    #[must_use]
    pub fn method_not_allowed(method: &str) -> Self {
        Self::with_message(
            TopRankErrorCode::MethodNotAllowed,
            format!("Method {method} is not allowed"),
        )
    }

    /// Internal error.
    #[must_use]
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::with_message(TopRankErrorCode::InternalError, message)
    }
}

/// Convenience result type for Toprank operations.
pub type TopRankResult<T> = Result<T, TopRankError>;
