//! Canonical request construction for AWS Signature Version 4.
//!
//! This module implements the canonical request format as specified by AWS:
//!
//! ```text
//! HTTPRequestMethod\n
//! CanonicalURI\n
//! CanonicalQueryString\n
//! CanonicalHeaders\n
//! \n
//! SignedHeaders\n
//! HashedPayload
//! ```
//!
//! Query parameters and headers are always emitted in ascending key order,
//! independent of the order the caller supplied them in. The same encoded
//! query string is used for the signature and for the live request URL.

use std::fmt::Write as _;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

use crate::error::AuthError;

/// The set of characters that must be percent-encoded in query keys and values.
///
/// Per AWS SigV4, everything except unreserved characters
/// (A-Z, a-z, 0-9, `-`, `_`, `.`, `~`) is encoded.
const QUERY_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// How a header set is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderFormat {
    /// `name:value\n` per header (the canonical-headers block).
    Canonical,
    /// Semicolon-joined header names (the signed-headers block).
    SignedNames,
}

/// Build the full canonical request string from its already-canonical parts.
///
/// `canonical_headers` is expected to be newline-terminated, as produced by
/// [`canonical_headers`] with [`HeaderFormat::Canonical`].
///
/// # Examples
///
/// ```
/// use toprank_auth::canonical::build_canonical_request;
///
/// let canonical = build_canonical_request(
///     "GET",
///     "/api",
///     "Action=TopSites",
///     "host:example.com\n",
///     "host",
///     "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855",
/// );
/// assert!(canonical.starts_with("GET\n/api\nAction=TopSites\nhost:example.com\n\nhost\n"));
/// ```
#[must_use]
pub fn build_canonical_request(
    method: &str,
    path: &str,
    canonical_query: &str,
    canonical_headers: &str,
    signed_headers: &str,
    payload_hash: &str,
) -> String {
    format!(
        "{method}\n{path}\n{canonical_query}\n{canonical_headers}\n{signed_headers}\n{payload_hash}"
    )
}

/// Build the canonical query string.
///
/// Keys and values are percent-encoded with the SigV4 unreserved set, then
/// sorted by key (and by value for duplicate keys). Empty values are kept
/// as `Key=`, never dropped.
///
/// # Errors
///
/// Returns [`AuthError::InvalidQueryParam`] if a key is empty.
///
/// # Examples
///
/// ```
/// use toprank_auth::canonical::canonical_query;
///
/// let params = [("Start", "1"), ("CountryCode", ""), ("Action", "TopSites")];
/// let query = canonical_query(&params).unwrap();
/// assert_eq!(query, "Action=TopSites&CountryCode=&Start=1");
/// ```
pub fn canonical_query(params: &[(&str, &str)]) -> Result<String, AuthError> {
    let mut encoded = Vec::with_capacity(params.len());
    for (key, value) in params {
        if key.is_empty() {
            return Err(AuthError::InvalidQueryParam(format!(
                "empty key for value '{value}'"
            )));
        }
        encoded.push((uri_encode(key), uri_encode(value)));
    }

    encoded.sort_unstable();

    Ok(encoded
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&"))
}

/// Render a header set either as the canonical-headers block or as the
/// signed-headers list.
///
/// Header names are lowercased and values are trimmed with inner runs of
/// whitespace collapsed to a single space. Output is sorted by header name.
/// Repeated header names have their values joined with commas.
///
/// # Errors
///
/// Returns [`AuthError::InvalidHeader`] if a header name is empty or contains
/// characters outside the HTTP token set, or if a value contains a line break.
///
/// # Examples
///
/// ```
/// use toprank_auth::canonical::{HeaderFormat, canonical_headers};
///
/// let headers = [("X-Amz-Date", "20240315T123456Z"), ("Host", "example.com")];
/// assert_eq!(
///     canonical_headers(&headers, HeaderFormat::Canonical).unwrap(),
///     "host:example.com\nx-amz-date:20240315T123456Z\n"
/// );
/// assert_eq!(
///     canonical_headers(&headers, HeaderFormat::SignedNames).unwrap(),
///     "host;x-amz-date"
/// );
/// ```
pub fn canonical_headers(
    headers: &[(&str, &str)],
    format: HeaderFormat,
) -> Result<String, AuthError> {
    let normalized = normalize_headers(headers)?;

    let rendered = match format {
        HeaderFormat::Canonical => {
            let mut out = String::new();
            for (name, value) in &normalized {
                let _ = writeln!(out, "{name}:{value}");
            }
            out
        }
        HeaderFormat::SignedNames => normalized
            .iter()
            .map(|(name, _)| name.as_str())
            .collect::<Vec<_>>()
            .join(";"),
    };

    Ok(rendered)
}

/// Percent-encode a query key or value using the SigV4 encoding rules.
#[must_use]
pub fn uri_encode(input: &str) -> String {
    utf8_percent_encode(input, QUERY_ENCODE_SET).to_string()
}

/// Lowercase, trim, validate, merge and sort a header set.
fn normalize_headers(headers: &[(&str, &str)]) -> Result<Vec<(String, String)>, AuthError> {
    let mut merged: Vec<(String, String)> = Vec::with_capacity(headers.len());

    for (name, value) in headers {
        let lower_name = name.trim().to_ascii_lowercase();
        if lower_name.is_empty() || !lower_name.bytes().all(is_token_byte) {
            return Err(AuthError::InvalidHeader(format!("bad header name '{name}'")));
        }
        if value.contains(['\r', '\n']) {
            return Err(AuthError::InvalidHeader(format!(
                "line break in value of '{lower_name}'"
            )));
        }

        let trimmed_value = collapse_whitespace(value.trim());
        match merged.iter_mut().find(|(n, _)| *n == lower_name) {
            Some((_, existing)) => {
                existing.push(',');
                existing.push_str(&trimmed_value);
            }
            None => merged.push((lower_name, trimmed_value)),
        }
    }

    merged.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(merged)
}

/// Whether a byte is allowed in an HTTP header name (RFC 9110 `tchar`).
fn is_token_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
}

/// Collapse consecutive whitespace characters in a string to a single space.
fn collapse_whitespace(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut prev_was_space = false;
    for ch in s.chars() {
        if ch.is_whitespace() {
            if !prev_was_space {
                result.push(' ');
                prev_was_space = true;
            }
        } else {
            result.push(ch);
            prev_was_space = false;
        }
    }
    result
}
