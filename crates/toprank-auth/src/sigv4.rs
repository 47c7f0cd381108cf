//! AWS Signature Version 4 request signing.
//!
//! This module implements the client side of SigV4:
//!
//! 1. Build the canonical request from method, path, sorted query and headers.
//! 2. Build the credential scope `date/region/service/aws4_request`.
//! 3. Build the string to sign from the timestamp, scope and canonical request hash.
//! 4. Derive the signing key with a four-round HMAC-SHA256 chain.
//! 5. Sign the string to sign and assemble the `Authorization` header.
//!
//! The main entry point is [`sign`].

use chrono::{DateTime, Utc};
use hmac::{Hmac, KeyInit, Mac};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::canonical::{HeaderFormat, build_canonical_request, canonical_headers, canonical_query};
use crate::credentials::Credentials;
use crate::error::AuthError;

/// The only algorithm supported by this implementation.
pub const ALGORITHM: &str = "AWS4-HMAC-SHA256";

/// Terminator of every credential scope.
const SCOPE_TERMINATOR: &str = "aws4_request";

/// SHA-256 of the empty payload, used for bodyless GET requests.
pub const EMPTY_PAYLOAD_SHA256: &str =
    "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

type HmacSha256 = Hmac<Sha256>;

/// Per-request signing inputs.
///
/// A context is immutable and must be created fresh for every signed call so
/// that `x-amz-date` reflects the time the request is actually sent.
#[derive(Clone, PartialEq, Eq)]
pub struct SigningContext {
    date_stamp: String,
    amz_date: String,
    access_key: String,
    secret_key: String,
    region: String,
    service: String,
}

impl SigningContext {
    /// Create a context for the given instant.
    ///
    /// # Errors
    ///
    /// Returns a configuration error ([`AuthError::InvalidScope`]) if the
    /// region or service is empty.
    pub fn new(
        credentials: &Credentials,
        region: &str,
        service: &str,
        now: DateTime<Utc>,
    ) -> Result<Self, AuthError> {
        if region.trim().is_empty() {
            return Err(AuthError::InvalidScope("region"));
        }
        if service.trim().is_empty() {
            return Err(AuthError::InvalidScope("service"));
        }

        Ok(Self {
            date_stamp: now.format("%Y%m%d").to_string(),
            amz_date: now.format("%Y%m%dT%H%M%SZ").to_string(),
            access_key: credentials.access_key().to_owned(),
            secret_key: credentials.secret_key().to_owned(),
            region: region.to_owned(),
            service: service.to_owned(),
        })
    }

    /// Create a context stamped with the current UTC time.
    pub fn now(credentials: &Credentials, region: &str, service: &str) -> Result<Self, AuthError> {
        Self::new(credentials, region, service, Utc::now())
    }

    /// The `YYYYMMDD` date stamp.
    #[must_use]
    pub fn date_stamp(&self) -> &str {
        &self.date_stamp
    }

    /// The `YYYYMMDD'T'HHMMSS'Z'` timestamp sent as `x-amz-date`.
    #[must_use]
    pub fn amz_date(&self) -> &str {
        &self.amz_date
    }

    /// The access key ID.
    #[must_use]
    pub fn access_key(&self) -> &str {
        &self.access_key
    }

    /// The signing region.
    #[must_use]
    pub fn region(&self) -> &str {
        &self.region
    }

    /// The signing service name.
    #[must_use]
    pub fn service(&self) -> &str {
        &self.service
    }

    /// The credential scope: `date/region/service/aws4_request`.
    #[must_use]
    pub fn credential_scope(&self) -> String {
        format!(
            "{}/{}/{}/{SCOPE_TERMINATOR}",
            self.date_stamp, self.region, self.service
        )
    }

    /// Derive the signing key for this context's date, region and service.
    #[must_use]
    pub fn signing_key(&self) -> Vec<u8> {
        derive_signing_key(
            &self.secret_key,
            &self.date_stamp,
            &self.region,
            &self.service,
        )
    }
}

impl std::fmt::Debug for SigningContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningContext")
            .field("date_stamp", &self.date_stamp)
            .field("amz_date", &self.amz_date)
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .field("region", &self.region)
            .field("service", &self.service)
            .finish()
    }
}

/// The request fields covered by the signature.
#[derive(Debug, Clone, Copy)]
pub struct SignableRequest<'a> {
    /// HTTP method, e.g. `GET`.
    pub method: &'a str,
    /// URI path, e.g. `/api`.
    pub path: &'a str,
    /// Unencoded query parameters, in any order.
    pub query: &'a [(&'a str, &'a str)],
    /// Headers to sign, in any order.
    pub headers: &'a [(&'a str, &'a str)],
}

/// The output of a successful signing pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRequest {
    /// Value for the `Authorization` header.
    pub authorization: String,
    /// The encoded, sorted query string. Use it verbatim in the request URL.
    pub canonical_query: String,
    /// Semicolon-joined signed header names.
    pub signed_headers: String,
    /// The canonical request that was hashed.
    pub canonical_request: String,
    /// The string that was signed.
    pub string_to_sign: String,
    /// Hex-encoded signature.
    pub signature: String,
}

/// Sign a bodyless request.
///
/// Pure: for a fixed context and request the result is identical on every call.
///
/// # Errors
///
/// Returns [`AuthError`] if the method, a header or a query parameter cannot
/// be canonicalized. No partial header is produced.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use toprank_auth::{Credentials, SignableRequest, SigningContext, sign};
///
/// let creds = Credentials::new("AKIDEXAMPLE", "secret").unwrap();
/// let now = Utc.with_ymd_and_hms(2024, 3, 15, 12, 34, 56).unwrap();
/// let ctx = SigningContext::new(&creds, "us-west-1", "AlexaTopSites", now).unwrap();
/// let headers = [("host", "example.com"), ("x-amz-date", ctx.amz_date())];
/// let signed = sign(
///     &SignableRequest { method: "GET", path: "/api", query: &[], headers: &headers },
///     &ctx,
/// )
/// .unwrap();
/// assert!(signed.authorization.starts_with("AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/20240315/"));
/// ```
pub fn sign(
    request: &SignableRequest<'_>,
    ctx: &SigningContext,
) -> Result<SignedRequest, AuthError> {
    validate_method(request.method)?;

    let canonical_query = canonical_query(request.query)?;
    let headers_block = canonical_headers(request.headers, HeaderFormat::Canonical)?;
    let signed_headers = canonical_headers(request.headers, HeaderFormat::SignedNames)?;

    let canonical_request = build_canonical_request(
        request.method,
        request.path,
        &canonical_query,
        &headers_block,
        &signed_headers,
        EMPTY_PAYLOAD_SHA256,
    );

    debug!(canonical_request, "Built canonical request");

    let credential_scope = ctx.credential_scope();
    let string_to_sign = build_string_to_sign(
        ctx.amz_date(),
        &credential_scope,
        &hash_payload(canonical_request.as_bytes()),
    );

    debug!(string_to_sign, "Built string to sign");

    let signature = compute_signature(&ctx.signing_key(), &string_to_sign);
    let authorization = format!(
        "{ALGORITHM} Credential={}/{credential_scope}, SignedHeaders={signed_headers}, Signature={signature}",
        ctx.access_key()
    );

    Ok(SignedRequest {
        authorization,
        canonical_query,
        signed_headers,
        canonical_request,
        string_to_sign,
        signature,
    })
}

/// Build the SigV4 string to sign.
///
/// Format:
/// ```text
/// AWS4-HMAC-SHA256\n
/// <ISO8601 timestamp>\n
/// <credential_scope>\n
/// <hex(SHA256(canonical_request))>
/// ```
#[must_use]
pub fn build_string_to_sign(
    timestamp: &str,
    credential_scope: &str,
    canonical_request_hash: &str,
) -> String {
    format!("{ALGORITHM}\n{timestamp}\n{credential_scope}\n{canonical_request_hash}")
}

/// Derive the SigV4 signing key using HMAC-SHA256 chain.
///
/// ```text
/// DateKey              = HMAC-SHA256("AWS4" + secret_key, date)
/// DateRegionKey        = HMAC-SHA256(DateKey, region)
/// DateRegionServiceKey = HMAC-SHA256(DateRegionKey, service)
/// SigningKey           = HMAC-SHA256(DateRegionServiceKey, "aws4_request")
/// ```
///
/// Every round is keyed with the previous round's raw bytes, never its hex form.
#[must_use]
pub fn derive_signing_key(secret_key: &str, date: &str, region: &str, service: &str) -> Vec<u8> {
    let date_key = hmac_sha256(format!("AWS4{secret_key}").as_bytes(), date.as_bytes());
    let date_region_key = hmac_sha256(&date_key, region.as_bytes());
    let date_region_service_key = hmac_sha256(&date_region_key, service.as_bytes());
    hmac_sha256(&date_region_service_key, SCOPE_TERMINATOR.as_bytes())
}

/// Compute the HMAC-SHA256 signature of `data` using the given `signing_key`.
///
/// Returns the hex-encoded signature.
#[must_use]
pub fn compute_signature(signing_key: &[u8], data: &str) -> String {
    hex::encode(hmac_sha256(signing_key, data.as_bytes()))
}

/// Compute the SHA-256 hash of the given payload and return it as a hex string.
#[must_use]
pub fn hash_payload(payload: &[u8]) -> String {
    hex::encode(Sha256::digest(payload))
}

/// Compute HMAC-SHA256 and return the raw bytes.
pub(crate) fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can accept keys of any length");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

fn validate_method(method: &str) -> Result<(), AuthError> {
    if method.is_empty() || !method.bytes().all(|b| b.is_ascii_uppercase()) {
        return Err(AuthError::InvalidMethod(method.to_owned()));
    }
    Ok(())
}
