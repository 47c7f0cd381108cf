//! AWS Signature Version 4 request signing for Toprank.
//!
//! Every call Toprank makes to the upstream ranked-sites API is authenticated
//! with SigV4. This crate implements the signing side: it canonicalizes the
//! query string and headers, derives the date-scoped signing key, and builds
//! the `Authorization` header.
//!
//! # Usage
//!
//! ```rust
//! use toprank_auth::{Credentials, SignableRequest, SigningContext, sign};
//!
//! let creds = Credentials::new("AKIDEXAMPLE", "secret").unwrap();
//! let ctx = SigningContext::now(&creds, "us-west-1", "AlexaTopSites").unwrap();
//! let headers = [("host", "ats.us-west-1.amazonaws.com"), ("x-amz-date", ctx.amz_date())];
//! let query = [("Action", "TopSites"), ("Start", "1")];
//!
//! let signed = sign(
//!     &SignableRequest { method: "GET", path: "/api", query: &query, headers: &headers },
//!     &ctx,
//! )
//! .unwrap();
//! assert_eq!(signed.canonical_query, "Action=TopSites&Start=1");
//! ```
//!
//! # Modules
//!
//! - [`canonical`] - Canonical query string and header rendering
//! - [`credentials`] - Access key / secret key pair
//! - [`error`] - Signing error types
//! - [`sigv4`] - Signing context, key derivation and request signing

pub mod canonical;
pub mod credentials;
pub mod error;
pub mod sigv4;

pub use canonical::{HeaderFormat, canonical_headers, canonical_query};
pub use credentials::Credentials;
pub use error::AuthError;
pub use sigv4::{SignableRequest, SignedRequest, SigningContext, hash_payload, sign};
