//! Upstream access credentials.
//!
//! [`Credentials`] holds the access key / secret key pair used to sign every
//! upstream call. The secret never appears in `Debug` output.

use std::fmt;

use crate::error::AuthError;

/// Environment variables checked for the access key, in priority order.
const ACCESS_KEY_VARS: &[&str] = &["TOPRANK_ACCESS_KEY", "AWS_ALEX_TOP_SITES_ACCESS_KEY"];

/// Environment variables checked for the secret key, in priority order.
const SECRET_KEY_VARS: &[&str] = &[
    "TOPRANK_SECRET_KEY",
    "AWS_ALEX_TOP_SITES_SECRET_ACCESS_KEY",
];

/// An access key / secret key pair.
///
/// # Examples
///
/// ```
/// use toprank_auth::Credentials;
///
/// let creds = Credentials::new("AKIDEXAMPLE", "secret").unwrap();
/// assert_eq!(creds.access_key(), "AKIDEXAMPLE");
/// assert!(!format!("{creds:?}").contains("secret"));
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    access_key: String,
    secret_key: String,
}

impl Credentials {
    /// Create credentials, rejecting empty or whitespace-only values.
    pub fn new(
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Result<Self, AuthError> {
        let access_key = access_key.into();
        let secret_key = secret_key.into();

        if access_key.trim().is_empty() {
            return Err(AuthError::MissingCredential("access key"));
        }
        if secret_key.trim().is_empty() {
            return Err(AuthError::MissingCredential("secret key"));
        }

        Ok(Self {
            access_key,
            secret_key,
        })
    }

    /// Load credentials from the environment.
    ///
    /// Reads `TOPRANK_ACCESS_KEY` / `TOPRANK_SECRET_KEY`, falling back to
    /// `AWS_ALEX_TOP_SITES_ACCESS_KEY` / `AWS_ALEX_TOP_SITES_SECRET_ACCESS_KEY`.
    pub fn from_env() -> Result<Self, AuthError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load credentials through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AuthError> {
        let access_key = first_present(&lookup, ACCESS_KEY_VARS)
            .ok_or(AuthError::MissingCredential("access key"))?;
        let secret_key = first_present(&lookup, SECRET_KEY_VARS)
            .ok_or(AuthError::MissingCredential("secret key"))?;
        Self::new(access_key, secret_key)
    }

    /// The access key ID.
    #[must_use]
    pub fn access_key(&self) -> &str {
        &self.access_key
    }

    /// The secret access key.
    #[must_use]
    pub fn secret_key(&self) -> &str {
        &self.secret_key
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

fn first_present(lookup: &impl Fn(&str) -> Option<String>, names: &[&str]) -> Option<String> {
    names
        .iter()
        .find_map(|name| lookup(name).filter(|v| !v.trim().is_empty()))
}
