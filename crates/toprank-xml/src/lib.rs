//! Upstream ranked-sites XML parsing for Toprank.
//!
//! The upstream API answers in namespaced XML (`aws:TopSitesResponse`).
//! [`parse_sites`] and [`parse_countries`] walk the fixed response path,
//! ignoring namespace prefixes, and validate every required field so that a
//! malformed response fails as a whole instead of yielding partial records.

pub mod error;
pub mod parse;

pub use error::XmlError;
pub use parse::{parse_countries, parse_sites};
