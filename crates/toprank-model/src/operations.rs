//! Toprank API operations.

use std::fmt;

/// An operation exposed by the Toprank HTTP API.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TopRankOperation {
    /// `GET /countries`
    ListCountries,
    /// `GET /global/{page}`
    GlobalSites {
        /// 1-based page number.
        page: u32,
    },
    /// `GET /{countryCode}/{page}`
    CountrySites {
        /// Lower-cased two-letter country code.
        country_code: String,
        /// 1-based page number.
        page: u32,
    },
    /// `GET /health`
    Health,
}

impl TopRankOperation {
    /// The operation name used in logs.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ListCountries => "ListCountries",
            Self::GlobalSites { .. } => "GlobalSites",
            Self::CountrySites { .. } => "CountrySites",
            Self::Health => "Health",
        }
    }
}

impl fmt::Display for TopRankOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
