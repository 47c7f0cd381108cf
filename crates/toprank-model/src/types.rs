//! Ranked-sites query and record types.
//!
//! [`TopSitesQuery`] describes one page of a ranking request. [`Site`] and
//! [`Country`] are the validated records produced from upstream responses and
//! served to callers as JSON (camelCase field names).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{TopRankError, TopRankResult};

/// Upstream response group, selecting which record set is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseGroup {
    /// Ranked sites for a country (or globally).
    Country,
    /// The list of countries with their site totals.
    ListCountries,
}

impl ResponseGroup {
    /// The `ResponseGroup` query parameter value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Country => "Country",
            Self::ListCountries => "ListCountries",
        }
    }
}

impl fmt::Display for ResponseGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One page of a ranking request.
///
/// # Examples
///
/// ```
/// use toprank_model::TopSitesQuery;
///
/// let query = TopSitesQuery::for_page(3, 100, Some("FR")).unwrap();
/// assert_eq!(query.start(), 201);
/// assert_eq!(query.country_code(), "fr");
/// assert!(!query.is_global());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopSitesQuery {
    start: u32,
    count: u32,
    country_code: String,
    is_global: bool,
}

impl TopSitesQuery {
    /// Records per page used by the upstream API when none is configured.
    pub const DEFAULT_COUNT: u32 = 100;

    /// Query the global ranking.
    pub fn global(start: u32, count: u32) -> TopRankResult<Self> {
        validate_window(start, count)?;
        Ok(Self {
            start,
            count,
            country_code: String::new(),
            is_global: true,
        })
    }

    /// Query the ranking for one country. The code is lower-cased.
    pub fn country(country_code: &str, start: u32, count: u32) -> TopRankResult<Self> {
        validate_window(start, count)?;
        let code = country_code.trim();
        if code.len() != 2 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(TopRankError::validation(format!(
                "invalid country code '{country_code}': expected two ASCII letters"
            )));
        }
        Ok(Self {
            start,
            count,
            country_code: code.to_ascii_lowercase(),
            is_global: false,
        })
    }

    /// Query a 1-based page of `page_size` records, globally or for a country.
    pub fn for_page(page: u32, page_size: u32, country_code: Option<&str>) -> TopRankResult<Self> {
        if page == 0 {
            return Err(TopRankError::validation("page must be >= 1"));
        }
        let start = (page - 1)
            .checked_mul(page_size)
            .and_then(|offset| offset.checked_add(1))
            .ok_or_else(|| TopRankError::validation(format!("page {page} is out of range")))?;

        match country_code {
            Some(code) => Self::country(code, start, page_size),
            None => Self::global(start, page_size),
        }
    }

    /// The query used for the country list, which ignores the ranking window.
    #[must_use]
    pub fn country_list() -> Self {
        Self {
            start: 1,
            count: Self::DEFAULT_COUNT,
            country_code: String::new(),
            is_global: true,
        }
    }

    /// 1-based rank of the first record.
    #[must_use]
    pub fn start(&self) -> u32 {
        self.start
    }

    /// Number of records requested.
    #[must_use]
    pub fn count(&self) -> u32 {
        self.count
    }

    /// The lower-cased country code, empty for global queries.
    #[must_use]
    pub fn country_code(&self) -> &str {
        &self.country_code
    }

    /// Whether this is a global query.
    #[must_use]
    pub fn is_global(&self) -> bool {
        self.is_global
    }

    /// The `CountryCode` parameter: empty when global, never omitted.
    #[must_use]
    pub fn country_code_param(&self) -> &str {
        if self.is_global {
            ""
        } else {
            &self.country_code
        }
    }

    /// Upstream query parameters for this query and response group.
    #[must_use]
    pub fn query_params(&self, group: ResponseGroup) -> Vec<(&'static str, String)> {
        vec![
            ("Action", "TopSites".to_owned()),
            ("Count", self.count.to_string()),
            ("CountryCode", self.country_code_param().to_owned()),
            ("ResponseGroup", group.as_str().to_owned()),
            ("Start", self.start.to_string()),
        ]
    }
}

fn validate_window(start: u32, count: u32) -> TopRankResult<()> {
    if start == 0 {
        return Err(TopRankError::validation("start must be >= 1"));
    }
    if count == 0 {
        return Err(TopRankError::validation("count must be >= 1"));
    }
    Ok(())
}

/// A ranked site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Site {
    /// Site URL as reported upstream.
    pub url: String,
    /// Favicon URL derived from the site URL.
    pub favicon: String,
    /// Ranking within the queried country.
    pub country: CountryRanking,
    /// Global ranking.
    pub global: GlobalRanking,
}

impl Site {
    /// The favicon URL for a site.
    #[must_use]
    pub fn favicon_for(url: &str) -> String {
        format!("https://plus.google.com/_/favicon?domain={url}")
    }
}

/// Per-country ranking metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountryRanking {
    /// Rank within the country.
    pub rank: u64,
    /// Reach metrics.
    pub reach: Reach,
    /// Page view metrics.
    pub page_views: PageViews,
}

/// Reach metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reach {
    /// Users reached per million.
    pub per_million: f64,
}

/// Page view metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageViews {
    /// Page views per million.
    pub per_million: f64,
    /// Page views per user.
    pub per_user: f64,
}

/// Global ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalRanking {
    /// Global rank.
    pub rank: u64,
}

/// A country with ranking data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Country {
    /// Country name.
    pub name: String,
    /// ISO country code.
    pub code: String,
    /// Number of ranked sites.
    pub total_sites: u64,
}
