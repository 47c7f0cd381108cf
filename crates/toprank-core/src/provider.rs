//! Ranked-sites provider: cache keys, paging and cache-aside lookups.

use std::sync::Arc;

use toprank_model::{Country, Site, TopRankResult, TopSitesQuery};

use crate::client::TopSitesSource;
use crate::fetch::{CacheOutcome, FetchOrchestrator, Fetched};

/// Cache key of the country list.
pub const COUNTRIES_KEY: &str = "top-sites-countries";

/// Cache key of one page of the global ranking.
#[must_use]
pub fn global_key(page: u32) -> String {
    format!("top-sites-global-{page}")
}

/// Cache key of one page of a country ranking. The code is lower-cased.
#[must_use]
pub fn country_key(country_code: &str, page: u32) -> String {
    format!("top-sites-{}-{page}", country_code.to_ascii_lowercase())
}

/// Serves ranked-sites records through the cache.
#[derive(Debug)]
pub struct TopRankProvider {
    source: Arc<dyn TopSitesSource>,
    orchestrator: FetchOrchestrator,
    ttl_secs: u64,
    page_size: u32,
}

impl TopRankProvider {
    /// Create a provider.
    #[must_use]
    pub fn new(
        source: Arc<dyn TopSitesSource>,
        orchestrator: FetchOrchestrator,
        ttl_secs: u64,
        page_size: u32,
    ) -> Self {
        Self {
            source,
            orchestrator,
            ttl_secs,
            page_size,
        }
    }

    /// The list of countries.
    pub async fn list_countries(&self) -> TopRankResult<Fetched<Vec<Country>>> {
        let fetched = self
            .orchestrator
            .get_or_fetch(COUNTRIES_KEY, self.ttl_secs, || self.source.fetch_countries())
            .await?;
        log_outcome(COUNTRIES_KEY, &fetched.outcome);
        Ok(fetched)
    }

    /// One page of the global ranking.
    pub async fn global_sites(&self, page: u32) -> TopRankResult<Fetched<Vec<Site>>> {
        let query = TopSitesQuery::for_page(page, self.page_size, None)?;
        self.sites(&global_key(page), &query).await
    }

    /// One page of a country ranking.
    pub async fn country_sites(
        &self,
        country_code: &str,
        page: u32,
    ) -> TopRankResult<Fetched<Vec<Site>>> {
        let query = TopSitesQuery::for_page(page, self.page_size, Some(country_code))?;
        self.sites(&country_key(query.country_code(), page), &query)
            .await
    }

    async fn sites(
        &self,
        key: &str,
        query: &TopSitesQuery,
    ) -> TopRankResult<Fetched<Vec<Site>>> {
        let fetched = self
            .orchestrator
            .get_or_fetch(key, self.ttl_secs, || self.source.fetch_sites(query))
            .await?;
        log_outcome(key, &fetched.outcome);
        Ok(fetched)
    }
}

fn log_outcome(key: &str, outcome: &CacheOutcome) {
    match outcome {
        CacheOutcome::Hit | CacheOutcome::Miss => {
            tracing::debug!(key, cache = outcome.as_str(), "served ranked sites");
        }
        CacheOutcome::Bypassed(err) => {
            tracing::warn!(key, error = %err, "cache read failed, served live response");
        }
        CacheOutcome::WriteFailed(err) => {
            tracing::warn!(key, error = %err, "cache write failed, response not cached");
        }
        CacheOutcome::ReplaceFailed { read, write } => {
            tracing::warn!(
                key,
                read_error = %read,
                write_error = %write,
                "unreadable cache entry could not be replaced, served live response"
            );
        }
    }
}
