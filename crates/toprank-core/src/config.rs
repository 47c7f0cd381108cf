//! Toprank service configuration.
//!
//! Provides [`TopRankConfig`] for configuring the gateway, the upstream
//! client and the cache. Values are loaded from environment variables.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

/// Upper bound on `CACHE_TTL_SECS` (one year). Larger values are clamped.
pub const MAX_CACHE_TTL_SECS: u64 = 365 * 86_400;

/// Toprank service configuration.
///
/// All fields have defaults suitable for talking to the production upstream
/// with an in-process cache. Configuration can be loaded from environment
/// variables via [`TopRankConfig::from_env`].
///
/// # Examples
///
/// ```
/// use toprank_core::config::TopRankConfig;
///
/// let config = TopRankConfig::default();
/// assert_eq!(config.gateway_listen, "0.0.0.0:3000");
/// assert_eq!(config.cache_ttl_secs, 86_400);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct TopRankConfig {
    /// Bind address for the gateway (e.g. `"0.0.0.0:3000"`).
    #[builder(default = String::from("0.0.0.0:3000"))]
    pub gateway_listen: String,

    /// Log level filter string (e.g. `"info"`, `"debug"`).
    #[builder(default = String::from("info"))]
    pub log_level: String,

    /// Scheme and host the upstream requests are sent to.
    #[builder(default = String::from("https://ats.amazonaws.com"))]
    pub upstream_endpoint: String,

    /// Host value covered by the request signature.
    #[builder(default = String::from("ats.us-west-1.amazonaws.com"))]
    pub upstream_signing_host: String,

    /// Upstream request timeout in seconds.
    #[builder(default = 10)]
    pub upstream_timeout_secs: u64,

    /// Cache backend: `memory` or a `redis://` URL.
    #[builder(default = String::from("memory"))]
    pub cache_url: String,

    /// Time-to-live of cached responses in seconds.
    #[builder(default = 86_400)]
    pub cache_ttl_secs: u64,

    /// Bound on every cache store call, in milliseconds.
    #[builder(default = 500)]
    pub cache_timeout_ms: u64,

    /// Records per page.
    #[builder(default = 100)]
    pub page_size: u32,
}

impl Default for TopRankConfig {
    fn default() -> Self {
        Self {
            gateway_listen: String::from("0.0.0.0:3000"),
            log_level: String::from("info"),
            upstream_endpoint: String::from("https://ats.amazonaws.com"),
            upstream_signing_host: String::from("ats.us-west-1.amazonaws.com"),
            upstream_timeout_secs: 10,
            cache_url: String::from("memory"),
            cache_ttl_secs: 86_400,
            cache_timeout_ms: 500,
            page_size: 100,
        }
    }
}

impl TopRankConfig {
    /// Load configuration from environment variables.
    ///
    /// Reads the following environment variables (falling back to defaults):
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `GATEWAY_LISTEN` | `0.0.0.0:3000` |
    /// | `LOG_LEVEL` | `info` |
    /// | `UPSTREAM_ENDPOINT` | `https://ats.amazonaws.com` |
    /// | `UPSTREAM_SIGNING_HOST` | `ats.us-west-1.amazonaws.com` |
    /// | `UPSTREAM_TIMEOUT_SECS` | `10` |
    /// | `CACHE_URL` | `memory` |
    /// | `CACHE_TTL_SECS` | `86400` |
    /// | `CACHE_TIMEOUT_MS` | `500` |
    /// | `PAGE_SIZE` | `100` |
    ///
    /// Numeric values that fail to parse, or are zero, keep their default.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(v) = lookup("GATEWAY_LISTEN") {
            config.gateway_listen = v;
        }
        if let Some(v) = lookup("LOG_LEVEL") {
            config.log_level = v;
        }
        if let Some(v) = lookup("UPSTREAM_ENDPOINT") {
            config.upstream_endpoint = v.trim_end_matches('/').to_owned();
        }
        if let Some(v) = lookup("UPSTREAM_SIGNING_HOST") {
            config.upstream_signing_host = v;
        }
        if let Some(n) = lookup("UPSTREAM_TIMEOUT_SECS").and_then(|v| parse_positive(&v)) {
            config.upstream_timeout_secs = n;
        }
        if let Some(v) = lookup("CACHE_URL") {
            config.cache_url = v;
        }
        if let Some(n) = lookup("CACHE_TTL_SECS").and_then(|v| parse_positive(&v)) {
            config.cache_ttl_secs = n.min(MAX_CACHE_TTL_SECS);
        }
        if let Some(n) = lookup("CACHE_TIMEOUT_MS").and_then(|v| parse_positive(&v)) {
            config.cache_timeout_ms = n;
        }
        if let Some(n) = lookup("PAGE_SIZE").and_then(|v| parse_positive(&v)) {
            if let Ok(n) = u32::try_from(n) {
                config.page_size = n;
            }
        }

        config
    }

    /// Upstream request timeout.
    #[must_use]
    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }

    /// Cache store call timeout.
    #[must_use]
    pub fn cache_timeout(&self) -> Duration {
        Duration::from_millis(self.cache_timeout_ms)
    }

    /// Whether the in-process cache backend is selected.
    #[must_use]
    pub fn uses_memory_cache(&self) -> bool {
        self.cache_url.eq_ignore_ascii_case("memory")
    }
}

/// Parse a strictly positive integer.
fn parse_positive(value: &str) -> Option<u64> {
    value.trim().parse::<u64>().ok().filter(|n| *n > 0)
}
