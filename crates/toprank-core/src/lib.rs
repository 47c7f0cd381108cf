//! Upstream client, cache-aside orchestration and cache stores for Toprank.
//!
//! - [`config`] - service configuration loaded from the environment
//! - [`cache`] - the [`CacheStore`](cache::CacheStore) trait with in-memory
//!   and Redis backends
//! - [`fetch`] - the cache-aside [`FetchOrchestrator`](fetch::FetchOrchestrator)
//! - [`client`] - the signed upstream client
//! - [`provider`] - cache keys and paging on top of the orchestrator
//! - [`handler`] - the HTTP handler implementation

pub mod cache;
pub mod client;
pub mod config;
pub mod fetch;
pub mod handler;
pub mod provider;

pub use cache::{CacheError, CacheStore, InMemoryCacheStore, RedisCacheStore};
pub use client::{TopSitesClient, TopSitesSource};
pub use config::TopRankConfig;
pub use fetch::{CacheOutcome, FetchOrchestrator, Fetched};
pub use handler::TopRankRequestHandler;
pub use provider::TopRankProvider;
