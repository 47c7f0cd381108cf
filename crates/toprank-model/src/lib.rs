//! Ranked-sites record types and error model for Toprank.
//!
//! This crate holds the types shared by every other Toprank crate: the
//! [`TopSitesQuery`] sent upstream, the validated [`Site`] and [`Country`]
//! records, the [`TopRankOperation`] enum resolved by the HTTP router, and
//! the unified [`TopRankError`].

pub mod error;
pub mod operations;
pub mod types;

pub use error::{TopRankError, TopRankErrorCode, TopRankResult};
pub use operations::TopRankOperation;
pub use types::{
    Country, CountryRanking, GlobalRanking, PageViews, Reach, ResponseGroup, Site, TopSitesQuery,
};
