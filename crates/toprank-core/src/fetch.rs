//! Cache-aside orchestration.
//!
//! [`FetchOrchestrator::get_or_fetch`] checks the store, calls the fetch
//! function on a miss and writes the result back with its TTL in a single
//! `set_with_ttl` call. Cache failures never fail the request: they are
//! reported through [`CacheOutcome`] so the caller can log them. There is no
//! de-duplication of concurrent misses on the same key.

use std::future::Future;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::cache::{CacheError, CacheStore};

/// Where a value returned by [`FetchOrchestrator::get_or_fetch`] came from.
#[derive(Debug)]
pub enum CacheOutcome {
    /// Served from the cache; the fetch function was not called.
    Hit,
    /// Fetched and written to the cache.
    Miss,
    /// The cache could not be read (unreachable, or held an unreadable
    /// value); the value was fetched live.
    Bypassed(CacheError),
    /// Fetched, but writing it to the cache failed.
    WriteFailed(CacheError),
    /// The cached value was unreadable and overwriting it failed as well.
    ReplaceFailed {
        /// Why the cached value could not be read.
        read: CacheError,
        /// Why the fresh value could not be written.
        write: CacheError,
    },
}

impl CacheOutcome {
    /// Value for the `x-cache` response header.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hit => "hit",
            Self::Miss | Self::WriteFailed(_) => "miss",
            Self::Bypassed(_) | Self::ReplaceFailed { .. } => "bypass",
        }
    }

    /// The cache error behind a degraded outcome, if any.
    ///
    /// For [`ReplaceFailed`](Self::ReplaceFailed) this is the write error.
    #[must_use]
    pub fn error(&self) -> Option<&CacheError> {
        match self {
            Self::Hit | Self::Miss => None,
            Self::Bypassed(err) | Self::WriteFailed(err) => Some(err),
            Self::ReplaceFailed { write, .. } => Some(write),
        }
    }
}

/// A value together with its cache outcome.
#[derive(Debug)]
pub struct Fetched<T> {
    /// The cached or freshly fetched value.
    pub value: T,
    /// How the value was obtained.
    pub outcome: CacheOutcome,
}

/// Cache-aside front for a [`CacheStore`].
///
/// The store is injected by the caller; the orchestrator adds no locking of
/// its own.
#[derive(Debug, Clone)]
pub struct FetchOrchestrator {
    store: Arc<dyn CacheStore>,
}

impl FetchOrchestrator {
    /// Create an orchestrator over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store }
    }

    /// Return the cached value for `key`, or call `fetch` and cache its result
    /// for `ttl_secs` seconds.
    ///
    /// A hit does not refresh the TTL. A failing `fetch` is returned as is and
    /// nothing is written. When the store is unreachable the value is fetched
    /// live and no write is attempted.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::sync::Arc;
    ///
    /// use toprank_core::cache::InMemoryCacheStore;
    /// use toprank_core::fetch::{CacheOutcome, FetchOrchestrator};
    ///
    /// # tokio_test::block_on(async {
    /// let orchestrator = FetchOrchestrator::new(Arc::new(InMemoryCacheStore::new()));
    ///
    /// let first = orchestrator
    ///     .get_or_fetch("answer", 60, || async { Ok::<_, std::io::Error>(42_u32) })
    ///     .await
    ///     .unwrap();
    /// assert!(matches!(first.outcome, CacheOutcome::Miss));
    ///
    /// let second = orchestrator
    ///     .get_or_fetch("answer", 60, || async { Ok::<_, std::io::Error>(0_u32) })
    ///     .await
    ///     .unwrap();
    /// assert_eq!(second.value, 42);
    /// assert!(matches!(second.outcome, CacheOutcome::Hit));
    /// # });
    /// ```
    pub async fn get_or_fetch<T, E, F, Fut>(
        &self,
        key: &str,
        ttl_secs: u64,
        fetch: F,
    ) -> Result<Fetched<T>, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let read_error = match self.store.get(key).await {
            Ok(Some(raw)) => match serde_json::from_str::<T>(&raw) {
                Ok(value) => {
                    return Ok(Fetched {
                        value,
                        outcome: CacheOutcome::Hit,
                    });
                }
                Err(err) => Some(CacheError::from(err)),
            },
            Ok(None) => None,
            Err(err) => Some(err),
        };

        let value = fetch().await?;

        let outcome = match read_error {
            Some(err) if err.is_unavailable() => CacheOutcome::Bypassed(err),
            // An unreadable entry is overwritten with the fresh value.
            Some(err) => match self.write(key, &value, ttl_secs).await {
                Ok(()) => CacheOutcome::Bypassed(err),
                Err(write) => CacheOutcome::ReplaceFailed { read: err, write },
            },
            None => match self.write(key, &value, ttl_secs).await {
                Ok(()) => CacheOutcome::Miss,
                Err(err) => CacheOutcome::WriteFailed(err),
            },
        };

        Ok(Fetched { value, outcome })
    }

    async fn write<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl_secs: u64,
    ) -> Result<(), CacheError> {
        let raw = serde_json::to_string(value)?;
        self.store.set_with_ttl(key, raw, ttl_secs).await
    }
}
