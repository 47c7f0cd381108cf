//! Key-value cache stores with per-key expiration.
//!
//! Values are opaque text (serialized JSON); stores never interpret them.
//! A store that cannot be reached reports [`CacheError::Unavailable`] or
//! [`CacheError::Timeout`], never a miss.

mod memory;
mod redis_store;

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;

pub use memory::InMemoryCacheStore;
pub use redis_store::RedisCacheStore;

/// Errors that can occur while talking to a cache store.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// The store could not be reached or rejected the command.
    #[error("cache store unavailable: {0}")]
    Unavailable(String),

    /// The store did not answer within the configured bound.
    #[error("cache store timed out after {0:?}")]
    Timeout(Duration),

    /// A cached value could not be encoded or decoded.
    #[error("cache value serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CacheError {
    /// Whether the store itself is unreachable, as opposed to holding a bad value.
    #[must_use]
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Timeout(_))
    }
}

/// A key-value store with per-key time-to-live.
///
/// Semantics follow the `GET` / `SET` / `EXPIRE` commands of common
/// key-value servers: `set` stores a value without expiration (clearing any
/// previous TTL), `expire` attaches a TTL to an existing key, and `get` on an
/// absent or expired key returns `Ok(None)`.
///
/// Implementations must be safe to share across concurrent requests.
#[async_trait]
pub trait CacheStore: Send + Sync + fmt::Debug + 'static {
    /// Read a value.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Create or overwrite a value with no expiration.
    async fn set(&self, key: &str, value: String) -> Result<(), CacheError>;

    /// Attach or refresh a TTL. Returns `false` when the key does not exist.
    async fn expire(&self, key: &str, ttl_secs: u64) -> Result<bool, CacheError>;

    /// Create or overwrite a value together with its TTL in one operation.
    async fn set_with_ttl(
        &self,
        key: &str,
        value: String,
        ttl_secs: u64,
    ) -> Result<(), CacheError>;

    /// Short backend name used in logs.
    fn backend(&self) -> &'static str;
}
