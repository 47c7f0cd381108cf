//! Redis-backed cache store.

use std::fmt;
use std::time::Duration;

use ::redis::aio::ConnectionManager;
use ::redis::{Cmd, FromRedisValue};
use async_trait::async_trait;

use super::{CacheError, CacheStore};

/// [`CacheStore`] backed by a Redis server.
///
/// A single [`ConnectionManager`] is shared by all requests; it multiplexes
/// commands over one connection and reconnects after failures. Every command
/// is bounded by the configured timeout.
#[derive(Clone)]
pub struct RedisCacheStore {
    conn: ConnectionManager,
    timeout: Duration,
}

impl fmt::Debug for RedisCacheStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisCacheStore")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl RedisCacheStore {
    /// Connect to the server at `url` (e.g. `redis://127.0.0.1:6379`).
    pub async fn connect(url: &str, timeout: Duration) -> Result<Self, CacheError> {
        let client = ::redis::Client::open(url).map_err(unavailable)?;
        let conn = tokio::time::timeout(timeout, ConnectionManager::new(client))
            .await
            .map_err(|_| CacheError::Timeout(timeout))?
            .map_err(unavailable)?;

        tracing::info!(timeout = ?timeout, "connected to redis cache");
        Ok(Self { conn, timeout })
    }

    async fn run<T: FromRedisValue>(&self, cmd: &Cmd) -> Result<T, CacheError> {
        let mut conn = self.conn.clone();
        match tokio::time::timeout(self.timeout, cmd.query_async(&mut conn)).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => Err(unavailable(err)),
            Err(_) => Err(CacheError::Timeout(self.timeout)),
        }
    }
}

fn unavailable(err: ::redis::RedisError) -> CacheError {
    CacheError::Unavailable(err.to_string())
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let value: Option<String> = self.run(::redis::cmd("GET").arg(key)).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: String) -> Result<(), CacheError> {
        self.run::<()>(::redis::cmd("SET").arg(key).arg(value)).await?;
        Ok(())
    }

    async fn expire(&self, key: &str, ttl_secs: u64) -> Result<bool, CacheError> {
        let updated: i64 = self
            .run(::redis::cmd("EXPIRE").arg(key).arg(ttl_secs))
            .await?;
        Ok(updated == 1)
    }

    async fn set_with_ttl(
        &self,
        key: &str,
        value: String,
        ttl_secs: u64,
    ) -> Result<(), CacheError> {
        // `SET .. EX 0` is rejected by the server; a zero TTL expires at once.
        if ttl_secs == 0 {
            self.run::<i64>(::redis::cmd("DEL").arg(key)).await?;
            return Ok(());
        }
        self.run::<()>(::redis::cmd("SET").arg(key).arg(value).arg("EX").arg(ttl_secs))
            .await?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}
