//! Redis-backed ephemeral store
//!
//! Every operation is a single command or script so concurrent bot
//! instances see consistent markers and counters.

use std::time::Duration;

use async_trait::async_trait;
use redis::{AsyncCommands, Script};
use tracing::instrument;

use contest_core::traits::{EphemeralStore, RepoResult};

use crate::pool::{RedisPool, RedisPoolError};

/// Increment and start the window expiry on the first hit only
const INCR_WINDOW_SCRIPT: &str = r"
local count = redis.call('INCR', KEYS[1])
if count == 1 then
    redis.call('PEXPIRE', KEYS[1], ARGV[1])
end
return count
";

/// Redis has no zero TTL; round up to one millisecond
fn ttl_millis(ttl: Duration) -> u64 {
    u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1)
}

/// Ephemeral store shared by every bot instance through Redis
#[derive(Clone)]
pub struct RedisEphemeralStore {
    pool: RedisPool,
    incr_window: Script,
}

impl RedisEphemeralStore {
    /// Create a new store on top of `pool`
    #[must_use]
    pub fn new(pool: RedisPool) -> Self {
        Self {
            pool,
            incr_window: Script::new(INCR_WINDOW_SCRIPT),
        }
    }

    /// Build the pool from config and fail fast when Redis is unreachable
    pub async fn connect(config: &contest_common::RedisConfig) -> RepoResult<Self> {
        let pool = RedisPool::from_config(config)?;
        pool.ping().await?;
        Ok(Self::new(pool))
    }
}

#[async_trait]
impl EphemeralStore for RedisEphemeralStore {
    #[instrument(skip(self))]
    async fn get(&self, key: &str) -> RepoResult<Option<String>> {
        let mut conn = self.pool.get().await?;
        let value: Option<String> = conn
            .get(self.pool.key(key))
            .await
            .map_err(RedisPoolError::from)?;
        Ok(value)
    }

    #[instrument(skip(self, value))]
    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> RepoResult<()> {
        let mut conn = self.pool.get().await?;
        redis::cmd("SET")
            .arg(self.pool.key(key))
            .arg(value)
            .arg("PX")
            .arg(ttl_millis(ttl))
            .query_async::<()>(&mut conn)
            .await
            .map_err(RedisPoolError::from)?;
        Ok(())
    }

    #[instrument(skip(self, value))]
    async fn set_nx_ex(&self, key: &str, value: &str, ttl: Duration) -> RepoResult<bool> {
        let mut conn = self.pool.get().await?;
        // Nil reply when the key already exists
        let reply: Option<String> = redis::cmd("SET")
            .arg(self.pool.key(key))
            .arg(value)
            .arg("NX")
            .arg("PX")
            .arg(ttl_millis(ttl))
            .query_async(&mut conn)
            .await
            .map_err(RedisPoolError::from)?;
        Ok(reply.is_some())
    }

    #[instrument(skip(self))]
    async fn take(&self, key: &str) -> RepoResult<Option<String>> {
        let mut conn = self.pool.get().await?;
        let value: Option<String> = redis::cmd("GETDEL")
            .arg(self.pool.key(key))
            .query_async(&mut conn)
            .await
            .map_err(RedisPoolError::from)?;
        Ok(value)
    }

    #[instrument(skip(self))]
    async fn delete(&self, key: &str) -> RepoResult<()> {
        let mut conn = self.pool.get().await?;
        conn.del::<_, ()>(self.pool.key(key))
            .await
            .map_err(RedisPoolError::from)?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn incr_window(&self, key: &str, window: Duration) -> RepoResult<u64> {
        let mut conn = self.pool.get().await?;
        let count: u64 = self
            .incr_window
            .key(self.pool.key(key))
            .arg(ttl_millis(window))
            .invoke_async(&mut conn)
            .await
            .map_err(RedisPoolError::from)?;
        Ok(count)
    }
}
