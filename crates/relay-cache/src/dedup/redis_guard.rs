//! Redis-backed dedup guard shared by every worker process.

use async_trait::async_trait;
use relay_core::{DedupGuard, DomainError, RepoResult, Snowflake};

use crate::pool::{RedisPool, RedisPoolError};

use super::claim_key;

/// Claims live as `SET NX EX` keys, so expiry is enforced by Redis itself
#[derive(Clone, Debug)]
pub struct RedisDedupGuard {
    pool: RedisPool,
    ttl_seconds: u64,
}

impl RedisDedupGuard {
    #[must_use]
    pub fn new(pool: RedisPool, ttl_seconds: u64) -> Self {
        Self {
            pool,
            ttl_seconds: ttl_seconds.max(1),
        }
    }

    /// Remaining claim lifetime in seconds, `None` when unclaimed
    pub async fn remaining_ttl(&self, channel_id: Snowflake, source_id: &str) -> RepoResult<Option<i64>> {
        let mut conn = self.pool.get().await.map_err(cache_error)?;
        let ttl: i64 = redis::cmd("TTL")
            .arg(claim_key(channel_id, source_id))
            .query_async(&mut conn)
            .await
            .map_err(|e| cache_error(e.into()))?;
        // -2: no such key
        Ok((ttl != -2).then_some(ttl))
    }
}

fn cache_error(e: RedisPoolError) -> DomainError {
    DomainError::CacheError(e.to_string())
}

#[async_trait]
impl DedupGuard for RedisDedupGuard {
    async fn try_claim(&self, channel_id: Snowflake, source_id: &str) -> RepoResult<bool> {
        let key = claim_key(channel_id, source_id);
        let mut conn = self.pool.get().await.map_err(cache_error)?;

        // "OK" when written, nil when someone else holds the key
        let reply: Option<String> = redis::cmd("SET")
            .arg(&key)
            .arg("1")
            .arg("NX")
            .arg("EX")
            .arg(self.ttl_seconds)
            .query_async(&mut conn)
            .await
            .map_err(|e| cache_error(e.into()))?;

        let claimed = reply.is_some();
        tracing::trace!(key = %key, claimed, "Dedup claim attempted");
        Ok(claimed)
    }

    async fn release(&self, channel_id: Snowflake, source_id: &str) -> RepoResult<()> {
        let mut conn = self.pool.get().await.map_err(cache_error)?;
        redis::cmd("DEL")
            .arg(claim_key(channel_id, source_id))
            .query_async::<i64>(&mut conn)
            .await
            .map_err(|e| cache_error(e.into()))?;
        Ok(())
    }
}
