//! In-process dedup guard.
//!
//! Only coordinates tasks inside one process; deployments running several
//! workers must use [`RedisDedupGuard`](super::RedisDedupGuard).

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use relay_core::{DedupGuard, RepoResult, Snowflake};

use super::claim_key;

/// Expired claims are swept once every this many claims
const PURGE_EVERY: usize = 1024;

/// Used in place of a zero TTL, which would never hold a claim
const MIN_TTL: Duration = Duration::from_secs(1);

#[derive(Debug)]
pub struct MemoryDedupGuard {
    claims: DashMap<String, Instant>,
    ttl: Duration,
    claim_count: AtomicUsize,
}

impl MemoryDedupGuard {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            claims: DashMap::new(),
            ttl: if ttl.is_zero() { MIN_TTL } else { ttl },
            claim_count: AtomicUsize::new(0),
        }
    }

    #[must_use]
    pub fn with_ttl_seconds(ttl_seconds: u64) -> Self {
        Self::new(Duration::from_secs(ttl_seconds.max(1)))
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Number of live (unexpired) claims
    pub fn active_claims(&self) -> usize {
        let now = Instant::now();
        self.claims.iter().filter(|claim| *claim.value() > now).count()
    }

    /// Drop expired entries so the map does not grow without bound
    pub fn purge_expired(&self) {
        let now = Instant::now();
        self.claims.retain(|_, expires_at| *expires_at > now);
    }
}

impl Default for MemoryDedupGuard {
    fn default() -> Self {
        Self::with_ttl_seconds(300)
    }
}

#[async_trait]
impl DedupGuard for MemoryDedupGuard {
    async fn try_claim(&self, channel_id: Snowflake, source_id: &str) -> RepoResult<bool> {
        let now = Instant::now();

        // The entry holds the shard lock, so check and insert are one step
        let claimed = match self.claims.entry(claim_key(channel_id, source_id)) {
            Entry::Occupied(mut occupied) => {
                if *occupied.get() > now {
                    false
                } else {
                    occupied.insert(now + self.ttl);
                    true
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(now + self.ttl);
                true
            }
        };

        // Sweep outside the entry so no shard lock is held
        if self.claim_count.fetch_add(1, Ordering::Relaxed) % PURGE_EVERY == PURGE_EVERY - 1 {
            self.purge_expired();
        }

        Ok(claimed)
    }

    async fn release(&self, channel_id: Snowflake, source_id: &str) -> RepoResult<()> {
        self.claims.remove(&claim_key(channel_id, source_id));
        Ok(())
    }
}
