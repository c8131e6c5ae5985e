//! # relay-cache
//!
//! Short-lived claim storage that keeps concurrent deliveries of the same
//! provider message from being ingested twice.
//!
//! - **Connection Pool**: managed Redis connection pool with deadpool
//! - **RedisDedupGuard**: cross-process claims via `SET NX EX`
//! - **MemoryDedupGuard**: single-process claims for local runs and tests
//!
//! ## Example
//!
//! ```ignore
//! use relay_cache::{RedisDedupGuard, RedisPool, RedisPoolConfig};
//! use relay_core::DedupGuard;
//!
//! let pool = RedisPool::new(RedisPoolConfig::default())?;
//! let guard = RedisDedupGuard::new(pool, 300);
//!
//! if guard.try_claim(channel_id, "wamid.HBgL").await? {
//!     // persist the message, then
//!     guard.release(channel_id, "wamid.HBgL").await?;
//! }
//! ```

pub mod dedup;
pub mod pool;

pub use dedup::{claim_key, MemoryDedupGuard, RedisDedupGuard, CLAIM_KEY_PREFIX};
pub use pool::{RedisPool, RedisPoolConfig, RedisPoolError, RedisResult};
