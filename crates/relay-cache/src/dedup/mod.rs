//! Dedup guard implementations

mod memory;
mod redis_guard;

use relay_core::Snowflake;

pub use memory::MemoryDedupGuard;
pub use redis_guard::RedisDedupGuard;

/// Key prefix for in-flight message claims
pub const CLAIM_KEY_PREFIX: &str = "wa_message_source:";

/// Key for a `(channel, source id)` claim
pub fn claim_key(channel_id: Snowflake, source_id: &str) -> String {
    format!("{CLAIM_KEY_PREFIX}{channel_id}:{source_id}")
}
