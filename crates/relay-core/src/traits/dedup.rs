//! Dedup guard port
//!
//! Webhook delivery is at-least-once. Two deliveries of the same external id
//! can race past the durable `find_by_source_id` lookup because neither has
//! persisted yet; the guard closes that window with an atomic, short-lived
//! claim. Durable storage stays the authoritative check once the claim has
//! expired, and the `(inbox_id, source_id)` unique index is the final
//! backstop if a claim expires mid-flight.

use async_trait::async_trait;

use crate::traits::RepoResult;
use crate::value_objects::Snowflake;

#[async_trait]
pub trait DedupGuard: Send + Sync {
    /// Atomically claim `(channel_id, source_id)`.
    ///
    /// Returns `true` if this caller now holds the claim, `false` if another
    /// delivery already holds it. Must be a single atomic operation, never a
    /// read followed by a write.
    async fn try_claim(&self, channel_id: Snowflake, source_id: &str) -> RepoResult<bool>;

    /// Clear a claim after the event has been persisted (or has failed)
    async fn release(&self, channel_id: Snowflake, source_id: &str) -> RepoResult<()>;
}
