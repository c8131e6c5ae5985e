//! Ingest context - dependency container for the pipeline
//!
//! Holds the store ports, the dedup guard, the media fetcher and the ID
//! generator. Everything is behind `Arc<dyn Trait>` so tests can swap in
//! in-memory implementations.

use std::sync::Arc;

use relay_cache::{MemoryDedupGuard, RedisDedupGuard, RedisPool};
use relay_common::AppConfig;
use relay_core::traits::{
    AttachmentRepository, ChannelRepository, ContactRepository, ConversationRepository,
    DedupGuard, MessageRepository,
};
use relay_core::{DomainError, Snowflake, SnowflakeGenerator};
use relay_db::{
    PgAttachmentRepository, PgChannelRepository, PgContactRepository, PgConversationRepository,
    PgMessageRepository, PgPool,
};
use tracing::info;

use super::error::{IngestError, IngestResult};
use crate::media::{AttachmentFetcher, HttpAttachmentFetcher};

/// Dependencies shared by every job
#[derive(Clone)]
pub struct IngestContext {
    // Repositories
    channel_repo: Arc<dyn ChannelRepository>,
    contact_repo: Arc<dyn ContactRepository>,
    conversation_repo: Arc<dyn ConversationRepository>,
    message_repo: Arc<dyn MessageRepository>,
    attachment_repo: Arc<dyn AttachmentRepository>,

    dedup_guard: Arc<dyn DedupGuard>,
    fetcher: Arc<dyn AttachmentFetcher>,
    snowflake_generator: Arc<SnowflakeGenerator>,
}

impl IngestContext {
    /// Create a new context with all dependencies
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        channel_repo: Arc<dyn ChannelRepository>,
        contact_repo: Arc<dyn ContactRepository>,
        conversation_repo: Arc<dyn ConversationRepository>,
        message_repo: Arc<dyn MessageRepository>,
        attachment_repo: Arc<dyn AttachmentRepository>,
        dedup_guard: Arc<dyn DedupGuard>,
        fetcher: Arc<dyn AttachmentFetcher>,
        snowflake_generator: Arc<SnowflakeGenerator>,
    ) -> Self {
        Self {
            channel_repo,
            contact_repo,
            conversation_repo,
            message_repo,
            attachment_repo,
            dedup_guard,
            fetcher,
            snowflake_generator,
        }
    }

    /// Wire PostgreSQL repositories over `pool`, the configured dedup guard
    /// and the HTTP media fetcher.
    ///
    /// Without `REDIS_URL` the guard is process-local, which only protects
    /// against duplicates handled by this one worker.
    pub fn from_config(config: &AppConfig, pool: PgPool) -> IngestResult<Self> {
        let snowflake_generator = Arc::new(SnowflakeGenerator::new(config.snowflake.worker_id));
        let ttl = config.ingest.dedup_ttl_seconds;

        let dedup_guard: Arc<dyn DedupGuard> = match &config.redis {
            Some(redis) => {
                let redis_pool = RedisPool::from_config(redis)
                    .map_err(|e| DomainError::CacheError(e.to_string()))?;
                Arc::new(RedisDedupGuard::new(redis_pool, ttl))
            }
            None => {
                info!(ttl_seconds = ttl, "REDIS_URL not set, using in-process dedup guard");
                Arc::new(MemoryDedupGuard::with_ttl_seconds(ttl))
            }
        };

        let fetcher = HttpAttachmentFetcher::from_config(&config.ingest)
            .map_err(|e| IngestError::validation(e.to_string()))?;

        Ok(Self::with_pool(pool, dedup_guard, Arc::new(fetcher), snowflake_generator))
    }

    /// All repositories backed by one PostgreSQL pool
    pub fn with_pool(
        pool: PgPool,
        dedup_guard: Arc<dyn DedupGuard>,
        fetcher: Arc<dyn AttachmentFetcher>,
        snowflake_generator: Arc<SnowflakeGenerator>,
    ) -> Self {
        Self::new(
            Arc::new(PgChannelRepository::new(pool.clone())),
            Arc::new(PgContactRepository::new(pool.clone(), snowflake_generator.clone())),
            Arc::new(PgConversationRepository::new(pool.clone())),
            Arc::new(PgMessageRepository::new(pool.clone())),
            Arc::new(PgAttachmentRepository::new(pool)),
            dedup_guard,
            fetcher,
            snowflake_generator,
        )
    }

    // === Repositories ===

    pub fn channel_repo(&self) -> &dyn ChannelRepository {
        self.channel_repo.as_ref()
    }

    pub fn contact_repo(&self) -> &dyn ContactRepository {
        self.contact_repo.as_ref()
    }

    pub fn conversation_repo(&self) -> &dyn ConversationRepository {
        self.conversation_repo.as_ref()
    }

    pub fn message_repo(&self) -> &dyn MessageRepository {
        self.message_repo.as_ref()
    }

    pub fn attachment_repo(&self) -> &dyn AttachmentRepository {
        self.attachment_repo.as_ref()
    }

    // === Collaborators ===

    pub fn dedup_guard(&self) -> &dyn DedupGuard {
        self.dedup_guard.as_ref()
    }

    pub fn fetcher(&self) -> &dyn AttachmentFetcher {
        self.fetcher.as_ref()
    }

    /// Generate a new Snowflake ID
    pub fn generate_id(&self) -> Snowflake {
        self.snowflake_generator.generate()
    }
}

impl std::fmt::Debug for IngestContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IngestContext")
            .field("repositories", &"...")
            .field("worker_id", &self.snowflake_generator.worker_id())
            .finish()
    }
}

/// Builder for an [`IngestContext`] assembled from individual parts
#[derive(Default)]
pub struct IngestContextBuilder {
    channel_repo: Option<Arc<dyn ChannelRepository>>,
    contact_repo: Option<Arc<dyn ContactRepository>>,
    conversation_repo: Option<Arc<dyn ConversationRepository>>,
    message_repo: Option<Arc<dyn MessageRepository>>,
    attachment_repo: Option<Arc<dyn AttachmentRepository>>,
    dedup_guard: Option<Arc<dyn DedupGuard>>,
    fetcher: Option<Arc<dyn AttachmentFetcher>>,
    snowflake_generator: Option<Arc<SnowflakeGenerator>>,
}

impl IngestContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn channel_repo(mut self, repo: Arc<dyn ChannelRepository>) -> Self {
        self.channel_repo = Some(repo);
        self
    }

    pub fn contact_repo(mut self, repo: Arc<dyn ContactRepository>) -> Self {
        self.contact_repo = Some(repo);
        self
    }

    pub fn conversation_repo(mut self, repo: Arc<dyn ConversationRepository>) -> Self {
        self.conversation_repo = Some(repo);
        self
    }

    pub fn message_repo(mut self, repo: Arc<dyn MessageRepository>) -> Self {
        self.message_repo = Some(repo);
        self
    }

    pub fn attachment_repo(mut self, repo: Arc<dyn AttachmentRepository>) -> Self {
        self.attachment_repo = Some(repo);
        self
    }

    pub fn dedup_guard(mut self, guard: Arc<dyn DedupGuard>) -> Self {
        self.dedup_guard = Some(guard);
        self
    }

    pub fn fetcher(mut self, fetcher: Arc<dyn AttachmentFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    pub fn snowflake_generator(mut self, generator: Arc<SnowflakeGenerator>) -> Self {
        self.snowflake_generator = Some(generator);
        self
    }

    /// Build the context
    ///
    /// # Errors
    /// Returns `IngestError::Validation` if any dependency is missing
    pub fn build(self) -> IngestResult<IngestContext> {
        fn required<T>(value: Option<T>, name: &str) -> IngestResult<T> {
            value.ok_or_else(|| IngestError::validation(format!("{name} is required")))
        }

        Ok(IngestContext::new(
            required(self.channel_repo, "channel_repo")?,
            required(self.contact_repo, "contact_repo")?,
            required(self.conversation_repo, "conversation_repo")?,
            required(self.message_repo, "message_repo")?,
            required(self.attachment_repo, "attachment_repo")?,
            required(self.dedup_guard, "dedup_guard")?,
            required(self.fetcher, "fetcher")?,
            required(self.snowflake_generator, "snowflake_generator")?,
        ))
    }
}
