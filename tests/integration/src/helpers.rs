//! Test helpers for integration tests
//!
//! Wires an [`IngestContext`] over the in-memory store with a claim-counting
//! dedup guard and a scripted attachment fetcher.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use relay_cache::MemoryDedupGuard;
use relay_core::traits::{DedupGuard, RepoResult};
use relay_core::{Channel, MediaDescriptor, Snowflake, SnowflakeGenerator};
use relay_ingest::{
    AttachmentFetcher, FetchedMedia, IngestContext, IngestContextBuilder, IngestPipeline,
    IngestReport, IngestResult, WebhookJob,
};

use crate::store::MemoryStore;

/// Dedup guard that counts claim attempts
#[derive(Debug, Default)]
pub struct RecordingGuard {
    inner: MemoryDedupGuard,
    claims: AtomicUsize,
    releases: AtomicUsize,
}

impl RecordingGuard {
    pub fn claims(&self) -> usize {
        self.claims.load(Ordering::SeqCst)
    }

    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }

    /// Claims currently held
    pub fn held(&self) -> usize {
        self.inner.active_claims()
    }
}

#[async_trait]
impl DedupGuard for RecordingGuard {
    async fn try_claim(&self, channel_id: Snowflake, source_id: &str) -> RepoResult<bool> {
        self.claims.fetch_add(1, Ordering::SeqCst);
        self.inner.try_claim(channel_id, source_id).await
    }

    async fn release(&self, channel_id: Snowflake, source_id: &str) -> RepoResult<()> {
        self.releases.fetch_add(1, Ordering::SeqCst);
        self.inner.release(channel_id, source_id).await
    }
}

/// Fetcher returning a fixed download, or nothing
#[derive(Debug, Default)]
pub struct StubFetcher {
    media: Mutex<Option<FetchedMedia>>,
    calls: AtomicUsize,
}

impl StubFetcher {
    /// Every fetch from now on returns `media`
    pub fn serve(&self, media: FetchedMedia) {
        *self.media.lock().unwrap_or_else(PoisonError::into_inner) = Some(media);
    }

    /// Every fetch from now on fails
    pub fn fail(&self) {
        *self.media.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AttachmentFetcher for StubFetcher {
    async fn fetch(&self, _channel: &Channel, _media: &MediaDescriptor) -> Option<FetchedMedia> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.media
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Pipeline over in-memory collaborators
pub struct TestHarness {
    pub store: Arc<MemoryStore>,
    pub guard: Arc<RecordingGuard>,
    pub fetcher: Arc<StubFetcher>,
    pub ctx: IngestContext,
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

impl TestHarness {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let guard = Arc::new(RecordingGuard::default());
        let fetcher = Arc::new(StubFetcher::default());

        let ctx = IngestContextBuilder::new()
            .channel_repo(store.clone())
            .contact_repo(store.clone())
            .conversation_repo(store.clone())
            .message_repo(store.clone())
            .attachment_repo(store.clone())
            .dedup_guard(guard.clone())
            .fetcher(fetcher.clone())
            .snowflake_generator(Arc::new(SnowflakeGenerator::new(1)))
            .build()
            .expect("every dependency is set");

        Self {
            store,
            guard,
            fetcher,
            ctx,
        }
    }

    pub async fn perform(&self, job: &WebhookJob) -> IngestResult<IngestReport> {
        IngestPipeline::new(&self.ctx).perform(job).await
    }
}
