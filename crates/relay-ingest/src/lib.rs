//! # relay-ingest
//!
//! Application layer for inbound WhatsApp webhooks: provider adapters,
//! channel and contact resolution, media download and the ingestion
//! pipeline that persists messages exactly once per `(inbox, source_id)`.

pub mod adapters;
pub mod dto;
pub mod media;
pub mod services;

pub use adapters::{normalize, NormalizeContext};
pub use dto::{DropReason, EventOutcome, IngestReport, WebhookJob};
pub use media::{AttachmentFetcher, FetchError, FetchedMedia, HttpAttachmentFetcher};
pub use services::{
    ChannelResolution, ChannelResolver, IngestContext, IngestContextBuilder, IngestError,
    IngestPipeline, IngestResult, PayloadShape,
};
