//! Ports - interfaces the ingestion pipeline needs from infrastructure

mod dedup;
mod repositories;

pub use dedup::DedupGuard;
pub use repositories::{
    AttachmentRepository, ChannelRepository, ContactRepository, ConversationFilter,
    ConversationRepository, MessageRepository, RepoResult,
};
