//! # relay-core
//!
//! Domain layer for webhook ingestion: entities, the canonical `IncomingEvent`
//! produced by provider adapters, and the store/guard traits (ports).
//! This crate has zero dependencies on infrastructure (database, cache, HTTP).

pub mod entities;
pub mod error;
pub mod events;
pub mod traits;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use entities::{
    AccountStatus, Attachment, AttachmentPayload, Channel, Contact, ContactInbox, Conversation,
    ConversationStatus, FileType, Inbox, Message, MessageDirection, MessageStatus, NewContact,
    Provider, ProviderConfig, ResolvedContact,
};
pub use error::DomainError;
pub use events::{
    ContactCard, EventBody, EventKind, GeoLocation, InboundMessage, IncomingEvent,
    MediaDescriptor, MediaSource, MessageContent, MessageSubtype, ProviderError, SenderIdentity,
    StatusReport, ATTACHMENT_PLACEHOLDER,
};
pub use traits::{
    AttachmentRepository, ChannelRepository, ContactRepository, ConversationFilter,
    ConversationRepository, DedupGuard, MessageRepository, RepoResult,
};
pub use value_objects::{normalize_phone_digits, Snowflake, SnowflakeGenerator, SnowflakeParseError};
