//! Repository traits (ports) - define the interface for data access
//!
//! The domain layer defines what the ingestion pipeline needs, and the
//! infrastructure layer provides the implementation.

use async_trait::async_trait;

use crate::entities::{
    AccountStatus, Attachment, Channel, Conversation, Inbox, Message, MessageStatus, NewContact,
    ResolvedContact,
};
use crate::error::DomainError;
use crate::value_objects::Snowflake;

/// Result type for repository operations
pub type RepoResult<T> = Result<T, DomainError>;

// ============================================================================
// Channel Repository
// ============================================================================

#[async_trait]
pub trait ChannelRepository: Send + Sync {
    /// Find channel by its E.164 phone number (with leading `+`)
    async fn find_by_phone_number(&self, phone_number: &str) -> RepoResult<Option<Channel>>;

    /// Find the Gupshup channel whose provider config `app_name` matches
    async fn find_gupshup_by_app_name(&self, app_name: &str) -> RepoResult<Option<Channel>>;

    /// Find the inbox attached to a channel
    async fn find_inbox(&self, channel_id: Snowflake) -> RepoResult<Option<Inbox>>;

    /// Status of the owning account
    async fn account_status(&self, account_id: Snowflake) -> RepoResult<AccountStatus>;
}

// ============================================================================
// Contact Repository
// ============================================================================

#[async_trait]
pub trait ContactRepository: Send + Sync {
    /// Find or create the contact identified by `(inbox_id, source_id)`.
    ///
    /// Must be safe under concurrent calls for the same identity.
    async fn upsert(&self, contact: &NewContact) -> RepoResult<ResolvedContact>;
}

// ============================================================================
// Conversation Repository
// ============================================================================

/// Which conversations `find_latest` may return
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationFilter {
    /// Any status
    Any,
    /// Anything but `resolved`
    Unresolved,
}

#[async_trait]
pub trait ConversationRepository: Send + Sync {
    /// Most recent conversation for a contact inbox matching the filter
    async fn find_latest(
        &self,
        contact_inbox_id: Snowflake,
        filter: ConversationFilter,
    ) -> RepoResult<Option<Conversation>>;

    /// Create a new conversation
    async fn create(&self, conversation: &Conversation) -> RepoResult<()>;
}

// ============================================================================
// Message Repository
// ============================================================================

#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Find message by provider-assigned source id within an inbox
    async fn find_by_source_id(&self, inbox_id: Snowflake, source_id: &str)
        -> RepoResult<Option<Message>>;

    /// Create a new message.
    ///
    /// Returns `DomainError::DuplicateSourceId` when `(inbox_id, source_id)`
    /// already exists.
    async fn create(&self, message: &Message) -> RepoResult<()>;

    /// Update delivery status and, when given, the external error
    async fn update_status(
        &self,
        id: Snowflake,
        status: MessageStatus,
        external_error: Option<&str>,
    ) -> RepoResult<()>;
}

// ============================================================================
// Attachment Repository
// ============================================================================

#[async_trait]
pub trait AttachmentRepository: Send + Sync {
    /// Create a new attachment
    async fn create(&self, attachment: &Attachment) -> RepoResult<()>;

    /// Find attachments for a message
    async fn find_by_message(&self, message_id: Snowflake) -> RepoResult<Vec<Attachment>>;
}
