//! Domain errors - error types for the domain layer

use thiserror::Error;

use crate::value_objects::Snowflake;

/// Domain layer errors
#[derive(Debug, Error)]
pub enum DomainError {
    // =========================================================================
    // Not Found Errors
    // =========================================================================
    #[error("Channel not found: {0}")]
    ChannelNotFound(Snowflake),

    #[error("Inbox not found for channel: {0}")]
    InboxNotFound(Snowflake),

    #[error("Message not found: {0}")]
    MessageNotFound(Snowflake),

    #[error("Conversation not found: {0}")]
    ConversationNotFound(Snowflake),

    // =========================================================================
    // Validation Errors
    // =========================================================================
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid delivery status: {0}")]
    InvalidStatus(String),

    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    // =========================================================================
    // Conflict Errors
    // =========================================================================
    #[error("Message with source id {source_id} already exists in inbox {inbox_id}")]
    DuplicateSourceId { inbox_id: Snowflake, source_id: String },

    // =========================================================================
    // Infrastructure Errors (wrapped)
    // =========================================================================
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Cache error: {0}")]
    CacheError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl DomainError {
    /// Get an error code string for logs and job results
    pub fn code(&self) -> &'static str {
        match self {
            Self::ChannelNotFound(_) => "UNKNOWN_CHANNEL",
            Self::InboxNotFound(_) => "UNKNOWN_INBOX",
            Self::MessageNotFound(_) => "UNKNOWN_MESSAGE",
            Self::ConversationNotFound(_) => "UNKNOWN_CONVERSATION",

            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::InvalidStatus(_) => "INVALID_STATUS",
            Self::MalformedPayload(_) => "MALFORMED_PAYLOAD",

            Self::DuplicateSourceId { .. } => "DUPLICATE_SOURCE_ID",

            Self::DatabaseError(_) => "DATABASE_ERROR",
            Self::CacheError(_) => "CACHE_ERROR",
            Self::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::ChannelNotFound(_)
                | Self::InboxNotFound(_)
                | Self::MessageNotFound(_)
                | Self::ConversationNotFound(_)
        )
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::ValidationError(_) | Self::InvalidStatus(_) | Self::MalformedPayload(_)
        )
    }

    /// Check if this is a conflict error
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::DuplicateSourceId { .. })
    }

    /// Infrastructure failures a dispatcher may retry
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::DatabaseError(_) | Self::CacheError(_))
    }
}
