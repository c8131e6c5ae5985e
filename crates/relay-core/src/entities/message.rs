//! Message entity - an inbound message and its attachments

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::value_objects::Snowflake;

/// Direction of a message relative to the inbox
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MessageDirection {
    #[default]
    Incoming,
    Outgoing,
}

impl MessageDirection {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Incoming => "incoming",
            Self::Outgoing => "outgoing",
        }
    }
}

impl From<&str> for MessageDirection {
    fn from(value: &str) -> Self {
        match value {
            "outgoing" => Self::Outgoing,
            _ => Self::Incoming,
        }
    }
}

/// Provider-reported delivery status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    #[default]
    Sent,
    Delivered,
    Read,
    Failed,
}

impl MessageStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sent => "sent",
            Self::Delivered => "delivered",
            Self::Read => "read",
            Self::Failed => "failed",
        }
    }
}

impl FromStr for MessageStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sent" => Ok(Self::Sent),
            "delivered" => Ok(Self::Delivered),
            "read" => Ok(Self::Read),
            "failed" => Ok(Self::Failed),
            other => Err(DomainError::InvalidStatus(other.to_string())),
        }
    }
}

/// Message entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: Snowflake,
    pub account_id: Snowflake,
    pub inbox_id: Snowflake,
    pub conversation_id: Snowflake,
    pub sender_contact_id: Option<Snowflake>,
    pub direction: MessageDirection,
    pub content: String,
    /// Provider-assigned id; unique per inbox
    pub source_id: String,
    pub in_reply_to_external_id: Option<String>,
    pub status: MessageStatus,
    /// `"{code}: {title}"` of the first provider error on failure
    pub external_error: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Create a new incoming message
    #[must_use]
    pub fn new_incoming(
        id: Snowflake,
        account_id: Snowflake,
        inbox_id: Snowflake,
        conversation_id: Snowflake,
        sender_contact_id: Snowflake,
        content: String,
        source_id: String,
    ) -> Self {
        Self {
            id,
            account_id,
            inbox_id,
            conversation_id,
            sender_contact_id: Some(sender_contact_id),
            direction: MessageDirection::Incoming,
            content,
            source_id,
            in_reply_to_external_id: None,
            status: MessageStatus::Sent,
            external_error: None,
            created_at: Utc::now(),
        }
    }

    /// Set the external id this message replies to
    #[must_use]
    pub fn in_reply_to(mut self, external_id: Option<String>) -> Self {
        self.in_reply_to_external_id = external_id;
        self
    }

    /// Apply a delivery status update
    pub fn apply_status(&mut self, status: MessageStatus, external_error: Option<String>) {
        self.status = status;
        if external_error.is_some() {
            self.external_error = external_error;
        }
    }
}

/// Attachment classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileType {
    Image,
    Audio,
    Video,
    File,
    Location,
    Contact,
}

impl FileType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Audio => "audio",
            Self::Video => "video",
            Self::File => "file",
            Self::Location => "location",
            Self::Contact => "contact",
        }
    }
}

impl From<&str> for FileType {
    fn from(value: &str) -> Self {
        match value {
            "image" => Self::Image,
            "audio" => Self::Audio,
            "video" => Self::Video,
            "location" => Self::Location,
            "contact" => Self::Contact,
            _ => Self::File,
        }
    }
}

/// What an attachment carries
#[derive(Debug, Clone, PartialEq)]
pub enum AttachmentPayload {
    /// Downloaded media
    File {
        filename: String,
        content_type: String,
        data: Vec<u8>,
    },
    /// Shared location
    Location {
        latitude: f64,
        longitude: f64,
        title: String,
        external_url: Option<String>,
    },
    /// Text-only stand-in (contact card phone numbers)
    Fallback { title: String },
}

/// Attachment entity
#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    pub id: Snowflake,
    pub message_id: Snowflake,
    pub account_id: Snowflake,
    pub file_type: FileType,
    pub payload: AttachmentPayload,
}

impl Attachment {
    /// Create a new attachment for a message
    #[must_use]
    pub fn new(id: Snowflake, message: &Message, file_type: FileType, payload: AttachmentPayload) -> Self {
        Self {
            id,
            message_id: message.id,
            account_id: message.account_id,
            file_type,
            payload,
        }
    }

    /// Size of the stored binary, zero for non-file payloads
    pub fn byte_len(&self) -> usize {
        match &self.payload {
            AttachmentPayload::File { data, .. } => data.len(),
            _ => 0,
        }
    }

    /// Human-readable title for non-file payloads
    pub fn fallback_title(&self) -> Option<&str> {
        match &self.payload {
            AttachmentPayload::Location { title, .. } | AttachmentPayload::Fallback { title } => {
                Some(title)
            }
            AttachmentPayload::File { .. } => None,
        }
    }
}
