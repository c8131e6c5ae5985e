//! Incoming webhook event
//!
//! One raw webhook delivery normalizes into zero or more `IncomingEvent`s.
//! Events are transient: the ingestion pipeline consumes each one once and
//! only the records it derives are persisted.

use serde::{Deserialize, Serialize};

use crate::entities::{FileType, Provider};

/// Placeholder message content when a payload carries no text
pub const ATTACHMENT_PLACEHOLDER: &str = "Attachment";

/// Event kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Message,
    Status,
    ContactCard,
}

/// Message subtype, normalized across providers
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageSubtype {
    Text,
    Image,
    Document,
    Video,
    Audio,
    Location,
    Contacts,
    Button,
    Interactive,
    Reaction,
    /// Ephemeral, sticker, `unsupported`, or anything unrecognized
    Unsupported(String),
}

impl MessageSubtype {
    /// Reactions and unsupported kinds never produce records
    pub fn is_processable(&self) -> bool {
        !matches!(self, Self::Reaction | Self::Unsupported(_))
    }

    /// Subtypes whose content is not a downloadable file
    pub fn skips_media_fetch(&self) -> bool {
        matches!(
            self,
            Self::Text | Self::Button | Self::Interactive | Self::Location | Self::Contacts
        )
    }

    /// Attachment classification for this subtype
    pub fn file_type(&self) -> FileType {
        match self {
            Self::Image => FileType::Image,
            Self::Audio => FileType::Audio,
            Self::Video => FileType::Video,
            Self::Location => FileType::Location,
            Self::Contacts => FileType::Contact,
            _ => FileType::File,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Document => "document",
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Location => "location",
            Self::Contacts => "contacts",
            Self::Button => "button",
            Self::Interactive => "interactive",
            Self::Reaction => "reaction",
            Self::Unsupported(other) => other,
        }
    }
}

/// Who sent the event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SenderIdentity {
    /// Phone as delivered by the provider (may contain formatting)
    pub phone: String,
    pub name: Option<String>,
}

/// Where remote media lives
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaSource {
    /// Directly downloadable URL
    Url(String),
    /// Provider media handle that must be resolved through the provider API
    MediaId(String),
}

/// Remote media reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaDescriptor {
    pub source: MediaSource,
    pub content_type: Option<String>,
    pub caption: Option<String>,
    pub filename: Option<String>,
}

/// Shared location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub name: Option<String>,
    pub address: Option<String>,
    pub url: Option<String>,
}

impl GeoLocation {
    /// `"name, address"`, else the address, else `"Location"`
    pub fn label(&self) -> String {
        match (self.name.as_deref(), self.address.as_deref()) {
            (Some(name), Some(address)) => format!("{name}, {address}"),
            (Some(name), None) => name.to_string(),
            (None, Some(address)) => address.to_string(),
            (None, None) => "Location".to_string(),
        }
    }
}

/// One shared contact card
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactCard {
    pub name: Option<String>,
    pub phones: Vec<String>,
}

/// Normalized message content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum MessageContent {
    Text(String),
    Media(MediaDescriptor),
    Location(GeoLocation),
    Contacts(Vec<ContactCard>),
    Empty,
}

impl MessageContent {
    /// Displayable text: the body, or a media caption
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text.as_str()),
            Self::Media(media) => media.caption.as_deref(),
            _ => None,
        }
        .filter(|t| !t.trim().is_empty())
    }
}

/// Provider-reported error attached to a message or status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderError {
    pub code: String,
    pub title: String,
}

impl ProviderError {
    /// Single diagnostic string stored on the message
    pub fn diagnostic(&self) -> String {
        format!("{}: {}", self.code, self.title)
    }
}

/// Body of a `message` event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundMessage {
    pub subtype: MessageSubtype,
    pub content: MessageContent,
    pub reply_to: Option<String>,
    /// Non-empty when the provider tagged this entry as an error event
    pub errors: Vec<ProviderError>,
}

impl InboundMessage {
    /// Message content, falling back to the attachment placeholder
    pub fn content_or_placeholder(&self) -> String {
        self.content
            .text()
            .map_or_else(|| ATTACHMENT_PLACEHOLDER.to_string(), str::to_string)
    }

    #[inline]
    pub fn is_error_event(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Body of a `status` event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    /// Raw provider status, parsed by the reconciler
    pub status: String,
    pub errors: Vec<ProviderError>,
}

/// Event payload per kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventBody {
    Message(InboundMessage),
    Status(StatusReport),
    ContactCard,
}

/// Canonical inbound event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomingEvent {
    pub provider: Provider,
    /// Provider-assigned id, the idempotency key
    pub source_id: String,
    pub sender: Option<SenderIdentity>,
    pub body: EventBody,
    /// Raw entry this event came from, kept for diagnostics
    pub raw: serde_json::Value,
}

impl IncomingEvent {
    pub fn kind(&self) -> EventKind {
        match self.body {
            EventBody::Message(_) => EventKind::Message,
            EventBody::Status(_) => EventKind::Status,
            EventBody::ContactCard => EventKind::ContactCard,
        }
    }

    pub fn message(&self) -> Option<&InboundMessage> {
        match &self.body {
            EventBody::Message(message) => Some(message),
            _ => None,
        }
    }
}
