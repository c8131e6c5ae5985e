//! Message and Attachment entity <-> model mapper

use relay_core::entities::{
    Attachment, AttachmentPayload, FileType, Message, MessageDirection, MessageStatus,
};
use relay_core::value_objects::Snowflake;

use crate::models::{AttachmentModel, MessageModel};

impl From<MessageModel> for Message {
    fn from(model: MessageModel) -> Self {
        Message {
            id: Snowflake::new(model.id),
            account_id: Snowflake::new(model.account_id),
            inbox_id: Snowflake::new(model.inbox_id),
            conversation_id: Snowflake::new(model.conversation_id),
            sender_contact_id: model.sender_contact_id.map(Snowflake::new),
            direction: MessageDirection::from(model.direction.as_str()),
            content: model.content,
            source_id: model.source_id,
            in_reply_to_external_id: model.in_reply_to_external_id,
            status: model.status.parse().unwrap_or(MessageStatus::Sent),
            external_error: model.external_error,
            created_at: model.created_at,
        }
    }
}

impl From<AttachmentModel> for Attachment {
    fn from(model: AttachmentModel) -> Self {
        let payload = match (model.data, model.latitude, model.longitude) {
            (Some(data), _, _) => AttachmentPayload::File {
                filename: model.filename.unwrap_or_default(),
                content_type: model
                    .content_type
                    .unwrap_or_else(|| "application/octet-stream".to_string()),
                data,
            },
            (None, Some(latitude), Some(longitude)) => AttachmentPayload::Location {
                latitude,
                longitude,
                title: model.fallback_title.unwrap_or_default(),
                external_url: model.external_url,
            },
            _ => AttachmentPayload::Fallback {
                title: model.fallback_title.unwrap_or_default(),
            },
        };

        Attachment {
            id: Snowflake::new(model.id),
            message_id: Snowflake::new(model.message_id),
            account_id: Snowflake::new(model.account_id),
            file_type: FileType::from(model.file_type.as_str()),
            payload,
        }
    }
}

/// Message entity flattened for insertion
pub struct MessageInsert<'a> {
    pub id: i64,
    pub account_id: i64,
    pub inbox_id: i64,
    pub conversation_id: i64,
    pub sender_contact_id: Option<i64>,
    pub direction: &'static str,
    pub content: &'a str,
    pub source_id: &'a str,
    pub in_reply_to_external_id: Option<&'a str>,
    pub status: &'static str,
    pub external_error: Option<&'a str>,
}

impl<'a> MessageInsert<'a> {
    pub fn new(message: &'a Message) -> Self {
        Self {
            id: message.id.into_inner(),
            account_id: message.account_id.into_inner(),
            inbox_id: message.inbox_id.into_inner(),
            conversation_id: message.conversation_id.into_inner(),
            sender_contact_id: message.sender_contact_id.map(Snowflake::into_inner),
            direction: message.direction.as_str(),
            content: &message.content,
            source_id: &message.source_id,
            in_reply_to_external_id: message.in_reply_to_external_id.as_deref(),
            status: message.status.as_str(),
            external_error: message.external_error.as_deref(),
        }
    }
}

/// Attachment entity spread over the nullable payload columns
#[derive(Debug, Default)]
pub struct AttachmentInsert<'a> {
    pub id: i64,
    pub message_id: i64,
    pub account_id: i64,
    pub file_type: &'static str,
    pub filename: Option<&'a str>,
    pub content_type: Option<&'a str>,
    pub data: Option<&'a [u8]>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub fallback_title: Option<&'a str>,
    pub external_url: Option<&'a str>,
}

impl<'a> AttachmentInsert<'a> {
    pub fn new(attachment: &'a Attachment) -> Self {
        let base = Self {
            id: attachment.id.into_inner(),
            message_id: attachment.message_id.into_inner(),
            account_id: attachment.account_id.into_inner(),
            file_type: attachment.file_type.as_str(),
            ..Default::default()
        };

        match &attachment.payload {
            AttachmentPayload::File {
                filename,
                content_type,
                data,
            } => Self {
                filename: Some(filename.as_str()),
                content_type: Some(content_type.as_str()),
                data: Some(data.as_slice()),
                ..base
            },
            AttachmentPayload::Location {
                latitude,
                longitude,
                title,
                external_url,
            } => Self {
                latitude: Some(*latitude),
                longitude: Some(*longitude),
                fallback_title: Some(title.as_str()),
                external_url: external_url.as_deref(),
                ..base
            },
            AttachmentPayload::Fallback { title } => Self {
                fallback_title: Some(title.as_str()),
                ..base
            },
        }
    }
}
