//! Message database model

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for messages table
#[derive(Debug, Clone, FromRow)]
pub struct MessageModel {
    pub id: i64,
    pub account_id: i64,
    pub inbox_id: i64,
    pub conversation_id: i64,
    pub sender_contact_id: Option<i64>,
    pub direction: String,
    pub content: String,
    pub source_id: String,
    pub in_reply_to_external_id: Option<String>,
    pub status: String,
    pub external_error: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Database model for attachments table
///
/// Which optional columns are set depends on the payload kind: `data` for
/// fetched files, coordinates for locations, only `fallback_title` for cards.
#[derive(Debug, Clone, FromRow)]
pub struct AttachmentModel {
    pub id: i64,
    pub message_id: i64,
    pub account_id: i64,
    pub file_type: String,
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub data: Option<Vec<u8>>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub fallback_title: Option<String>,
    pub external_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl AttachmentModel {
    /// Check if attachment carries downloaded bytes
    #[inline]
    pub fn has_data(&self) -> bool {
        self.data.is_some()
    }
}
