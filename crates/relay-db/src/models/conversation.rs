//! Conversation database model

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for conversations table
#[derive(Debug, Clone, FromRow)]
pub struct ConversationModel {
    pub id: i64,
    pub account_id: i64,
    pub inbox_id: i64,
    pub contact_id: i64,
    pub contact_inbox_id: i64,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
}
