//! Channel and inbox database models

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::FromRow;

/// Database model for channels table
#[derive(Debug, Clone, FromRow)]
pub struct ChannelModel {
    pub id: i64,
    pub account_id: i64,
    /// 'whatsapp_cloud', 'gupshup' or 'default'
    pub provider: String,
    pub phone_number: String,
    pub provider_config: Json<serde_json::Value>,
    pub reauthorization_required: bool,
    pub message_templates: Option<Json<serde_json::Value>>,
    pub message_templates_last_updated: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Database model for inboxes table
#[derive(Debug, Clone, FromRow)]
pub struct InboxModel {
    pub id: i64,
    pub account_id: i64,
    pub channel_id: i64,
    pub name: String,
    pub lock_to_single_conversation: bool,
}
