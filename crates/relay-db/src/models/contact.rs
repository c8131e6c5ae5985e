//! Contact database model

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// A contact_inboxes row joined with its contact
#[derive(Debug, Clone, FromRow)]
pub struct ResolvedContactModel {
    pub contact_inbox_id: i64,
    pub inbox_id: i64,
    pub source_id: String,
    pub contact_id: i64,
    pub account_id: i64,
    pub name: String,
    pub phone_number: Option<String>,
    pub created_at: DateTime<Utc>,
}
