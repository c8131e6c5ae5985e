//! Contact entities - the sending identity and its per-inbox link

use chrono::{DateTime, Utc};

use crate::value_objects::Snowflake;

/// Account-owned contact, shared across conversations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contact {
    pub id: Snowflake,
    pub account_id: Snowflake,
    pub name: String,
    /// `+` followed by digits
    pub phone_number: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A contact's identity within one inbox
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactInbox {
    pub id: Snowflake,
    pub contact_id: Snowflake,
    pub inbox_id: Snowflake,
    /// Digits-only sender phone, unique per inbox
    pub source_id: String,
}

/// Upsert input for contact resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewContact {
    pub account_id: Snowflake,
    pub inbox_id: Snowflake,
    pub source_id: String,
    pub name: String,
    pub phone_number: String,
}

impl NewContact {
    /// Fallback display name when the payload carries none
    pub const UNKNOWN_NAME: &'static str = "unknown";
}

/// Result of a contact upsert
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedContact {
    pub contact: Contact,
    pub contact_inbox: ContactInbox,
}
