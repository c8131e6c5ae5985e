//! Conversation entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::Snowflake;

/// Conversation status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConversationStatus {
    #[default]
    Open,
    Resolved,
    Pending,
    Snoozed,
}

impl ConversationStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Resolved => "resolved",
            Self::Pending => "pending",
            Self::Snoozed => "snoozed",
        }
    }
}

impl From<&str> for ConversationStatus {
    fn from(value: &str) -> Self {
        match value {
            "resolved" => Self::Resolved,
            "pending" => Self::Pending,
            "snoozed" => Self::Snoozed,
            _ => Self::Open,
        }
    }
}

/// Conversation entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    pub id: Snowflake,
    pub account_id: Snowflake,
    pub inbox_id: Snowflake,
    pub contact_id: Snowflake,
    pub contact_inbox_id: Snowflake,
    pub status: ConversationStatus,
    pub created_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
}

impl Conversation {
    /// Create a new open conversation
    #[must_use]
    pub fn new_open(
        id: Snowflake,
        account_id: Snowflake,
        inbox_id: Snowflake,
        contact_id: Snowflake,
        contact_inbox_id: Snowflake,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            account_id,
            inbox_id,
            contact_id,
            contact_inbox_id,
            status: ConversationStatus::Open,
            created_at: now,
            last_activity_at: now,
        }
    }

    #[inline]
    pub fn is_resolved(&self) -> bool {
        matches!(self.status, ConversationStatus::Resolved)
    }
}
