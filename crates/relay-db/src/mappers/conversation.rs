//! Conversation entity <-> model mapper

use relay_core::entities::{Conversation, ConversationStatus};
use relay_core::value_objects::Snowflake;

use crate::models::ConversationModel;

impl From<ConversationModel> for Conversation {
    fn from(model: ConversationModel) -> Self {
        Conversation {
            id: Snowflake::new(model.id),
            account_id: Snowflake::new(model.account_id),
            inbox_id: Snowflake::new(model.inbox_id),
            contact_id: Snowflake::new(model.contact_id),
            contact_inbox_id: Snowflake::new(model.contact_inbox_id),
            status: ConversationStatus::from(model.status.as_str()),
            created_at: model.created_at,
            last_activity_at: model.last_activity_at,
        }
    }
}
