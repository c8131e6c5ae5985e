//! Contact entity <-> model mapper

use relay_core::entities::{Contact, ContactInbox, ResolvedContact};
use relay_core::value_objects::Snowflake;

use crate::models::ResolvedContactModel;

impl From<ResolvedContactModel> for ResolvedContact {
    fn from(model: ResolvedContactModel) -> Self {
        let contact_id = Snowflake::new(model.contact_id);
        ResolvedContact {
            contact: Contact {
                id: contact_id,
                account_id: Snowflake::new(model.account_id),
                name: model.name,
                phone_number: model.phone_number,
                created_at: model.created_at,
            },
            contact_inbox: ContactInbox {
                id: Snowflake::new(model.contact_inbox_id),
                contact_id,
                inbox_id: Snowflake::new(model.inbox_id),
                source_id: model.source_id,
            },
        }
    }
}
