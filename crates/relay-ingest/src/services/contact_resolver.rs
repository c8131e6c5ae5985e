//! Contact and conversation resolution

use relay_core::{
    normalize_phone_digits, Conversation, ConversationFilter, Inbox, NewContact, ResolvedContact,
    SenderIdentity,
};
use tracing::{debug, instrument};

use super::context::IngestContext;
use super::error::IngestResult;

/// Upsert input for `sender` in `inbox`, `None` when the phone has no digits
pub fn new_contact(inbox: &Inbox, sender: &SenderIdentity) -> Option<NewContact> {
    let digits = normalize_phone_digits(&sender.phone)?;
    let name = sender
        .name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(NewContact::UNKNOWN_NAME)
        .to_string();

    Some(NewContact {
        account_id: inbox.account_id,
        inbox_id: inbox.id,
        phone_number: format!("+{digits}"),
        source_id: digits,
        name,
    })
}

pub struct ContactResolver<'a> {
    ctx: &'a IngestContext,
}

impl<'a> ContactResolver<'a> {
    pub fn new(ctx: &'a IngestContext) -> Self {
        Self { ctx }
    }

    #[instrument(skip(self, contact), fields(inbox_id = %contact.inbox_id, source_id = %contact.source_id))]
    pub async fn resolve_contact(&self, contact: &NewContact) -> IngestResult<ResolvedContact> {
        Ok(self.ctx.contact_repo().upsert(contact).await?)
    }

    /// Conversation that receives the next incoming message.
    ///
    /// Locked inboxes keep every message in the latest conversation whatever
    /// its status; otherwise a resolved conversation is never reopened.
    #[instrument(skip(self, inbox, contact), fields(contact_inbox_id = %contact.contact_inbox.id))]
    pub async fn resolve_conversation(
        &self,
        inbox: &Inbox,
        contact: &ResolvedContact,
    ) -> IngestResult<Conversation> {
        let filter = if inbox.lock_to_single_conversation {
            ConversationFilter::Any
        } else {
            ConversationFilter::Unresolved
        };

        let conversations = self.ctx.conversation_repo();
        if let Some(existing) = conversations
            .find_latest(contact.contact_inbox.id, filter)
            .await?
        {
            return Ok(existing);
        }

        let conversation = Conversation::new_open(
            self.ctx.generate_id(),
            inbox.account_id,
            inbox.id,
            contact.contact.id,
            contact.contact_inbox.id,
        );
        conversations.create(&conversation).await?;
        debug!(conversation_id = %conversation.id, "Conversation created");

        Ok(conversation)
    }
}
