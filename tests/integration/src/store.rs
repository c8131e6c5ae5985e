//! In-memory store implementing every repository port
//!
//! Mirrors the PostgreSQL constraints the pipeline relies on: unique channel
//! phone numbers, unique `(inbox_id, source_id)` for messages and contact
//! inboxes. Failure injection lets tests exercise retry paths.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use relay_core::traits::{
    AttachmentRepository, ChannelRepository, ContactRepository, ConversationFilter,
    ConversationRepository, MessageRepository, RepoResult,
};
use relay_core::{
    AccountStatus, Attachment, Channel, Contact, ContactInbox, Conversation, ConversationStatus,
    DomainError, Inbox, Message, MessageStatus, NewContact, Provider, ProviderConfig,
    ResolvedContact, Snowflake, SnowflakeGenerator,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Decrement `counter` if positive; true means "fail this call"
fn take_failure(counter: &AtomicUsize) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

#[derive(Debug, Default)]
struct Tables {
    channels: Vec<Channel>,
    inboxes: Vec<Inbox>,
    account_status: HashMap<Snowflake, AccountStatus>,
    contacts: Vec<Contact>,
    contact_inboxes: Vec<ContactInbox>,
    conversations: Vec<Conversation>,
    messages: Vec<Message>,
    attachments: Vec<Attachment>,
}

/// Shared in-memory tables
pub struct MemoryStore {
    tables: Mutex<Tables>,
    ids: SnowflakeGenerator,
    failing_channel_lookups: AtomicUsize,
    failing_message_writes: AtomicUsize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            tables: Mutex::new(Tables::default()),
            ids: SnowflakeGenerator::new(1000),
            failing_channel_lookups: AtomicUsize::new(0),
            failing_message_writes: AtomicUsize::new(0),
        }
    }

    // === Seeding ===

    /// Insert a channel with its inbox under a fresh, active account
    pub fn seed_channel(
        &self,
        provider: Provider,
        phone_number: &str,
        config: ProviderConfig,
    ) -> (Channel, Inbox) {
        let channel = Channel::new(
            self.ids.generate(),
            self.ids.generate(),
            provider,
            phone_number.to_string(),
            config,
        );
        let inbox = Inbox {
            id: self.ids.generate(),
            account_id: channel.account_id,
            channel_id: channel.id,
            name: format!("WhatsApp {phone_number}"),
            lock_to_single_conversation: false,
        };

        let mut tables = lock(&self.tables);
        tables.account_status.insert(channel.account_id, AccountStatus::Active);
        tables.channels.push(channel.clone());
        tables.inboxes.push(inbox.clone());
        (channel, inbox)
    }

    pub fn set_account_status(&self, account_id: Snowflake, status: AccountStatus) {
        lock(&self.tables).account_status.insert(account_id, status);
    }

    pub fn set_reauthorization_required(&self, channel_id: Snowflake, required: bool) {
        let mut tables = lock(&self.tables);
        if let Some(channel) = tables.channels.iter_mut().find(|c| c.id == channel_id) {
            channel.reauthorization_required = required;
        }
    }

    pub fn set_lock_to_single_conversation(&self, inbox_id: Snowflake, locked: bool) {
        let mut tables = lock(&self.tables);
        if let Some(inbox) = tables.inboxes.iter_mut().find(|i| i.id == inbox_id) {
            inbox.lock_to_single_conversation = locked;
        }
    }

    /// Mark every conversation as resolved
    pub fn resolve_all_conversations(&self) {
        for conversation in &mut lock(&self.tables).conversations {
            conversation.status = ConversationStatus::Resolved;
        }
    }

    // === Failure injection ===

    /// Channel lookups fail with a database error `n` times
    pub fn fail_channel_lookups(&self, n: usize) {
        self.failing_channel_lookups.store(n, Ordering::SeqCst);
    }

    /// Message inserts fail with a database error `n` times
    pub fn fail_message_writes(&self, n: usize) {
        self.failing_message_writes.store(n, Ordering::SeqCst);
    }

    // === Inspection ===

    pub fn messages(&self) -> Vec<Message> {
        lock(&self.tables).messages.clone()
    }

    pub fn messages_in(&self, inbox_id: Snowflake) -> Vec<Message> {
        lock(&self.tables)
            .messages
            .iter()
            .filter(|m| m.inbox_id == inbox_id)
            .cloned()
            .collect()
    }

    pub fn message_by_source_id(&self, source_id: &str) -> Option<Message> {
        lock(&self.tables)
            .messages
            .iter()
            .find(|m| m.source_id == source_id)
            .cloned()
    }

    pub fn attachments(&self) -> Vec<Attachment> {
        lock(&self.tables).attachments.clone()
    }

    pub fn contacts(&self) -> Vec<Contact> {
        lock(&self.tables).contacts.clone()
    }

    pub fn conversations(&self) -> Vec<Conversation> {
        lock(&self.tables).conversations.clone()
    }
}

fn injected_failure(what: &str) -> DomainError {
    DomainError::DatabaseError(format!("injected {what} failure"))
}

#[async_trait]
impl ChannelRepository for MemoryStore {
    async fn find_by_phone_number(&self, phone_number: &str) -> RepoResult<Option<Channel>> {
        if take_failure(&self.failing_channel_lookups) {
            return Err(injected_failure("channel lookup"));
        }
        Ok(lock(&self.tables)
            .channels
            .iter()
            .find(|c| c.phone_number == phone_number)
            .cloned())
    }

    async fn find_gupshup_by_app_name(&self, app_name: &str) -> RepoResult<Option<Channel>> {
        if take_failure(&self.failing_channel_lookups) {
            return Err(injected_failure("channel lookup"));
        }
        Ok(lock(&self.tables)
            .channels
            .iter()
            .find(|c| c.provider == Provider::Gupshup && c.provider_config.app_name() == Some(app_name))
            .cloned())
    }

    async fn find_inbox(&self, channel_id: Snowflake) -> RepoResult<Option<Inbox>> {
        Ok(lock(&self.tables)
            .inboxes
            .iter()
            .find(|i| i.channel_id == channel_id)
            .cloned())
    }

    async fn account_status(&self, account_id: Snowflake) -> RepoResult<AccountStatus> {
        Ok(lock(&self.tables)
            .account_status
            .get(&account_id)
            .copied()
            .unwrap_or(AccountStatus::Suspended))
    }
}

#[async_trait]
impl ContactRepository for MemoryStore {
    async fn upsert(&self, new: &NewContact) -> RepoResult<ResolvedContact> {
        let mut tables = lock(&self.tables);

        let existing = tables
            .contact_inboxes
            .iter()
            .find(|ci| ci.inbox_id == new.inbox_id && ci.source_id == new.source_id)
            .cloned();
        if let Some(contact_inbox) = existing {
            let contact = tables
                .contacts
                .iter()
                .find(|c| c.id == contact_inbox.contact_id)
                .cloned()
                .ok_or_else(|| DomainError::DatabaseError("dangling contact inbox".into()))?;
            return Ok(ResolvedContact {
                contact,
                contact_inbox,
            });
        }

        let known = tables
            .contacts
            .iter()
            .find(|c| {
                c.account_id == new.account_id
                    && c.phone_number.as_deref() == Some(new.phone_number.as_str())
            })
            .cloned();
        let contact = if let Some(contact) = known {
            contact
        } else {
            let contact = Contact {
                id: self.ids.generate(),
                account_id: new.account_id,
                name: new.name.clone(),
                phone_number: Some(new.phone_number.clone()),
                created_at: Utc::now(),
            };
            tables.contacts.push(contact.clone());
            contact
        };

        let contact_inbox = ContactInbox {
            id: self.ids.generate(),
            contact_id: contact.id,
            inbox_id: new.inbox_id,
            source_id: new.source_id.clone(),
        };
        tables.contact_inboxes.push(contact_inbox.clone());

        Ok(ResolvedContact {
            contact,
            contact_inbox,
        })
    }
}

#[async_trait]
impl ConversationRepository for MemoryStore {
    async fn find_latest(
        &self,
        contact_inbox_id: Snowflake,
        filter: ConversationFilter,
    ) -> RepoResult<Option<Conversation>> {
        Ok(lock(&self.tables)
            .conversations
            .iter()
            .filter(|c| c.contact_inbox_id == contact_inbox_id)
            .filter(|c| filter == ConversationFilter::Any || !c.is_resolved())
            .max_by_key(|c| (c.created_at, c.id))
            .cloned())
    }

    async fn create(&self, conversation: &Conversation) -> RepoResult<()> {
        lock(&self.tables).conversations.push(conversation.clone());
        Ok(())
    }
}

#[async_trait]
impl MessageRepository for MemoryStore {
    async fn find_by_source_id(
        &self,
        inbox_id: Snowflake,
        source_id: &str,
    ) -> RepoResult<Option<Message>> {
        Ok(lock(&self.tables)
            .messages
            .iter()
            .find(|m| m.inbox_id == inbox_id && m.source_id == source_id)
            .cloned())
    }

    async fn create(&self, message: &Message) -> RepoResult<()> {
        if take_failure(&self.failing_message_writes) {
            return Err(injected_failure("message write"));
        }

        let mut tables = lock(&self.tables);
        if tables
            .messages
            .iter()
            .any(|m| m.inbox_id == message.inbox_id && m.source_id == message.source_id)
        {
            return Err(DomainError::DuplicateSourceId {
                inbox_id: message.inbox_id,
                source_id: message.source_id.clone(),
            });
        }
        tables.messages.push(message.clone());
        Ok(())
    }

    async fn update_status(
        &self,
        id: Snowflake,
        status: MessageStatus,
        external_error: Option<&str>,
    ) -> RepoResult<()> {
        let mut tables = lock(&self.tables);
        let message = tables
            .messages
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or_else(|| DomainError::MessageNotFound(id))?;
        message.apply_status(status, external_error.map(str::to_string));
        Ok(())
    }
}

#[async_trait]
impl AttachmentRepository for MemoryStore {
    async fn create(&self, attachment: &Attachment) -> RepoResult<()> {
        lock(&self.tables).attachments.push(attachment.clone());
        Ok(())
    }

    async fn find_by_message(&self, message_id: Snowflake) -> RepoResult<Vec<Attachment>> {
        Ok(lock(&self.tables)
            .attachments
            .iter()
            .filter(|a| a.message_id == message_id)
            .cloned()
            .collect())
    }
}
