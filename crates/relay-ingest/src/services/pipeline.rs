//! Ingestion pipeline
//!
//! Entry point for one webhook job. Resolves the channel, normalizes the
//! payload with the channel's provider adapter and routes every event:
//!
//! ```text
//! message      -> filter -> claim -> durable lookup -> contact -> conversation
//!                 -> build messages + attachments -> persist -> release
//! status       -> StatusReconciler
//! contact_card -> contact upsert
//! ```
//!
//! The claim is taken before the durable lookup so two deliveries racing
//! through the lookup cannot both persist. The `(inbox_id, source_id)` unique
//! index catches anything that slips past an expired claim.

use relay_core::{
    Attachment, AttachmentPayload, ContactCard, DomainError, EventBody, FileType, InboundMessage,
    IncomingEvent, Message, MessageContent, NewContact, ATTACHMENT_PLACEHOLDER,
};
use tracing::{error, info, instrument, warn};

use super::channel_resolver::{ChannelResolution, ChannelResolver, ResolvedChannel};
use super::contact_resolver::{new_contact, ContactResolver};
use super::context::IngestContext;
use super::error::IngestResult;
use super::status::StatusReconciler;
use crate::adapters::{self, NormalizeContext};
use crate::dto::{DropReason, EventOutcome, IngestReport, WebhookJob};

/// Fallback title for a shared contact without phone numbers
pub const NO_PHONE_TITLE: &str = "Phone number is not available";

/// Source id of the `index`-th message created from one contacts event
fn card_source_id(source_id: &str, index: usize) -> String {
    if index == 0 {
        source_id.to_string()
    } else {
        format!("{source_id}:{index}")
    }
}

/// A message waiting to be written, with the attachments that go with it
struct PendingMessage {
    message: Message,
    attachments: Vec<Attachment>,
}

pub struct IngestPipeline<'a> {
    ctx: &'a IngestContext,
}

impl<'a> IngestPipeline<'a> {
    pub fn new(ctx: &'a IngestContext) -> Self {
        Self { ctx }
    }

    /// Process one webhook job.
    ///
    /// Drops are reported, not returned as errors. `Err` means a store or
    /// guard failure the dispatcher may retry; no claim is left behind.
    #[instrument(skip_all, fields(phone_number = ?job.phone_number))]
    pub async fn perform(&self, job: &WebhookJob) -> IngestResult<IngestReport> {
        let target = match ChannelResolver::new(self.ctx).resolve(job).await? {
            ChannelResolution::Active(target) => target,
            ChannelResolution::NotFound => {
                info!(reason = "channel_not_found", "Dropping webhook");
                return Ok(IngestReport::skipped(DropReason::ChannelNotFound));
            }
            ChannelResolution::Inactive(channel) => {
                info!(channel_id = %channel.id, reason = "channel_inactive", "Dropping webhook");
                return Ok(IngestReport::skipped(DropReason::ChannelInactive));
            }
        };

        let normalize_ctx = NormalizeContext {
            url_phone_number: job.phone_number.as_deref(),
            phone_number_id: target.channel.provider_config.phone_number_id(),
        };
        let events = adapters::normalize(target.channel.provider, &job.payload, normalize_ctx);

        let mut report = IngestReport::for_channel(target.channel.id);
        for event in &events {
            let outcome = match &event.body {
                EventBody::Message(message) => self.ingest_message(&target, event, message).await?,
                EventBody::Status(status) => {
                    StatusReconciler::new(self.ctx)
                        .reconcile(&target.inbox, &event.source_id, status)
                        .await
                }
                EventBody::ContactCard => self.resolve_contact_card(&target, event).await,
            };
            if let EventOutcome::Dropped { reason, .. } = &outcome {
                info!(source_id = %event.source_id, reason = ?reason, "Event dropped");
            }
            report.outcomes.push(outcome);
        }

        Ok(report)
    }

    #[instrument(skip_all, fields(channel_id = %target.channel.id, source_id = %event.source_id, subtype = message.subtype.as_str()))]
    async fn ingest_message(
        &self,
        target: &ResolvedChannel,
        event: &IncomingEvent,
        message: &InboundMessage,
    ) -> IngestResult<EventOutcome> {
        let source_id = event.source_id.as_str();

        if !message.subtype.is_processable() {
            return Ok(EventOutcome::dropped(
                source_id,
                DropReason::Unprocessable(message.subtype.as_str().to_string()),
            ));
        }
        if message.is_error_event() {
            let diagnostics: Vec<String> = message.errors.iter().map(|e| e.diagnostic()).collect();
            warn!(errors = ?diagnostics, "Provider reported an error event");
            return Ok(EventOutcome::dropped(source_id, DropReason::ProviderErrorEvent));
        }
        let Some(contact) = event
            .sender
            .as_ref()
            .and_then(|sender| new_contact(&target.inbox, sender))
        else {
            return Ok(EventOutcome::dropped(source_id, DropReason::MissingSender));
        };

        let guard = self.ctx.dedup_guard();
        let channel_id = target.channel.id;
        if !guard.try_claim(channel_id, source_id).await? {
            return Ok(EventOutcome::dropped(source_id, DropReason::InFlight));
        }

        let result = self.persist_message(target, event, message, &contact).await;

        // A stale claim only delays a redelivery until it expires
        if let Err(e) = guard.release(channel_id, source_id).await {
            warn!(error = %e, "Failed to release dedup claim");
        }

        if let Err(e) = &result {
            error!(error = %e, "Message persistence failed");
        }
        result
    }

    /// Everything between claim and release
    async fn persist_message(
        &self,
        target: &ResolvedChannel,
        event: &IncomingEvent,
        message: &InboundMessage,
        contact: &NewContact,
    ) -> IngestResult<EventOutcome> {
        let source_id = event.source_id.as_str();
        let inbox = &target.inbox;

        if self
            .ctx
            .message_repo()
            .find_by_source_id(inbox.id, source_id)
            .await?
            .is_some()
        {
            return Ok(EventOutcome::dropped(source_id, DropReason::Duplicate));
        }

        let resolver = ContactResolver::new(self.ctx);
        let contact = resolver.resolve_contact(contact).await?;
        let conversation = resolver.resolve_conversation(inbox, &contact).await?;

        let draft = |content: String, source_id: String| {
            Message::new_incoming(
                self.ctx.generate_id(),
                inbox.account_id,
                inbox.id,
                conversation.id,
                contact.contact.id,
                content,
                source_id,
            )
            .in_reply_to(message.reply_to.clone())
        };

        let pending = match &message.content {
            MessageContent::Contacts(cards) if !cards.is_empty() => cards
                .iter()
                .enumerate()
                .map(|(index, card)| {
                    let content = card
                        .name
                        .clone()
                        .unwrap_or_else(|| ATTACHMENT_PLACEHOLDER.to_string());
                    let message = draft(content, card_source_id(source_id, index));
                    let attachments = self.card_attachments(&message, card);
                    PendingMessage { message, attachments }
                })
                .collect(),
            _ => {
                let message_record = draft(message.content_or_placeholder(), source_id.to_string());
                let attachments = self.attachments(target, &message_record, message).await;
                vec![PendingMessage {
                    message: message_record,
                    attachments,
                }]
            }
        };

        self.write(source_id, pending).await
    }

    /// Persist messages in order; the first write decides whether this event
    /// is a duplicate.
    async fn write(&self, source_id: &str, pending: Vec<PendingMessage>) -> IngestResult<EventOutcome> {
        let mut message_ids = Vec::with_capacity(pending.len());
        let mut attachment_count = 0;

        for (index, PendingMessage { message, attachments }) in pending.into_iter().enumerate() {
            match self.ctx.message_repo().create(&message).await {
                Ok(()) => {}
                Err(DomainError::DuplicateSourceId { .. }) if index == 0 => {
                    return Ok(EventOutcome::dropped(source_id, DropReason::Duplicate));
                }
                Err(DomainError::DuplicateSourceId { source_id: card_id, .. }) => {
                    info!(card_source_id = %card_id, "Contact card message already stored");
                    continue;
                }
                Err(e) => return Err(e.into()),
            }
            message_ids.push(message.id);

            for attachment in attachments {
                match self.ctx.attachment_repo().create(&attachment).await {
                    Ok(()) => attachment_count += 1,
                    Err(e) => {
                        error!(message_id = %message.id, error = %e, "Attachment write failed, keeping message");
                    }
                }
            }
            info!(message_id = %message.id, conversation_id = %message.conversation_id, "Message created");
        }

        Ok(EventOutcome::MessageCreated {
            source_id: source_id.to_string(),
            message_ids,
            attachments: attachment_count,
        })
    }

    /// One `contact` attachment per phone on the card
    fn card_attachments(&self, message: &Message, card: &ContactCard) -> Vec<Attachment> {
        let titles: Vec<&str> = if card.phones.is_empty() {
            vec![NO_PHONE_TITLE]
        } else {
            card.phones.iter().map(String::as_str).collect()
        };

        titles
            .into_iter()
            .map(|title| {
                Attachment::new(
                    self.ctx.generate_id(),
                    message,
                    FileType::Contact,
                    AttachmentPayload::Fallback {
                        title: title.to_string(),
                    },
                )
            })
            .collect()
    }

    /// Location or downloaded media for a single-message event
    async fn attachments(
        &self,
        target: &ResolvedChannel,
        record: &Message,
        message: &InboundMessage,
    ) -> Vec<Attachment> {
        match &message.content {
            MessageContent::Location(location) => vec![Attachment::new(
                self.ctx.generate_id(),
                record,
                FileType::Location,
                AttachmentPayload::Location {
                    latitude: location.latitude,
                    longitude: location.longitude,
                    title: location.label(),
                    external_url: location.url.clone(),
                },
            )],
            MessageContent::Media(media) if !message.subtype.skips_media_fetch() => {
                let Some(fetched) = self.ctx.fetcher().fetch(&target.channel, media).await else {
                    return Vec::new();
                };
                vec![Attachment::new(
                    self.ctx.generate_id(),
                    record,
                    message.subtype.file_type(),
                    AttachmentPayload::File {
                        filename: fetched.filename,
                        content_type: fetched.content_type,
                        data: fetched.data,
                    },
                )]
            }
            _ => Vec::new(),
        }
    }

    /// `contact_card` events only make sure the contact exists
    async fn resolve_contact_card(&self, target: &ResolvedChannel, event: &IncomingEvent) -> EventOutcome {
        let Some(contact) = event
            .sender
            .as_ref()
            .and_then(|sender| new_contact(&target.inbox, sender))
        else {
            return EventOutcome::dropped(&event.source_id, DropReason::MissingSender);
        };

        match ContactResolver::new(self.ctx).resolve_contact(&contact).await {
            Ok(resolved) => EventOutcome::ContactResolved {
                source_id: event.source_id.clone(),
                contact_id: resolved.contact.id,
            },
            Err(e) => {
                error!(source_id = %event.source_id, error = %e, "Contact upsert failed");
                EventOutcome::dropped(&event.source_id, DropReason::StoreUnavailable)
            }
        }
    }
}
