use relay_core::{MessageStatus, Snowflake};
use serde::Serialize;

/// Why an event produced no write
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum DropReason {
    /// No channel matched the payload
    ChannelNotFound,
    /// Channel needs reauthorization or its account is not active
    ChannelInactive,
    /// Reaction, ephemeral or unknown message type
    Unprocessable(String),
    /// Provider reported the inbound message as an error
    ProviderErrorEvent,
    /// Sender phone missing or without digits
    MissingSender,
    /// Another delivery of the same message holds the claim
    InFlight,
    /// Message already stored
    Duplicate,
    /// Status for a message this inbox never stored
    UnknownMessage,
    InvalidStatus(String),
    /// Store failed on a path that does not fail the job
    StoreUnavailable,
}

/// Result of one normalized event
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum EventOutcome {
    MessageCreated {
        source_id: String,
        /// More than one for multi-card contact shares
        message_ids: Vec<Snowflake>,
        attachments: usize,
    },
    StatusUpdated {
        source_id: String,
        status: MessageStatus,
    },
    ContactResolved {
        source_id: String,
        contact_id: Snowflake,
    },
    Dropped {
        source_id: String,
        #[serde(flatten)]
        reason: DropReason,
    },
}

impl EventOutcome {
    pub fn dropped(source_id: impl Into<String>, reason: DropReason) -> Self {
        Self::Dropped {
            source_id: source_id.into(),
            reason,
        }
    }

    pub fn is_dropped(&self) -> bool {
        matches!(self, Self::Dropped { .. })
    }
}

/// Everything one job did
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    /// Resolved channel, absent when the job was skipped before resolution
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<Snowflake>,
    /// Set when the whole job was dropped
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped: Option<DropReason>,
    pub outcomes: Vec<EventOutcome>,
}

impl IngestReport {
    pub fn skipped(reason: DropReason) -> Self {
        Self {
            skipped: Some(reason),
            ..Self::default()
        }
    }

    pub fn for_channel(channel_id: Snowflake) -> Self {
        Self {
            channel_id: Some(channel_id),
            ..Self::default()
        }
    }

    /// IDs of every message this job created
    pub fn created_message_ids(&self) -> impl Iterator<Item = Snowflake> + '_ {
        self.outcomes
            .iter()
            .filter_map(|outcome| match outcome {
                EventOutcome::MessageCreated { message_ids, .. } => Some(message_ids),
                _ => None,
            })
            .flatten()
            .copied()
    }
}
