//! Delivery status reconciliation
//!
//! Status webhooks only ever update messages this inbox already stored.
//! They can arrive before the message itself; those are dropped.

use std::str::FromStr;

use relay_core::{Inbox, MessageStatus, ProviderError, StatusReport};
use tracing::{error, info, instrument, warn};

use super::context::IngestContext;
use crate::dto::{DropReason, EventOutcome};

/// `"{code}: {title}"` of the first error, only for failed deliveries
fn external_error(status: MessageStatus, report: &StatusReport) -> Option<String> {
    match status {
        MessageStatus::Failed => report.errors.first().map(ProviderError::diagnostic),
        _ => None,
    }
}

pub struct StatusReconciler<'a> {
    ctx: &'a IngestContext,
}

impl<'a> StatusReconciler<'a> {
    pub fn new(ctx: &'a IngestContext) -> Self {
        Self { ctx }
    }

    /// Apply one status event. Never fails the job.
    #[instrument(skip(self, inbox, report), fields(inbox_id = %inbox.id, status = %report.status))]
    pub async fn reconcile(&self, inbox: &Inbox, source_id: &str, report: &StatusReport) -> EventOutcome {
        let messages = self.ctx.message_repo();

        let message = match messages.find_by_source_id(inbox.id, source_id).await {
            Ok(Some(message)) => message,
            Ok(None) => {
                info!("Status for unknown message");
                return EventOutcome::dropped(source_id, DropReason::UnknownMessage);
            }
            Err(e) => {
                error!(error = %e, "Message lookup failed for status update");
                return EventOutcome::dropped(source_id, DropReason::StoreUnavailable);
            }
        };

        let status = match MessageStatus::from_str(&report.status) {
            Ok(status) => status,
            Err(e) => {
                warn!(error = %e, "Ignoring unrecognized status");
                return EventOutcome::dropped(source_id, DropReason::InvalidStatus(report.status.clone()));
            }
        };

        let external_error = external_error(status, report);
        if let Err(e) = messages
            .update_status(message.id, status, external_error.as_deref())
            .await
        {
            error!(message_id = %message.id, error = %e, "Status update failed");
            return EventOutcome::dropped(source_id, DropReason::StoreUnavailable);
        }

        info!(message_id = %message.id, "Message status updated");
        EventOutcome::StatusUpdated {
            source_id: source_id.to_string(),
            status,
        }
    }
}
