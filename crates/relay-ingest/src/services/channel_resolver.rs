//! Channel resolution
//!
//! Decides which channel (and therefore which provider adapter and inbox) a
//! raw delivery belongs to. Three payload shapes exist:
//!
//! - **Gupshup**: `{app, type, payload: {id, ...}}`, matched on the channel's
//!   configured `app_name`
//! - **BusinessAccount**: Meta's `whatsapp_business_account` envelope, matched
//!   on `"+" + display_phone_number` and then confirmed by `phone_number_id`
//! - **Direct**: anything else, matched on the phone number in the webhook URL

use relay_core::{normalize_phone_digits, Channel, Inbox};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, instrument};

use super::context::IngestContext;
use super::error::IngestResult;
use crate::dto::WebhookJob;

const BUSINESS_ACCOUNT_OBJECT: &str = "whatsapp_business_account";

/// Webhook layout family, decided before any channel lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadShape {
    Gupshup,
    BusinessAccount,
    Direct,
}

impl PayloadShape {
    pub fn detect(payload: &Value) -> Self {
        if payload
            .get("payload")
            .and_then(Value::as_object)
            .is_some_and(|inner| inner.contains_key("id"))
        {
            Self::Gupshup
        } else if payload.get("object").and_then(Value::as_str) == Some(BUSINESS_ACCOUNT_OBJECT) {
            Self::BusinessAccount
        } else {
            Self::Direct
        }
    }
}

/// A channel that may receive traffic, with its inbox
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedChannel {
    pub channel: Channel,
    pub inbox: Inbox,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChannelResolution {
    Active(ResolvedChannel),
    NotFound,
    /// Found, but reauthorization is pending or the account is not active
    Inactive(Channel),
}

/// Business-account routing fields from `entry[0].changes[0].value.metadata`
fn business_metadata(payload: &Value) -> Option<(String, String)> {
    let metadata = payload.pointer("/entry/0/changes/0/value/metadata")?;
    let scalar = |key: &str| match metadata.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    };
    Some((scalar("display_phone_number")?, scalar("phone_number_id")?))
}

/// Channel resolver
pub struct ChannelResolver<'a> {
    ctx: &'a IngestContext,
}

impl<'a> ChannelResolver<'a> {
    pub fn new(ctx: &'a IngestContext) -> Self {
        Self { ctx }
    }

    #[instrument(skip_all, fields(shape = ?job.shape()))]
    pub async fn resolve(&self, job: &WebhookJob) -> IngestResult<ChannelResolution> {
        let channel = match job.shape() {
            PayloadShape::Gupshup => self.by_app_name(&job.payload).await?,
            PayloadShape::BusinessAccount => self.by_business_metadata(&job.payload).await?,
            PayloadShape::Direct => self.by_url_phone(job.phone_number.as_deref()).await?,
        };
        let Some(channel) = channel else {
            return Ok(ChannelResolution::NotFound);
        };

        if channel.reauthorization_required {
            info!(channel_id = %channel.id, "Channel requires reauthorization");
            return Ok(ChannelResolution::Inactive(channel));
        }
        if !self
            .ctx
            .channel_repo()
            .account_status(channel.account_id)
            .await?
            .is_active()
        {
            info!(channel_id = %channel.id, account_id = %channel.account_id, "Account is not active");
            return Ok(ChannelResolution::Inactive(channel));
        }

        match self.ctx.channel_repo().find_inbox(channel.id).await? {
            Some(inbox) => Ok(ChannelResolution::Active(ResolvedChannel { channel, inbox })),
            None => {
                info!(channel_id = %channel.id, "Channel has no inbox");
                Ok(ChannelResolution::NotFound)
            }
        }
    }

    async fn by_app_name(&self, payload: &Value) -> IngestResult<Option<Channel>> {
        let Some(app) = payload
            .get("app")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|app| !app.is_empty())
        else {
            debug!("Gupshup payload without app name");
            return Ok(None);
        };
        Ok(self.ctx.channel_repo().find_gupshup_by_app_name(app).await?)
    }

    async fn by_business_metadata(&self, payload: &Value) -> IngestResult<Option<Channel>> {
        let Some((display_phone, phone_number_id)) = business_metadata(payload) else {
            debug!("Business account payload without metadata");
            return Ok(None);
        };
        let phone_number = format!("+{}", display_phone.trim_start_matches('+'));

        let channel = self
            .ctx
            .channel_repo()
            .find_by_phone_number(&phone_number)
            .await?;

        // Same display number, different Meta number id: not this channel
        Ok(channel.filter(|channel| {
            let matches = channel.matches_phone_number_id(&phone_number_id);
            if !matches {
                info!(
                    channel_id = %channel.id,
                    phone_number_id = %phone_number_id,
                    "Rejecting channel with mismatched phone_number_id"
                );
            }
            matches
        }))
    }

    async fn by_url_phone(&self, phone_number: Option<&str>) -> IngestResult<Option<Channel>> {
        let Some(digits) = phone_number.and_then(normalize_phone_digits) else {
            debug!("Direct payload without a usable URL phone number");
            return Ok(None);
        };
        Ok(self
            .ctx
            .channel_repo()
            .find_by_phone_number(&format!("+{digits}"))
            .await?)
    }
}
