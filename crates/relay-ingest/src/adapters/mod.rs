//! Provider adapters
//!
//! Each provider posts its own webhook layout. Adapters turn one raw delivery
//! into zero or more canonical [`IncomingEvent`]s; nothing downstream looks at
//! the raw layout again.

mod business;
mod cloud;
mod dialog;
mod gupshup;

use relay_core::{IncomingEvent, Provider};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::warn;

pub use business::BusinessValue;
pub use cloud::CloudEnvelope;
pub use gupshup::GupshupEnvelope;

/// Per-delivery facts an adapter may need besides the payload itself
#[derive(Debug, Clone, Copy, Default)]
pub struct NormalizeContext<'a> {
    /// Phone number from the webhook URL path, if the route carried one
    pub url_phone_number: Option<&'a str>,
    /// `phone_number_id` configured on the resolved channel
    pub phone_number_id: Option<&'a str>,
}

/// A raw delivery parsed into the provider's own structure
#[derive(Debug, Clone)]
pub enum ProviderPayload {
    Cloud(CloudEnvelope),
    Gupshup(GupshupEnvelope),
    Default(BusinessValue),
}

impl ProviderPayload {
    /// Parse `payload` with the adapter selected by `provider`
    pub fn parse(provider: Provider, payload: &Value) -> Result<Self, serde_json::Error> {
        Ok(match provider {
            Provider::Cloud => Self::Cloud(CloudEnvelope::deserialize(payload)?),
            Provider::Gupshup => Self::Gupshup(GupshupEnvelope::deserialize(payload)?),
            Provider::Default => Self::Default(BusinessValue::deserialize(payload)?),
        })
    }

    pub fn provider(&self) -> Provider {
        match self {
            Self::Cloud(_) => Provider::Cloud,
            Self::Gupshup(_) => Provider::Gupshup,
            Self::Default(_) => Provider::Default,
        }
    }

    pub fn normalize(&self, ctx: NormalizeContext<'_>) -> Vec<IncomingEvent> {
        match self {
            Self::Cloud(envelope) => cloud::normalize(envelope, ctx),
            Self::Gupshup(envelope) => gupshup::normalize(envelope, ctx),
            Self::Default(value) => dialog::normalize(value),
        }
    }
}

/// Parse and normalize in one step.
///
/// A payload that does not fit the provider's structure yields no events.
pub fn normalize(provider: Provider, payload: &Value, ctx: NormalizeContext<'_>) -> Vec<IncomingEvent> {
    match ProviderPayload::parse(provider, payload) {
        Ok(parsed) => parsed.normalize(ctx),
        Err(e) => {
            warn!(provider = %provider, error = %e, "Webhook payload does not match provider layout");
            Vec::new()
        }
    }
}

/// Providers are inconsistent about quoting numeric ids and error codes
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Str(String),
        Int(i64),
        Float(f64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Str(s) => s,
        Raw::Int(i) => i.to_string(),
        Raw::Float(f) => f.to_string(),
    })
}

/// Optional variant of [`string_or_number`]
pub(crate) fn opt_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Wrapped(#[serde(deserialize_with = "string_or_number")] String);

    Ok(Option::<Wrapped>::deserialize(deserializer)?.map(|Wrapped(s)| s))
}

/// Coordinates arrive as JSON numbers from Meta and as strings from Gupshup
pub(crate) fn f64_or_string<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(f64),
        Str(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Num(n) => Ok(n),
        Raw::Str(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

/// Trimmed, non-empty text
pub(crate) fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
