//! Channel entity - a configured WhatsApp number and its inbox

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::Snowflake;

/// Messaging provider behind a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    /// Meta WhatsApp Cloud API
    #[serde(rename = "whatsapp_cloud", alias = "cloud")]
    Cloud,
    /// Gupshup WhatsApp API
    Gupshup,
    /// 360dialog on-premise style API
    #[default]
    Default,
}

impl Provider {
    /// Stored string form
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cloud => "whatsapp_cloud",
            Self::Gupshup => "gupshup",
            Self::Default => "default",
        }
    }
}

impl From<&str> for Provider {
    fn from(value: &str) -> Self {
        match value {
            "whatsapp_cloud" | "cloud" => Self::Cloud,
            "gupshup" => Self::Gupshup,
            _ => Self::Default,
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque provider settings (API keys, app ids, verification tokens)
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProviderConfig(BTreeMap<String, String>);

impl ProviderConfig {
    pub const API_KEY: &'static str = "api_key";
    pub const APP_NAME: &'static str = "app_name";
    pub const APP_ID: &'static str = "app_id";
    pub const PHONE_NUMBER_ID: &'static str = "phone_number_id";
    pub const SOURCE: &'static str = "source";
    pub const WEBHOOK_VERIFY_TOKEN: &'static str = "webhook_verify_token";

    #[must_use]
    pub fn new(entries: BTreeMap<String, String>) -> Self {
        Self(entries)
    }

    /// Look up a key, treating blank values as absent
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }

    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn api_key(&self) -> Option<&str> {
        self.get(Self::API_KEY)
    }

    pub fn phone_number_id(&self) -> Option<&str> {
        self.get(Self::PHONE_NUMBER_ID)
    }

    pub fn app_name(&self) -> Option<&str> {
        self.get(Self::APP_NAME)
    }

    pub fn entries(&self) -> &BTreeMap<String, String> {
        &self.0
    }
}

/// Channel entity
#[derive(Debug, Clone, PartialEq)]
pub struct Channel {
    pub id: Snowflake,
    pub account_id: Snowflake,
    pub provider: Provider,
    /// E.164 with leading `+`, unique across channels
    pub phone_number: String,
    pub provider_config: ProviderConfig,
    pub reauthorization_required: bool,
    /// Template cache, maintained by the template sync path
    pub message_templates: Option<serde_json::Value>,
    pub message_templates_last_updated: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Channel {
    /// Create a new channel
    #[must_use]
    pub fn new(
        id: Snowflake,
        account_id: Snowflake,
        provider: Provider,
        phone_number: String,
        provider_config: ProviderConfig,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            account_id,
            provider,
            phone_number,
            provider_config,
            reauthorization_required: false,
            message_templates: None,
            message_templates_last_updated: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the payload's phone-number-id belongs to this channel
    pub fn matches_phone_number_id(&self, phone_number_id: &str) -> bool {
        self.provider_config.phone_number_id() == Some(phone_number_id)
    }
}

/// Inbox entity (1:1 with a channel)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inbox {
    pub id: Snowflake,
    pub account_id: Snowflake,
    pub channel_id: Snowflake,
    pub name: String,
    /// Route all traffic from one contact into one persistent conversation
    pub lock_to_single_conversation: bool,
}

/// Owning account state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    #[default]
    Active,
    Suspended,
}

impl AccountStatus {
    #[inline]
    pub fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }
}

impl From<&str> for AccountStatus {
    fn from(value: &str) -> Self {
        match value {
            "active" => Self::Active,
            _ => Self::Suspended,
        }
    }
}
