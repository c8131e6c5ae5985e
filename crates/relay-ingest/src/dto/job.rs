use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::services::PayloadShape;

/// One webhook delivery as enqueued by the HTTP front door
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookJob {
    /// Shape detected at the front door; detected from `payload` when absent
    #[serde(default)]
    pub shape: Option<PayloadShape>,
    pub payload: Value,
    /// Phone number from the webhook URL path (`/webhooks/whatsapp/{phone}`)
    #[serde(default)]
    pub phone_number: Option<String>,
}

impl WebhookJob {
    pub fn new(payload: Value) -> Self {
        Self {
            shape: None,
            payload,
            phone_number: None,
        }
    }

    #[must_use]
    pub fn with_phone_number(mut self, phone_number: impl Into<String>) -> Self {
        self.phone_number = Some(phone_number.into());
        self
    }

    /// Explicit shape, or the one detected from the payload
    pub fn shape(&self) -> PayloadShape {
        self.shape.unwrap_or_else(|| PayloadShape::detect(&self.payload))
    }
}
