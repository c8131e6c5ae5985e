//! Webhook payload fixtures
//!
//! Builders for the three wire formats, shaped after real provider
//! deliveries.

use serde_json::{json, Value};

/// Cloud channel under test
pub const CLOUD_PHONE: &str = "+15550001";
pub const CLOUD_DISPLAY_PHONE: &str = "15550001";
pub const CLOUD_PHONE_NUMBER_ID: &str = "pn-1";

/// Gupshup channel under test
pub const GUPSHUP_PHONE: &str = "+918000000001";
pub const GUPSHUP_APP: &str = "DemoApp";

/// 360dialog channel under test
pub const DIALOG_PHONE: &str = "+15550003";

/// Customer writing in
pub const CUSTOMER_WA_ID: &str = "15550002";
pub const CUSTOMER_NAME: &str = "Alice";

// ============================================================================
// Business-account values (Cloud and 360dialog)
// ============================================================================

pub fn metadata(display_phone_number: &str, phone_number_id: &str) -> Value {
    json!({"display_phone_number": display_phone_number, "phone_number_id": phone_number_id})
}

pub fn customer() -> Value {
    json!({"profile": {"name": CUSTOMER_NAME}, "wa_id": CUSTOMER_WA_ID})
}

pub fn text_message(id: &str, body: &str) -> Value {
    json!({
        "from": CUSTOMER_WA_ID,
        "id": id,
        "timestamp": "1700000000",
        "type": "text",
        "text": {"body": body}
    })
}

pub fn image_message(id: &str, media_id: &str, caption: &str) -> Value {
    json!({
        "from": CUSTOMER_WA_ID,
        "id": id,
        "type": "image",
        "image": {"id": media_id, "mime_type": "image/jpeg", "caption": caption}
    })
}

pub fn reaction_message(id: &str, target: &str) -> Value {
    json!({
        "from": CUSTOMER_WA_ID,
        "id": id,
        "type": "reaction",
        "reaction": {"message_id": target, "emoji": "\u{1F44D}"}
    })
}

/// A contacts message sharing `cards` (`(formatted_name, phones)`)
pub fn contacts_message(id: &str, cards: &[(&str, &[&str])]) -> Value {
    let contacts: Vec<Value> = cards
        .iter()
        .map(|(name, phones)| {
            let phones: Vec<Value> = phones
                .iter()
                .map(|phone| json!({"phone": phone, "type": "CELL"}))
                .collect();
            json!({"name": {"formatted_name": name}, "phones": phones})
        })
        .collect();
    json!({"from": CUSTOMER_WA_ID, "id": id, "type": "contacts", "contacts": contacts})
}

pub fn error_message(id: &str) -> Value {
    json!({
        "from": CUSTOMER_WA_ID,
        "id": id,
        "type": "text",
        "text": {"body": ""},
        "errors": [{"code": 131026, "title": "Message undeliverable"}]
    })
}

pub fn status(id: &str, status: &str) -> Value {
    json!({"id": id, "status": status, "timestamp": "1700000100", "recipient_id": CUSTOMER_WA_ID})
}

pub fn failed_status(id: &str, code: u32, title: &str) -> Value {
    json!({
        "id": id,
        "status": "failed",
        "recipient_id": CUSTOMER_WA_ID,
        "errors": [{"code": code, "title": title}]
    })
}

/// One Cloud `value` addressed to the cloud channel
pub fn cloud_value(messages: Vec<Value>, statuses: Vec<Value>) -> Value {
    cloud_value_for(CLOUD_PHONE_NUMBER_ID, messages, statuses)
}

pub fn cloud_value_for(phone_number_id: &str, messages: Vec<Value>, statuses: Vec<Value>) -> Value {
    json!({
        "messaging_product": "whatsapp",
        "metadata": metadata(CLOUD_DISPLAY_PHONE, phone_number_id),
        "contacts": [customer()],
        "messages": messages,
        "statuses": statuses
    })
}

/// `whatsapp_business_account` envelope around `values`
pub fn cloud_envelope(values: Vec<Value>) -> Value {
    let changes: Vec<Value> = values
        .into_iter()
        .map(|value| json!({"field": "messages", "value": value}))
        .collect();
    json!({
        "object": "whatsapp_business_account",
        "entry": [{"id": "WABA-1", "changes": changes}]
    })
}

pub fn cloud_text(id: &str, body: &str) -> Value {
    cloud_envelope(vec![cloud_value(vec![text_message(id, body)], vec![])])
}

pub fn cloud_status(id: &str, status_name: &str) -> Value {
    cloud_envelope(vec![cloud_value(vec![], vec![status(id, status_name)])])
}

/// 360dialog posts the bare value, routed by the URL phone number
pub fn dialog_value(messages: Vec<Value>, contacts: Vec<Value>) -> Value {
    json!({"contacts": contacts, "messages": messages})
}

// ============================================================================
// Gupshup
// ============================================================================

pub fn gupshup_message(id: &str, kind: &str, payload: Value) -> Value {
    json!({
        "app": GUPSHUP_APP,
        "timestamp": 1_700_000_000_000_i64,
        "version": 2,
        "type": "message",
        "payload": {
            "id": id,
            "source": "918123456789",
            "type": kind,
            "payload": payload,
            "sender": {"phone": "918123456789", "name": "Smit", "country_code": "91", "dial_code": "8123456789"}
        }
    })
}

pub fn gupshup_event(id: &str, status: &str, payload: Value) -> Value {
    json!({
        "app": GUPSHUP_APP,
        "timestamp": 1_700_000_000_500_i64,
        "version": 2,
        "type": "message-event",
        "payload": {
            "id": id,
            "gsId": format!("gs-{id}"),
            "type": status,
            "destination": "918123456789",
            "payload": payload
        }
    })
}
