//! Gupshup webhook envelope
//!
//! Gupshup posts one event per delivery as `{app, type, payload}`. Inbound
//! messages arrive as `type = "message"` and delivery reports as
//! `type = "message-event"`; everything else (`user-event`, billing) is
//! ignored.

use relay_core::{
    ContactCard, EventBody, GeoLocation, InboundMessage, IncomingEvent, MediaDescriptor,
    MediaSource, MessageContent, MessageSubtype, Provider, ProviderError, SenderIdentity,
    StatusReport,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::business::WaContactCard;
use super::{f64_or_string, non_blank, opt_string_or_number, NormalizeContext};

/// Delivery states that are forwarded as status events
const REPORTED_STATUSES: [&str; 4] = ["sent", "delivered", "read", "failed"];

#[derive(Debug, Clone, Deserialize)]
pub struct GupshupEnvelope {
    #[serde(default)]
    pub app: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub payload: Value,
}

#[derive(Debug, Deserialize)]
struct InboundPayload {
    #[serde(default, deserialize_with = "opt_string_or_number")]
    id: Option<String>,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    source: Option<String>,
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    payload: Value,
    sender: Option<Sender>,
    context: Option<Context>,
}

#[derive(Debug, Deserialize)]
struct Sender {
    #[serde(default, deserialize_with = "opt_string_or_number")]
    phone: Option<String>,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Context {
    id: Option<String>,
    #[serde(rename = "gsId")]
    gs_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Media {
    url: Option<String>,
    caption: Option<String>,
    #[serde(rename = "contentType")]
    content_type: Option<String>,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Location {
    #[serde(deserialize_with = "f64_or_string")]
    latitude: f64,
    #[serde(deserialize_with = "f64_or_string")]
    longitude: f64,
    name: Option<String>,
    address: Option<String>,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Cards {
    #[serde(default)]
    contacts: Vec<WaContactCard>,
}

#[derive(Debug, Deserialize)]
struct Reply {
    title: Option<String>,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Text {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DeliveryEvent {
    #[serde(default, deserialize_with = "opt_string_or_number")]
    id: Option<String>,
    #[serde(rename = "gsId", default)]
    gs_id: Option<String>,
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    payload: Value,
}

#[derive(Debug, Deserialize)]
struct Failure {
    #[serde(default, deserialize_with = "opt_string_or_number")]
    code: Option<String>,
    reason: Option<String>,
}

fn subtype(kind: &str) -> MessageSubtype {
    match kind {
        "text" => MessageSubtype::Text,
        "image" => MessageSubtype::Image,
        "file" => MessageSubtype::Document,
        "video" => MessageSubtype::Video,
        "audio" => MessageSubtype::Audio,
        "location" => MessageSubtype::Location,
        "contact" => MessageSubtype::Contacts,
        "button_reply" | "quick_reply" => MessageSubtype::Button,
        "list_reply" => MessageSubtype::Interactive,
        "reaction" => MessageSubtype::Reaction,
        other => MessageSubtype::Unsupported(other.to_string()),
    }
}

fn content(subtype: &MessageSubtype, payload: &Value) -> Result<MessageContent, serde_json::Error> {
    let text = |t: Option<String>| {
        non_blank(t.as_deref()).map_or(MessageContent::Empty, MessageContent::Text)
    };

    Ok(match subtype {
        MessageSubtype::Text => text(Text::deserialize(payload)?.text),
        MessageSubtype::Button | MessageSubtype::Interactive => {
            let reply = Reply::deserialize(payload)?;
            text(reply.title.or(reply.text))
        }
        MessageSubtype::Image
        | MessageSubtype::Document
        | MessageSubtype::Video
        | MessageSubtype::Audio => {
            let media = Media::deserialize(payload)?;
            match non_blank(media.url.as_deref()) {
                Some(url) => MessageContent::Media(MediaDescriptor {
                    source: MediaSource::Url(url),
                    content_type: non_blank(media.content_type.as_deref()),
                    caption: non_blank(media.caption.as_deref()),
                    filename: non_blank(media.name.as_deref()),
                }),
                None => MessageContent::Empty,
            }
        }
        MessageSubtype::Location => {
            let location = Location::deserialize(payload)?;
            MessageContent::Location(GeoLocation {
                latitude: location.latitude,
                longitude: location.longitude,
                name: non_blank(location.name.as_deref()),
                address: non_blank(location.address.as_deref()),
                url: non_blank(location.url.as_deref()),
            })
        }
        MessageSubtype::Contacts => MessageContent::Contacts(
            Cards::deserialize(payload)?
                .contacts
                .into_iter()
                .map(WaContactCard::into_card)
                .collect::<Vec<ContactCard>>(),
        ),
        MessageSubtype::Reaction | MessageSubtype::Unsupported(_) => MessageContent::Empty,
    })
}

fn message_event(payload: &Value, ctx: NormalizeContext<'_>) -> Option<IncomingEvent> {
    let inbound = match InboundPayload::deserialize(payload) {
        Ok(inbound) => inbound,
        Err(e) => {
            warn!(error = %e, "Skipping malformed Gupshup message");
            return None;
        }
    };
    let Some(source_id) = non_blank(inbound.id.as_deref()) else {
        warn!("Gupshup message without id");
        return None;
    };

    let subtype = subtype(&inbound.kind);
    let content = match content(&subtype, &inbound.payload) {
        Ok(content) => content,
        Err(e) => {
            warn!(source_id = %source_id, error = %e, "Skipping Gupshup message with malformed content");
            return None;
        }
    };

    let (sender_phone, sender_name) = inbound
        .sender
        .map_or((None, None), |sender| (sender.phone, sender.name));
    let phone = non_blank(inbound.source.as_deref())
        .or_else(|| non_blank(sender_phone.as_deref()))
        .or_else(|| non_blank(ctx.url_phone_number));
    let reply_to = inbound
        .context
        .and_then(|c| non_blank(c.id.as_deref()).or_else(|| non_blank(c.gs_id.as_deref())));

    Some(IncomingEvent {
        provider: Provider::Gupshup,
        source_id,
        sender: phone.map(|phone| SenderIdentity {
            phone,
            name: non_blank(sender_name.as_deref()),
        }),
        body: EventBody::Message(InboundMessage {
            subtype,
            content,
            reply_to,
            errors: Vec::new(),
        }),
        raw: payload.clone(),
    })
}

fn status_event(payload: &Value) -> Option<IncomingEvent> {
    let event = match DeliveryEvent::deserialize(payload) {
        Ok(event) => event,
        Err(e) => {
            warn!(error = %e, "Skipping malformed Gupshup message-event");
            return None;
        }
    };
    if !REPORTED_STATUSES.contains(&event.kind.as_str()) {
        debug!(status = %event.kind, "Ignoring Gupshup message-event");
        return None;
    }
    let Some(source_id) = non_blank(event.id.as_deref()).or_else(|| non_blank(event.gs_id.as_deref()))
    else {
        warn!(status = %event.kind, "Gupshup message-event without id");
        return None;
    };

    let errors = match Failure::deserialize(&event.payload) {
        Ok(failure) if event.kind == "failed" => vec![ProviderError {
            code: failure.code.unwrap_or_default(),
            title: failure.reason.unwrap_or_default(),
        }],
        _ => Vec::new(),
    };

    Some(IncomingEvent {
        provider: Provider::Gupshup,
        source_id,
        sender: None,
        body: EventBody::Status(StatusReport {
            status: event.kind,
            errors,
        }),
        raw: payload.clone(),
    })
}

pub(super) fn normalize(envelope: &GupshupEnvelope, ctx: NormalizeContext<'_>) -> Vec<IncomingEvent> {
    let event = match envelope.kind.as_str() {
        "message" => message_event(&envelope.payload, ctx),
        "message-event" => status_event(&envelope.payload),
        other => {
            debug!(app = ?envelope.app, kind = other, "Ignoring Gupshup envelope");
            None
        }
    };
    event.into_iter().collect()
}
