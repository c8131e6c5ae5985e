//! WhatsApp Business value layout shared by Cloud and 360dialog.
//!
//! Cloud wraps this object in `entry[].changes[].value`; 360dialog posts it
//! at the top level.

use relay_core::{
    ContactCard, EventBody, GeoLocation, InboundMessage, IncomingEvent, MediaDescriptor,
    MediaSource, MessageContent, MessageSubtype, Provider, ProviderError, SenderIdentity,
    StatusReport,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::{f64_or_string, non_blank, opt_string_or_number, string_or_number};

/// `value` object of a business webhook
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BusinessValue {
    #[serde(default)]
    pub metadata: Option<Metadata>,
    #[serde(default)]
    pub contacts: Vec<WaContact>,
    /// Kept raw so one malformed item does not discard its siblings
    #[serde(default)]
    pub messages: Vec<Value>,
    #[serde(default)]
    pub statuses: Vec<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Metadata {
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub display_phone_number: Option<String>,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub phone_number_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaContact {
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub wa_id: Option<String>,
    #[serde(default)]
    pub profile: Option<WaProfile>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaProfile {
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WaMessage {
    #[serde(deserialize_with = "string_or_number")]
    id: String,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    from: Option<String>,
    #[serde(rename = "type", default)]
    kind: String,
    text: Option<WaText>,
    image: Option<WaMedia>,
    video: Option<WaMedia>,
    audio: Option<WaMedia>,
    voice: Option<WaMedia>,
    document: Option<WaMedia>,
    location: Option<WaLocation>,
    contacts: Option<Vec<WaContactCard>>,
    button: Option<WaButton>,
    interactive: Option<WaInteractive>,
    context: Option<WaContext>,
    #[serde(default)]
    errors: Vec<WaError>,
}

#[derive(Debug, Deserialize)]
struct WaText {
    body: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WaMedia {
    id: Option<String>,
    link: Option<String>,
    mime_type: Option<String>,
    caption: Option<String>,
    filename: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WaLocation {
    #[serde(deserialize_with = "f64_or_string")]
    latitude: f64,
    #[serde(deserialize_with = "f64_or_string")]
    longitude: f64,
    name: Option<String>,
    address: Option<String>,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WaContactCard {
    name: Option<WaCardName>,
    #[serde(default)]
    phones: Vec<WaCardPhone>,
}

#[derive(Debug, Deserialize)]
struct WaCardName {
    formatted_name: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WaCardPhone {
    #[serde(default, deserialize_with = "opt_string_or_number")]
    phone: Option<String>,
}

impl WaContactCard {
    pub(crate) fn into_card(self) -> ContactCard {
        let name = self.name.and_then(|name| {
            non_blank(name.formatted_name.as_deref()).or_else(|| {
                let joined = [name.first_name, name.last_name]
                    .into_iter()
                    .flatten()
                    .collect::<Vec<_>>()
                    .join(" ");
                non_blank(Some(&joined))
            })
        });
        ContactCard {
            name,
            phones: self
                .phones
                .into_iter()
                .filter_map(|p| non_blank(p.phone.as_deref()))
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct WaButton {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WaInteractive {
    button_reply: Option<WaReply>,
    list_reply: Option<WaReply>,
}

#[derive(Debug, Deserialize)]
struct WaReply {
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WaContext {
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WaError {
    #[serde(default, deserialize_with = "opt_string_or_number")]
    code: Option<String>,
    title: Option<String>,
    message: Option<String>,
}

impl From<WaError> for ProviderError {
    fn from(e: WaError) -> Self {
        Self {
            code: e.code.unwrap_or_default(),
            title: e.title.or(e.message).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct WaStatus {
    #[serde(deserialize_with = "string_or_number")]
    id: String,
    status: String,
    #[serde(default)]
    errors: Vec<WaError>,
}

fn subtype(kind: &str) -> MessageSubtype {
    match kind {
        "text" => MessageSubtype::Text,
        "image" => MessageSubtype::Image,
        "document" => MessageSubtype::Document,
        "video" => MessageSubtype::Video,
        "audio" | "voice" => MessageSubtype::Audio,
        "location" => MessageSubtype::Location,
        "contacts" => MessageSubtype::Contacts,
        "button" => MessageSubtype::Button,
        "interactive" => MessageSubtype::Interactive,
        "reaction" => MessageSubtype::Reaction,
        other => MessageSubtype::Unsupported(other.to_string()),
    }
}

fn media(media: WaMedia) -> MessageContent {
    let source = match (non_blank(media.id.as_deref()), non_blank(media.link.as_deref())) {
        (Some(id), _) => MediaSource::MediaId(id),
        (None, Some(link)) => MediaSource::Url(link),
        (None, None) => return MessageContent::Empty,
    };
    MessageContent::Media(MediaDescriptor {
        source,
        content_type: non_blank(media.mime_type.as_deref()),
        caption: non_blank(media.caption.as_deref()),
        filename: non_blank(media.filename.as_deref()),
    })
}

impl WaMessage {
    fn content(&mut self, subtype: &MessageSubtype) -> MessageContent {
        let text = |t: Option<String>| {
            non_blank(t.as_deref()).map_or(MessageContent::Empty, MessageContent::Text)
        };

        match subtype {
            MessageSubtype::Text => text(self.text.take().and_then(|t| t.body)),
            MessageSubtype::Button => text(self.button.take().and_then(|b| b.text)),
            MessageSubtype::Interactive => text(self.interactive.take().and_then(|i| {
                i.button_reply.or(i.list_reply).and_then(|reply| reply.title)
            })),
            MessageSubtype::Image => self.image.take().map_or(MessageContent::Empty, media),
            MessageSubtype::Video => self.video.take().map_or(MessageContent::Empty, media),
            MessageSubtype::Document => self.document.take().map_or(MessageContent::Empty, media),
            MessageSubtype::Audio => self
                .audio
                .take()
                .or_else(|| self.voice.take())
                .map_or(MessageContent::Empty, media),
            MessageSubtype::Location => self.location.take().map_or(MessageContent::Empty, |l| {
                MessageContent::Location(GeoLocation {
                    latitude: l.latitude,
                    longitude: l.longitude,
                    name: non_blank(l.name.as_deref()),
                    address: non_blank(l.address.as_deref()),
                    url: non_blank(l.url.as_deref()),
                })
            }),
            MessageSubtype::Contacts => MessageContent::Contacts(
                self.contacts
                    .take()
                    .unwrap_or_default()
                    .into_iter()
                    .map(WaContactCard::into_card)
                    .collect(),
            ),
            MessageSubtype::Reaction | MessageSubtype::Unsupported(_) => MessageContent::Empty,
        }
    }
}

impl BusinessValue {
    /// Display name the webhook reported for `wa_id`, else the first contact's
    fn profile_name(&self, wa_id: Option<&str>) -> Option<String> {
        let matching = wa_id.and_then(|id| {
            self.contacts
                .iter()
                .find(|c| c.wa_id.as_deref() == Some(id))
        });
        matching
            .or_else(|| self.contacts.first())
            .and_then(|c| c.profile.as_ref())
            .and_then(|p| non_blank(p.name.as_deref()))
    }

    fn first_wa_id(&self) -> Option<String> {
        self.contacts.iter().find_map(|c| non_blank(c.wa_id.as_deref()))
    }

    /// Emit `message`, `status`, then `contact_card` events for this value
    pub fn events(&self, provider: Provider) -> Vec<IncomingEvent> {
        let mut events = Vec::with_capacity(self.messages.len() + self.statuses.len());

        for raw in &self.messages {
            match WaMessage::deserialize(raw) {
                Ok(message) => events.push(self.message_event(provider, message, raw)),
                Err(e) => warn!(provider = %provider, error = %e, "Skipping malformed message entry"),
            }
        }

        for raw in &self.statuses {
            match WaStatus::deserialize(raw) {
                Ok(status) => events.push(IncomingEvent {
                    provider,
                    source_id: status.id,
                    sender: None,
                    body: EventBody::Status(StatusReport {
                        status: status.status,
                        errors: status.errors.into_iter().map(ProviderError::from).collect(),
                    }),
                    raw: raw.clone(),
                }),
                Err(e) => warn!(provider = %provider, error = %e, "Skipping malformed status entry"),
            }
        }

        // Contact-only values announce a contact without any message
        if self.messages.is_empty() && self.statuses.is_empty() {
            for contact in &self.contacts {
                let Some(wa_id) = non_blank(contact.wa_id.as_deref()) else {
                    debug!("Contact entry without wa_id ignored");
                    continue;
                };
                events.push(IncomingEvent {
                    provider,
                    source_id: wa_id.clone(),
                    sender: Some(SenderIdentity {
                        phone: wa_id,
                        name: contact.profile.as_ref().and_then(|p| non_blank(p.name.as_deref())),
                    }),
                    body: EventBody::ContactCard,
                    raw: serde_json::to_value(contact).unwrap_or(Value::Null),
                });
            }
        }

        events
    }

    fn message_event(&self, provider: Provider, mut message: WaMessage, raw: &Value) -> IncomingEvent {
        let subtype = subtype(&message.kind);
        let content = message.content(&subtype);
        let phone = non_blank(message.from.as_deref()).or_else(|| self.first_wa_id());
        let name = self.profile_name(phone.as_deref());

        IncomingEvent {
            provider,
            source_id: message.id,
            sender: phone.map(|phone| SenderIdentity { phone, name }),
            body: EventBody::Message(InboundMessage {
                subtype,
                content,
                reply_to: message.context.and_then(|c| non_blank(c.id.as_deref())),
                errors: message.errors.into_iter().map(ProviderError::from).collect(),
            }),
            raw: raw.clone(),
        }
    }

    /// `(display_phone_number, phone_number_id)` when metadata is present
    pub fn metadata_ids(&self) -> (Option<&str>, Option<&str>) {
        self.metadata.as_ref().map_or((None, None), |m| {
            (m.display_phone_number.as_deref(), m.phone_number_id.as_deref())
        })
    }
}
