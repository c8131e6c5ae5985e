//! Canonical events - the provider-agnostic shape every adapter produces

mod incoming_event;

pub use incoming_event::{
    ContactCard, EventBody, EventKind, GeoLocation, InboundMessage, IncomingEvent,
    MediaDescriptor, MediaSource, MessageContent, MessageSubtype, ProviderError, SenderIdentity,
    StatusReport, ATTACHMENT_PLACEHOLDER,
};
