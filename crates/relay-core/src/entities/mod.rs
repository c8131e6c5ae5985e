//! Domain entities - records the ingestion pipeline reads and writes

mod channel;
mod contact;
mod conversation;
mod message;

pub use channel::{AccountStatus, Channel, Inbox, Provider, ProviderConfig};
pub use contact::{Contact, ContactInbox, NewContact, ResolvedContact};
pub use conversation::{Conversation, ConversationStatus};
pub use message::{
    Attachment, AttachmentPayload, FileType, Message, MessageDirection, MessageStatus,
};
