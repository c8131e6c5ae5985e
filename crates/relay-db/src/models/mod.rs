//! Database models - SQLx-compatible structs for PostgreSQL tables

mod channel;
mod contact;
mod conversation;
mod message;

pub use channel::{ChannelModel, InboxModel};
pub use contact::ResolvedContactModel;
pub use conversation::ConversationModel;
pub use message::{AttachmentModel, MessageModel};
