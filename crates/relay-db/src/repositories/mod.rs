//! Repository implementations
//!
//! PostgreSQL implementations of the store traits defined in relay-core.

mod attachment;
mod channel;
mod contact;
mod conversation;
mod error;
mod message;

pub use attachment::PgAttachmentRepository;
pub use channel::PgChannelRepository;
pub use contact::PgContactRepository;
pub use conversation::PgConversationRepository;
pub use message::PgMessageRepository;
