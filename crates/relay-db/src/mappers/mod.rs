//! Entity to model mappers
//!
//! - `From<Model> for Entity`: convert database rows to domain objects
//! - `*Insert` structs: prepare entity data for database writes

mod channel;
mod contact;
mod conversation;
mod message;

pub use channel::config_from_json;
pub use message::{AttachmentInsert, MessageInsert};
