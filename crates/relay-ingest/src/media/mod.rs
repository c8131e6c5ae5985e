//! Media download for inbound attachments

mod fetcher;

pub use fetcher::{AttachmentFetcher, FetchError, FetchedMedia, HttpAttachmentFetcher};
