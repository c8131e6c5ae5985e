//! Ingestion services
//!
//! Channel resolution, contact/conversation resolution, status
//! reconciliation and the pipeline that orchestrates them.

pub mod channel_resolver;
pub mod contact_resolver;
pub mod context;
pub mod error;
pub mod pipeline;
pub mod status;

pub use channel_resolver::{ChannelResolution, ChannelResolver, PayloadShape, ResolvedChannel};
pub use contact_resolver::{new_contact, ContactResolver};
pub use context::{IngestContext, IngestContextBuilder};
pub use error::{IngestError, IngestResult};
pub use pipeline::{IngestPipeline, NO_PHONE_TITLE};
pub use status::StatusReconciler;
