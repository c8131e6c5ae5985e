//! Data Transfer Objects
//!
//! Job input handed over by the dispatcher and the report returned per job.

mod job;
mod report;

pub use job::WebhookJob;
pub use report::{DropReason, EventOutcome, IngestReport};
