//! Meta Cloud API envelope

use relay_core::{IncomingEvent, Provider};
use serde::Deserialize;
use tracing::debug;

use super::{BusinessValue, NormalizeContext};

#[derive(Debug, Clone, Deserialize)]
pub struct CloudEnvelope {
    #[serde(default)]
    pub object: Option<String>,
    #[serde(default)]
    pub entry: Vec<CloudEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CloudEntry {
    #[serde(default)]
    pub changes: Vec<CloudChange>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CloudChange {
    #[serde(default)]
    pub field: Option<String>,
    pub value: BusinessValue,
}

impl CloudEnvelope {
    pub fn values(&self) -> impl Iterator<Item = &BusinessValue> {
        self.entry
            .iter()
            .flat_map(|entry| entry.changes.iter())
            .map(|change| &change.value)
    }
}

pub(super) fn normalize(envelope: &CloudEnvelope, ctx: NormalizeContext<'_>) -> Vec<IncomingEvent> {
    envelope
        .values()
        .filter(|value| {
            // A business account may batch values for several numbers
            match (ctx.phone_number_id, value.metadata_ids().1) {
                (Some(expected), Some(actual)) if expected != actual => {
                    debug!(expected, actual, "Skipping value addressed to another phone number id");
                    false
                }
                _ => true,
            }
        })
        .flat_map(|value| value.events(Provider::Cloud))
        .collect()
}
