//! 360dialog posts the business value without the Cloud envelope

use relay_core::{IncomingEvent, Provider};

use super::BusinessValue;

pub(super) fn normalize(value: &BusinessValue) -> Vec<IncomingEvent> {
    value.events(Provider::Default)
}
