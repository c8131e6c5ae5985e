//! Channel and inbox entity <-> model mapper

use std::collections::BTreeMap;

use relay_core::entities::{Channel, Inbox, Provider, ProviderConfig};
use relay_core::value_objects::Snowflake;

use crate::models::{ChannelModel, InboxModel};

/// Flatten the JSONB provider config into string entries.
///
/// Non-string scalars are kept in their JSON text form; nested values are
/// dropped since no provider credential is structured.
pub fn config_from_json(value: &serde_json::Value) -> ProviderConfig {
    let entries = value
        .as_object()
        .map(|object| {
            object
                .iter()
                .filter_map(|(key, value)| {
                    let text = match value {
                        serde_json::Value::String(s) => s.clone(),
                        serde_json::Value::Number(n) => n.to_string(),
                        serde_json::Value::Bool(b) => b.to_string(),
                        _ => return None,
                    };
                    Some((key.clone(), text))
                })
                .collect::<BTreeMap<_, _>>()
        })
        .unwrap_or_default();

    ProviderConfig::new(entries)
}

impl From<ChannelModel> for Channel {
    fn from(model: ChannelModel) -> Self {
        Channel {
            id: Snowflake::new(model.id),
            account_id: Snowflake::new(model.account_id),
            provider: Provider::from(model.provider.as_str()),
            phone_number: model.phone_number,
            provider_config: config_from_json(&model.provider_config.0),
            reauthorization_required: model.reauthorization_required,
            message_templates: model.message_templates.map(|json| json.0),
            message_templates_last_updated: model.message_templates_last_updated,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

impl From<InboxModel> for Inbox {
    fn from(model: InboxModel) -> Self {
        Inbox {
            id: Snowflake::new(model.id),
            account_id: Snowflake::new(model.account_id),
            channel_id: Snowflake::new(model.channel_id),
            name: model.name,
            lock_to_single_conversation: model.lock_to_single_conversation,
        }
    }
}
