//! PostgreSQL implementation of ChannelRepository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use relay_core::entities::{AccountStatus, Channel, Inbox};
use relay_core::traits::{ChannelRepository, RepoResult};
use relay_core::value_objects::Snowflake;

use crate::models::{ChannelModel, InboxModel};

use super::error::map_db_error;

const CHANNEL_COLUMNS: &str = "id, account_id, provider, phone_number, provider_config, \
     reauthorization_required, message_templates, message_templates_last_updated, \
     created_at, updated_at";

/// PostgreSQL implementation of ChannelRepository
#[derive(Clone)]
pub struct PgChannelRepository {
    pool: PgPool,
}

impl PgChannelRepository {
    /// Create a new PgChannelRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChannelRepository for PgChannelRepository {
    #[instrument(skip(self))]
    async fn find_by_phone_number(&self, phone_number: &str) -> RepoResult<Option<Channel>> {
        let result = sqlx::query_as::<_, ChannelModel>(&format!(
            "SELECT {CHANNEL_COLUMNS} FROM channels WHERE phone_number = $1"
        ))
        .bind(phone_number)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(Channel::from))
    }

    #[instrument(skip(self))]
    async fn find_gupshup_by_app_name(&self, app_name: &str) -> RepoResult<Option<Channel>> {
        // Unique partial index idx_channels_gupshup_app_name covers this lookup
        let result = sqlx::query_as::<_, ChannelModel>(&format!(
            "SELECT {CHANNEL_COLUMNS} FROM channels \
             WHERE provider = 'gupshup' AND provider_config ->> 'app_name' = $1"
        ))
        .bind(app_name)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(Channel::from))
    }

    #[instrument(skip(self))]
    async fn find_inbox(&self, channel_id: Snowflake) -> RepoResult<Option<Inbox>> {
        let result = sqlx::query_as::<_, InboxModel>(
            r"
            SELECT id, account_id, channel_id, name, lock_to_single_conversation
            FROM inboxes
            WHERE channel_id = $1
            ",
        )
        .bind(channel_id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(Inbox::from))
    }

    #[instrument(skip(self))]
    async fn account_status(&self, account_id: Snowflake) -> RepoResult<AccountStatus> {
        let status: Option<String> =
            sqlx::query_scalar("SELECT status FROM accounts WHERE id = $1")
                .bind(account_id.into_inner())
                .fetch_optional(&self.pool)
                .await
                .map_err(map_db_error)?;

        // A missing account never receives traffic
        Ok(status.map_or(AccountStatus::Suspended, |s| AccountStatus::from(s.as_str())))
    }
}
