//! PostgreSQL implementation of ConversationRepository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use relay_core::entities::Conversation;
use relay_core::traits::{ConversationFilter, ConversationRepository, RepoResult};
use relay_core::value_objects::Snowflake;

use crate::models::ConversationModel;

use super::error::map_db_error;

/// PostgreSQL implementation of ConversationRepository
#[derive(Clone)]
pub struct PgConversationRepository {
    pool: PgPool,
}

impl PgConversationRepository {
    /// Create a new PgConversationRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ConversationRepository for PgConversationRepository {
    #[instrument(skip(self))]
    async fn find_latest(
        &self,
        contact_inbox_id: Snowflake,
        filter: ConversationFilter,
    ) -> RepoResult<Option<Conversation>> {
        let result = match filter {
            ConversationFilter::Any => {
                sqlx::query_as::<_, ConversationModel>(
                    r"
                    SELECT id, account_id, inbox_id, contact_id, contact_inbox_id, status,
                           created_at, last_activity_at
                    FROM conversations
                    WHERE contact_inbox_id = $1
                    ORDER BY created_at DESC, id DESC
                    LIMIT 1
                    ",
                )
                .bind(contact_inbox_id.into_inner())
                .fetch_optional(&self.pool)
                .await
            }
            ConversationFilter::Unresolved => {
                sqlx::query_as::<_, ConversationModel>(
                    r"
                    SELECT id, account_id, inbox_id, contact_id, contact_inbox_id, status,
                           created_at, last_activity_at
                    FROM conversations
                    WHERE contact_inbox_id = $1 AND status <> 'resolved'
                    ORDER BY created_at DESC, id DESC
                    LIMIT 1
                    ",
                )
                .bind(contact_inbox_id.into_inner())
                .fetch_optional(&self.pool)
                .await
            }
        }
        .map_err(map_db_error)?;

        Ok(result.map(Conversation::from))
    }

    #[instrument(skip(self, conversation), fields(conversation_id = %conversation.id))]
    async fn create(&self, conversation: &Conversation) -> RepoResult<()> {
        sqlx::query(
            r"
            INSERT INTO conversations
                (id, account_id, inbox_id, contact_id, contact_inbox_id, status,
                 created_at, last_activity_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ",
        )
        .bind(conversation.id.into_inner())
        .bind(conversation.account_id.into_inner())
        .bind(conversation.inbox_id.into_inner())
        .bind(conversation.contact_id.into_inner())
        .bind(conversation.contact_inbox_id.into_inner())
        .bind(conversation.status.as_str())
        .bind(conversation.created_at)
        .bind(conversation.last_activity_at)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(())
    }
}
