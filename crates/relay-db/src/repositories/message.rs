//! PostgreSQL implementation of MessageRepository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use relay_core::entities::{Message, MessageStatus};
use relay_core::error::DomainError;
use relay_core::traits::{MessageRepository, RepoResult};
use relay_core::value_objects::Snowflake;

use crate::mappers::MessageInsert;
use crate::models::MessageModel;

use super::error::{map_db_error, map_unique_violation, message_not_found};

/// PostgreSQL implementation of MessageRepository
#[derive(Clone)]
pub struct PgMessageRepository {
    pool: PgPool,
}

impl PgMessageRepository {
    /// Create a new PgMessageRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageRepository for PgMessageRepository {
    #[instrument(skip(self))]
    async fn find_by_source_id(
        &self,
        inbox_id: Snowflake,
        source_id: &str,
    ) -> RepoResult<Option<Message>> {
        let result = sqlx::query_as::<_, MessageModel>(
            r"
            SELECT id, account_id, inbox_id, conversation_id, sender_contact_id, direction,
                   content, source_id, in_reply_to_external_id, status, external_error, created_at
            FROM messages
            WHERE inbox_id = $1 AND source_id = $2
            ",
        )
        .bind(inbox_id.into_inner())
        .bind(source_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(Message::from))
    }

    #[instrument(skip(self, message), fields(message_id = %message.id, source_id = %message.source_id))]
    async fn create(&self, message: &Message) -> RepoResult<()> {
        let row = MessageInsert::new(message);
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        sqlx::query(
            r"
            INSERT INTO messages
                (id, account_id, inbox_id, conversation_id, sender_contact_id, direction,
                 content, source_id, in_reply_to_external_id, status, external_error, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ",
        )
        .bind(row.id)
        .bind(row.account_id)
        .bind(row.inbox_id)
        .bind(row.conversation_id)
        .bind(row.sender_contact_id)
        .bind(row.direction)
        .bind(row.content)
        .bind(row.source_id)
        .bind(row.in_reply_to_external_id)
        .bind(row.status)
        .bind(row.external_error)
        .bind(message.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            map_unique_violation(e, || DomainError::DuplicateSourceId {
                inbox_id: message.inbox_id,
                source_id: message.source_id.clone(),
            })
        })?;

        sqlx::query(
            r"
            UPDATE conversations
            SET last_activity_at = GREATEST(last_activity_at, $2)
            WHERE id = $1
            ",
        )
        .bind(row.conversation_id)
        .bind(message.created_at)
        .execute(&mut *tx)
        .await
        .map_err(map_db_error)?;

        tx.commit().await.map_err(map_db_error)?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn update_status(
        &self,
        id: Snowflake,
        status: MessageStatus,
        external_error: Option<&str>,
    ) -> RepoResult<()> {
        let result = sqlx::query(
            r"
            UPDATE messages
            SET status = $2, external_error = COALESCE($3, external_error)
            WHERE id = $1
            ",
        )
        .bind(id.into_inner())
        .bind(status.as_str())
        .bind(external_error)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(message_not_found(id));
        }

        Ok(())
    }
}
