//! PostgreSQL implementation of AttachmentRepository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use relay_core::entities::Attachment;
use relay_core::traits::{AttachmentRepository, RepoResult};
use relay_core::value_objects::Snowflake;

use crate::mappers::AttachmentInsert;
use crate::models::AttachmentModel;

use super::error::map_db_error;

/// PostgreSQL implementation of AttachmentRepository
#[derive(Clone)]
pub struct PgAttachmentRepository {
    pool: PgPool,
}

impl PgAttachmentRepository {
    /// Create a new PgAttachmentRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AttachmentRepository for PgAttachmentRepository {
    #[instrument(skip(self, attachment), fields(attachment_id = %attachment.id, bytes = attachment.byte_len()))]
    async fn create(&self, attachment: &Attachment) -> RepoResult<()> {
        let row = AttachmentInsert::new(attachment);

        sqlx::query(
            r"
            INSERT INTO attachments
                (id, message_id, account_id, file_type, filename, content_type, data,
                 latitude, longitude, fallback_title, external_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ",
        )
        .bind(row.id)
        .bind(row.message_id)
        .bind(row.account_id)
        .bind(row.file_type)
        .bind(row.filename)
        .bind(row.content_type)
        .bind(row.data)
        .bind(row.latitude)
        .bind(row.longitude)
        .bind(row.fallback_title)
        .bind(row.external_url)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn find_by_message(&self, message_id: Snowflake) -> RepoResult<Vec<Attachment>> {
        let results = sqlx::query_as::<_, AttachmentModel>(
            r"
            SELECT id, message_id, account_id, file_type, filename, content_type, data,
                   latitude, longitude, fallback_title, external_url, created_at
            FROM attachments
            WHERE message_id = $1
            ORDER BY id
            ",
        )
        .bind(message_id.into_inner())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(results.into_iter().map(Attachment::from).collect())
    }
}
