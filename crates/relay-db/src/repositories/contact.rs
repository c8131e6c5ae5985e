//! PostgreSQL implementation of ContactRepository

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{debug, instrument};

use relay_core::entities::{NewContact, ResolvedContact};
use relay_core::error::DomainError;
use relay_core::traits::{ContactRepository, RepoResult};
use relay_core::value_objects::SnowflakeGenerator;

use crate::models::ResolvedContactModel;

use super::error::map_db_error;

const SELECT_RESOLVED: &str = r"
    SELECT ci.id AS contact_inbox_id, ci.inbox_id, ci.source_id,
           c.id AS contact_id, c.account_id, c.name, c.phone_number, c.created_at
    FROM contact_inboxes ci
    JOIN contacts c ON c.id = ci.contact_id
    WHERE ci.inbox_id = $1 AND ci.source_id = $2
";

/// PostgreSQL implementation of ContactRepository
#[derive(Clone)]
pub struct PgContactRepository {
    pool: PgPool,
    ids: Arc<SnowflakeGenerator>,
}

impl PgContactRepository {
    /// Create a new PgContactRepository
    pub fn new(pool: PgPool, ids: Arc<SnowflakeGenerator>) -> Self {
        Self { pool, ids }
    }

    async fn find_resolved(&self, contact: &NewContact) -> RepoResult<Option<ResolvedContact>> {
        let result = sqlx::query_as::<_, ResolvedContactModel>(SELECT_RESOLVED)
            .bind(contact.inbox_id.into_inner())
            .bind(&contact.source_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error)?;

        Ok(result.map(ResolvedContact::from))
    }

    /// Reuse an account contact with the same phone, otherwise insert one
    async fn contact_id_for(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        contact: &NewContact,
    ) -> RepoResult<i64> {
        let existing: Option<i64> = sqlx::query_scalar(
            r"
            SELECT id FROM contacts
            WHERE account_id = $1 AND phone_number = $2
            ORDER BY id
            LIMIT 1
            ",
        )
        .bind(contact.account_id.into_inner())
        .bind(&contact.phone_number)
        .fetch_optional(&mut **tx)
        .await
        .map_err(map_db_error)?;

        if let Some(id) = existing {
            return Ok(id);
        }

        let id = self.ids.generate().into_inner();
        sqlx::query(
            r"
            INSERT INTO contacts (id, account_id, name, phone_number)
            VALUES ($1, $2, $3, $4)
            ",
        )
        .bind(id)
        .bind(contact.account_id.into_inner())
        .bind(&contact.name)
        .bind(&contact.phone_number)
        .execute(&mut **tx)
        .await
        .map_err(map_db_error)?;

        Ok(id)
    }
}

#[async_trait]
impl ContactRepository for PgContactRepository {
    #[instrument(skip(self, contact), fields(inbox_id = %contact.inbox_id, source_id = %contact.source_id))]
    async fn upsert(&self, contact: &NewContact) -> RepoResult<ResolvedContact> {
        if let Some(resolved) = self.find_resolved(contact).await? {
            return Ok(resolved);
        }

        let mut tx = self.pool.begin().await.map_err(map_db_error)?;
        let contact_id = self.contact_id_for(&mut tx, contact).await?;

        let inserted = sqlx::query(
            r"
            INSERT INTO contact_inboxes (id, contact_id, inbox_id, source_id)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (inbox_id, source_id) DO NOTHING
            ",
        )
        .bind(self.ids.generate().into_inner())
        .bind(contact_id)
        .bind(contact.inbox_id.into_inner())
        .bind(&contact.source_id)
        .execute(&mut *tx)
        .await
        .map_err(map_db_error)?;

        if inserted.rows_affected() == 0 {
            // A concurrent delivery created the identity first; use theirs
            tx.rollback().await.map_err(map_db_error)?;
            debug!("Contact inbox created concurrently, re-reading");
        } else {
            tx.commit().await.map_err(map_db_error)?;
        }

        self.find_resolved(contact).await?.ok_or_else(|| {
            DomainError::DatabaseError(format!(
                "contact inbox {} vanished after upsert",
                contact.source_id
            ))
        })
    }
}
