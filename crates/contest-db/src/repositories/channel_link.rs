//! PostgreSQL implementation of ChannelLinkRepository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use contest_core::entities::ChannelLink;
use contest_core::error::DomainError;
use contest_core::traits::{ChannelLinkRepository, RepoResult};
use contest_core::value_objects::{ChatId, UserId};

use crate::models::ChannelLinkModel;

use super::error::{map_db_error, map_foreign_key_violation};

/// PostgreSQL implementation of ChannelLinkRepository
#[derive(Clone)]
pub struct PgChannelLinkRepository {
    pool: PgPool,
}

impl PgChannelLinkRepository {
    /// Create a new PgChannelLinkRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChannelLinkRepository for PgChannelLinkRepository {
    #[instrument(skip(self))]
    async fn find(&self, owner_id: UserId, chat_id: ChatId) -> RepoResult<Option<ChannelLink>> {
        let result = sqlx::query_as::<_, ChannelLinkModel>(
            r"
            SELECT owner_id, chat_id, title, created_at
            FROM channel_links
            WHERE owner_id = $1 AND chat_id = $2
            ",
        )
        .bind(owner_id.into_inner())
        .bind(chat_id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(ChannelLink::from))
    }

    #[instrument(skip(self))]
    async fn list_by_owner(&self, owner_id: UserId) -> RepoResult<Vec<ChannelLink>> {
        let results = sqlx::query_as::<_, ChannelLinkModel>(
            r"
            SELECT owner_id, chat_id, title, created_at
            FROM channel_links
            WHERE owner_id = $1
            ORDER BY created_at
            ",
        )
        .bind(owner_id.into_inner())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(results.into_iter().map(ChannelLink::from).collect())
    }

    #[instrument(skip(self, link), fields(owner_id = %link.owner_id, chat_id = %link.chat_id))]
    async fn upsert(&self, link: &ChannelLink) -> RepoResult<()> {
        sqlx::query(
            r"
            INSERT INTO channel_links (owner_id, chat_id, title, created_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (owner_id, chat_id) DO UPDATE SET title = EXCLUDED.title
            ",
        )
        .bind(link.owner_id.into_inner())
        .bind(link.chat_id.into_inner())
        .bind(&link.title)
        .bind(link.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_foreign_key_violation(e, || DomainError::UserNotFound(link.owner_id)))?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete(&self, owner_id: UserId, chat_id: ChatId) -> RepoResult<bool> {
        let result = sqlx::query(
            r"
            DELETE FROM channel_links
            WHERE owner_id = $1 AND chat_id = $2
            ",
        )
        .bind(owner_id.into_inner())
        .bind(chat_id.into_inner())
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.rows_affected() > 0)
    }
}
