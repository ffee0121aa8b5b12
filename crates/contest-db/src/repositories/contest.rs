//! PostgreSQL implementation of ContestRepository and GateRepository

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::{info, instrument};

use contest_core::entities::{Contest, Gate, GateSpec, NewContest, Winner};
use contest_core::error::DomainError;
use contest_core::traits::{ContestRepository, GateRepository, RepoResult};
use contest_core::value_objects::{ChatId, ContestId, MessageId, UserId};

use crate::models::{ContestModel, GateModel, WinnerModel};

use super::error::{contest_not_found, map_db_error, map_unique_violation};

/// PostgreSQL implementation of ContestRepository
#[derive(Clone)]
pub struct PgContestRepository {
    pool: PgPool,
}

impl PgContestRepository {
    /// Create a new PgContestRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ContestRepository for PgContestRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: ContestId) -> RepoResult<Option<Contest>> {
        let result = sqlx::query_as::<_, ContestModel>(
            r"
            SELECT id, owner_id, channel_id, group_id, message_id, code, kind, settings, text,
                   winner_count, flags, is_open, created_at, closed_at
            FROM contests
            WHERE id = $1
            ",
        )
        .bind(id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(Contest::from))
    }

    #[instrument(skip(self))]
    async fn find_by_code(&self, code: &str) -> RepoResult<Option<Contest>> {
        let result = sqlx::query_as::<_, ContestModel>(
            r"
            SELECT id, owner_id, channel_id, group_id, message_id, code, kind, settings, text,
                   winner_count, flags, is_open, created_at, closed_at
            FROM contests
            WHERE code = $1
            ",
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(Contest::from))
    }

    #[instrument(skip(self))]
    async fn list_by_owner(&self, owner_id: UserId) -> RepoResult<Vec<Contest>> {
        let results = sqlx::query_as::<_, ContestModel>(
            r"
            SELECT id, owner_id, channel_id, group_id, message_id, code, kind, settings, text,
                   winner_count, flags, is_open, created_at, closed_at
            FROM contests
            WHERE owner_id = $1
            ORDER BY created_at DESC
            ",
        )
        .bind(owner_id.into_inner())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(results.into_iter().map(Contest::from).collect())
    }

    #[instrument(skip(self))]
    async fn list_by_chat(&self, chat_id: ChatId) -> RepoResult<Vec<Contest>> {
        let results = sqlx::query_as::<_, ContestModel>(
            r"
            SELECT id, owner_id, channel_id, group_id, message_id, code, kind, settings, text,
                   winner_count, flags, is_open, created_at, closed_at
            FROM contests
            WHERE channel_id = $1 OR group_id = $1
            ORDER BY created_at DESC
            ",
        )
        .bind(chat_id.into_inner())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(results.into_iter().map(Contest::from).collect())
    }

    #[instrument(skip(self, contest, gates), fields(owner_id = %contest.owner_id, kind = contest.kind.name()))]
    async fn create(&self, contest: &NewContest, gates: &[GateSpec]) -> RepoResult<Contest> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        let model = sqlx::query_as::<_, ContestModel>(
            r"
            INSERT INTO contests (owner_id, channel_id, group_id, code, kind, settings, text,
                                  winner_count, flags, is_open)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, TRUE)
            RETURNING id, owner_id, channel_id, group_id, message_id, code, kind, settings, text,
                      winner_count, flags, is_open, created_at, closed_at
            ",
        )
        .bind(contest.owner_id.into_inner())
        .bind(contest.channel_id.into_inner())
        .bind(contest.group_id.map(ChatId::into_inner))
        .bind(&contest.code)
        .bind(contest.kind.name())
        .bind(Json(&contest.kind))
        .bind(&contest.text)
        .bind(contest.winner_count as i32)
        .bind(contest.flags.to_i64())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_unique_violation(e, || DomainError::ContestCodeExists))?;

        for gate in gates {
            sqlx::query(
                r"
                INSERT INTO contest_gates (contest_id, kind, title, invite_link)
                VALUES ($1, $2, $3, $4)
                ",
            )
            .bind(model.id)
            .bind(Json(&gate.kind))
            .bind(&gate.title)
            .bind(gate.invite_link.as_deref())
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?;
        }

        tx.commit().await.map_err(map_db_error)?;

        Ok(Contest::from(model))
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: ContestId) -> RepoResult<()> {
        sqlx::query("DELETE FROM contests WHERE id = $1")
            .bind(id.into_inner())
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn set_message_id(&self, id: ContestId, message_id: MessageId) -> RepoResult<()> {
        let result = sqlx::query("UPDATE contests SET message_id = $2 WHERE id = $1")
            .bind(id.into_inner())
            .bind(message_id.into_inner())
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(contest_not_found(id));
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn set_open(&self, id: ContestId, is_open: bool) -> RepoResult<bool> {
        let result = sqlx::query(
            r"
            UPDATE contests
            SET is_open = $2
            WHERE id = $1 AND closed_at IS NULL
            ",
        )
        .bind(id.into_inner())
        .bind(is_open)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.rows_affected() == 1)
    }

    #[instrument(skip(self, winners), fields(winners = winners.len()))]
    async fn finalize(&self, id: ContestId, winners: &[Winner]) -> RepoResult<bool> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        let closed = sqlx::query(
            r"
            UPDATE contests
            SET closed_at = NOW(), is_open = FALSE
            WHERE id = $1 AND closed_at IS NULL
            ",
        )
        .bind(id.into_inner())
        .execute(&mut *tx)
        .await
        .map_err(map_db_error)?;

        if closed.rows_affected() == 0 {
            // Dropping the transaction rolls it back
            return Ok(false);
        }

        for winner in winners {
            sqlx::query(
                r"
                INSERT INTO contest_winners (contest_id, position, entry_id, user_id, display_name)
                VALUES ($1, $2, $3, $4, $5)
                ",
            )
            .bind(id.into_inner())
            .bind(winner.position as i32)
            .bind(winner.entry_id.into_inner())
            .bind(winner.user_id.into_inner())
            .bind(&winner.display_name)
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?;
        }

        tx.commit().await.map_err(map_db_error)?;

        info!(contest_id = %id, "Contest finalized");
        Ok(true)
    }

    #[instrument(skip(self))]
    async fn winners(&self, id: ContestId) -> RepoResult<Vec<Winner>> {
        let results = sqlx::query_as::<_, WinnerModel>(
            r"
            SELECT contest_id, position, entry_id, user_id, display_name
            FROM contest_winners
            WHERE contest_id = $1
            ORDER BY position
            ",
        )
        .bind(id.into_inner())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(results.into_iter().map(Winner::from).collect())
    }
}

/// PostgreSQL implementation of GateRepository
#[derive(Clone)]
pub struct PgGateRepository {
    pool: PgPool,
}

impl PgGateRepository {
    /// Create a new PgGateRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GateRepository for PgGateRepository {
    #[instrument(skip(self))]
    async fn list_by_contest(&self, contest_id: ContestId) -> RepoResult<Vec<Gate>> {
        let results = sqlx::query_as::<_, GateModel>(
            r"
            SELECT id, contest_id, kind, title, invite_link
            FROM contest_gates
            WHERE contest_id = $1
            ORDER BY id
            ",
        )
        .bind(contest_id.into_inner())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(results.into_iter().map(Gate::from).collect())
    }
}
