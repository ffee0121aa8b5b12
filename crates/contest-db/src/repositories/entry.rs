//! PostgreSQL implementation of EntryRepository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, instrument, warn};

use contest_core::entities::{generate_entry_code, Entry, NewEntry};
use contest_core::error::DomainError;
use contest_core::traits::{EntryRepository, Insertion, RepoResult};
use contest_core::value_objects::{ContestId, EntryId, UserId};

use crate::models::EntryModel;

use super::error::{contest_not_found, map_db_error};

/// Attempts at finding a free entry code before giving up
const CODE_ATTEMPTS: usize = 5;

/// PostgreSQL implementation of EntryRepository
#[derive(Clone)]
pub struct PgEntryRepository {
    pool: PgPool,
}

impl PgEntryRepository {
    /// Create a new PgEntryRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Whether the contest exists and is finalized
    async fn contest_closed(&self, contest_id: ContestId) -> RepoResult<bool> {
        let closed: Option<bool> =
            sqlx::query_scalar("SELECT closed_at IS NOT NULL FROM contests WHERE id = $1")
                .bind(contest_id.into_inner())
                .fetch_optional(&self.pool)
                .await
                .map_err(map_db_error)?;

        closed.ok_or_else(|| contest_not_found(contest_id))
    }
}

#[async_trait]
impl EntryRepository for PgEntryRepository {
    #[instrument(skip(self))]
    async fn find(&self, contest_id: ContestId, user_id: UserId) -> RepoResult<Option<Entry>> {
        let result = sqlx::query_as::<_, EntryModel>(
            r"
            SELECT id, contest_id, user_id, code, display_name, votes, stars_received, score, created_at
            FROM entries
            WHERE contest_id = $1 AND user_id = $2
            ",
        )
        .bind(contest_id.into_inner())
        .bind(user_id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(Entry::from))
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: EntryId) -> RepoResult<Option<Entry>> {
        let result = sqlx::query_as::<_, EntryModel>(
            r"
            SELECT id, contest_id, user_id, code, display_name, votes, stars_received, score, created_at
            FROM entries
            WHERE id = $1
            ",
        )
        .bind(id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(Entry::from))
    }

    #[instrument(skip(self))]
    async fn find_by_code(&self, contest_id: ContestId, code: &str) -> RepoResult<Option<Entry>> {
        let result = sqlx::query_as::<_, EntryModel>(
            r"
            SELECT id, contest_id, user_id, code, display_name, votes, stars_received, score, created_at
            FROM entries
            WHERE contest_id = $1 AND code = $2
            ",
        )
        .bind(contest_id.into_inner())
        .bind(code)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(Entry::from))
    }

    #[instrument(skip(self))]
    async fn find_by_name(&self, contest_id: ContestId, name: &str) -> RepoResult<Option<Entry>> {
        let result = sqlx::query_as::<_, EntryModel>(
            r"
            SELECT id, contest_id, user_id, code, display_name, votes, stars_received, score, created_at
            FROM entries
            WHERE contest_id = $1 AND LOWER(display_name) = LOWER($2)
            ORDER BY id
            LIMIT 1
            ",
        )
        .bind(contest_id.into_inner())
        .bind(name.trim())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(Entry::from))
    }

    #[instrument(skip(self, entry), fields(contest_id = %entry.contest_id, user_id = %entry.user_id))]
    async fn join(&self, entry: &NewEntry) -> RepoResult<Insertion<Entry>> {
        let mut code = entry.code.clone();

        for _ in 0..CODE_ATTEMPTS {
            // The conflict target is left open so both the (contest, user) and the
            // (contest, code) uniqueness rules fall through to the lookup below.
            let inserted = sqlx::query_as::<_, EntryModel>(
                r"
                INSERT INTO entries (contest_id, user_id, code, display_name)
                SELECT $1, $2, $3, $4
                WHERE EXISTS (SELECT 1 FROM contests WHERE id = $1 AND closed_at IS NULL)
                ON CONFLICT DO NOTHING
                RETURNING id, contest_id, user_id, code, display_name, votes, stars_received, score, created_at
                ",
            )
            .bind(entry.contest_id.into_inner())
            .bind(entry.user_id.into_inner())
            .bind(&code)
            .bind(&entry.display_name)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error)?;

            if let Some(model) = inserted {
                return Ok(Insertion::Created(Entry::from(model)));
            }

            if let Some(existing) = self.find(entry.contest_id, entry.user_id).await? {
                return Ok(Insertion::Existing(existing));
            }

            if self.contest_closed(entry.contest_id).await? {
                return Err(DomainError::ContestClosed);
            }

            debug!(code = %code, "Entry code taken, retrying");
            code = generate_entry_code();
        }

        warn!("Could not allocate a free entry code");
        Err(DomainError::InternalError(
            "entry code allocation failed".to_string(),
        ))
    }

    #[instrument(skip(self))]
    async fn list_by_contest(&self, contest_id: ContestId) -> RepoResult<Vec<Entry>> {
        let results = sqlx::query_as::<_, EntryModel>(
            r"
            SELECT id, contest_id, user_id, code, display_name, votes, stars_received, score, created_at
            FROM entries
            WHERE contest_id = $1
            ORDER BY id
            ",
        )
        .bind(contest_id.into_inner())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(results.into_iter().map(Entry::from).collect())
    }

    #[instrument(skip(self))]
    async fn count(&self, contest_id: ContestId) -> RepoResult<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM entries WHERE contest_id = $1")
            .bind(contest_id.into_inner())
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_error)
    }

    #[instrument(skip(self))]
    async fn add_score(&self, id: EntryId, points: i64) -> RepoResult<Entry> {
        let updated = sqlx::query_as::<_, EntryModel>(
            r"
            UPDATE entries e
            SET score = e.score + $2
            FROM contests c
            WHERE e.id = $1 AND c.id = e.contest_id AND c.closed_at IS NULL
            RETURNING e.id, e.contest_id, e.user_id, e.code, e.display_name, e.votes,
                      e.stars_received, e.score, e.created_at
            ",
        )
        .bind(id.into_inner())
        .bind(points)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        match updated {
            Some(model) => Ok(Entry::from(model)),
            None if self.find_by_id(id).await?.is_some() => Err(DomainError::ContestClosed),
            None => Err(DomainError::EntryNotFound),
        }
    }

    #[instrument(skip(self))]
    async fn total_stars(&self, contest_id: ContestId) -> RepoResult<i64> {
        sqlx::query_scalar(
            "SELECT COALESCE(SUM(stars_received), 0)::BIGINT FROM entries WHERE contest_id = $1",
        )
        .bind(contest_id.into_inner())
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)
    }
}
