//! PostgreSQL implementation of VoteRepository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, instrument};

use contest_core::entities::{Entry, NewVote};
use contest_core::error::DomainError;
use contest_core::traits::{RepoResult, VoteRecord, VoteRepository};
use contest_core::value_objects::{ContestId, UserId};

use crate::models::EntryModel;

use super::error::{map_db_error, map_out_of_range};

/// PostgreSQL implementation of VoteRepository
#[derive(Clone)]
pub struct PgVoteRepository {
    pool: PgPool,
}

impl PgVoteRepository {
    /// Create a new PgVoteRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VoteRepository for PgVoteRepository {
    #[instrument(skip(self, vote), fields(contest_id = %vote.contest_id, entry_id = %vote.entry_id, voter_id = %vote.voter_id))]
    async fn record(&self, vote: &NewVote) -> RepoResult<VoteRecord> {
        let weight = vote.kind.weight(vote.exchange_ratio)?;
        let stars = vote.kind.stars();

        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        if vote.claims_guard {
            let guard = sqlx::query(
                r"
                INSERT INTO vote_guards (contest_id, voter_id)
                VALUES ($1, $2)
                ON CONFLICT (contest_id, voter_id) DO NOTHING
                ",
            )
            .bind(vote.contest_id.into_inner())
            .bind(vote.voter_id.into_inner())
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?;

            if guard.rows_affected() == 0 && vote.enforce_single {
                debug!("Voter already holds the contest guard");
                return Ok(VoteRecord::AlreadyVoted);
            }
        }

        let updated = sqlx::query_as::<_, EntryModel>(
            r"
            UPDATE entries e
            SET votes = e.votes + $3, stars_received = e.stars_received + $4
            FROM contests c
            WHERE e.id = $1 AND e.contest_id = $2 AND c.id = e.contest_id AND c.closed_at IS NULL
            RETURNING e.id, e.contest_id, e.user_id, e.code, e.display_name, e.votes,
                      e.stars_received, e.score, e.created_at
            ",
        )
        .bind(vote.entry_id.into_inner())
        .bind(vote.contest_id.into_inner())
        .bind(weight)
        .bind(stars)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_out_of_range(e, || DomainError::VoteWeightOverflow { stars }))?;

        let Some(entry) = updated else {
            let exists: bool = sqlx::query_scalar(
                "SELECT EXISTS (SELECT 1 FROM entries WHERE id = $1 AND contest_id = $2)",
            )
            .bind(vote.entry_id.into_inner())
            .bind(vote.contest_id.into_inner())
            .fetch_one(&mut *tx)
            .await
            .map_err(map_db_error)?;

            return Err(if exists {
                DomainError::ContestClosed
            } else {
                DomainError::EntryNotFound
            });
        };

        sqlx::query(
            r"
            INSERT INTO votes (contest_id, entry_id, voter_id, stars, weight)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(vote.contest_id.into_inner())
        .bind(vote.entry_id.into_inner())
        .bind(vote.voter_id.into_inner())
        .bind(stars)
        .bind(weight)
        .execute(&mut *tx)
        .await
        .map_err(map_db_error)?;

        tx.commit().await.map_err(map_db_error)?;

        Ok(VoteRecord::Recorded(Entry::from(entry)))
    }

    #[instrument(skip(self))]
    async fn has_voted_for(
        &self,
        contest_id: ContestId,
        entry_code: &str,
        voter_id: UserId,
    ) -> RepoResult<bool> {
        sqlx::query_scalar(
            r"
            SELECT EXISTS (
                SELECT 1
                FROM votes v
                JOIN entries e ON e.id = v.entry_id
                WHERE v.contest_id = $1 AND e.code = $2 AND v.voter_id = $3
            )
            ",
        )
        .bind(contest_id.into_inner())
        .bind(entry_code)
        .bind(voter_id.into_inner())
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)
    }
}
