//! PostgreSQL implementation of DrawLockRepository
//!
//! One row per contest. Taking the lock is a single upsert that only
//! overwrites a row older than the stale threshold.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, instrument};

use contest_core::traits::{DrawLockRepository, RepoResult};
use contest_core::value_objects::ContestId;

use super::error::{contest_not_found, map_db_error, map_foreign_key_violation};

/// PostgreSQL implementation of DrawLockRepository
#[derive(Clone)]
pub struct PgDrawLockRepository {
    pool: PgPool,
}

impl PgDrawLockRepository {
    /// Create a new PgDrawLockRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DrawLockRepository for PgDrawLockRepository {
    #[instrument(skip(self))]
    async fn try_acquire(
        &self,
        contest_id: ContestId,
        holder: &str,
        stale_after: Duration,
    ) -> RepoResult<bool> {
        let stale_secs = i64::try_from(stale_after.as_secs()).unwrap_or(i64::MAX);

        let result = sqlx::query(
            r"
            INSERT INTO draw_locks (contest_id, holder, acquired_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (contest_id) DO UPDATE
            SET holder = EXCLUDED.holder, acquired_at = EXCLUDED.acquired_at
            WHERE draw_locks.acquired_at < NOW() - make_interval(secs => $3::DOUBLE PRECISION)
            ",
        )
        .bind(contest_id.into_inner())
        .bind(holder)
        .bind(stale_secs)
        .execute(&self.pool)
        .await
        .map_err(|e| map_foreign_key_violation(e, || contest_not_found(contest_id)))?;

        let acquired = result.rows_affected() == 1;
        debug!(acquired, "Draw lock attempt");
        Ok(acquired)
    }

    #[instrument(skip(self))]
    async fn release(&self, contest_id: ContestId, holder: &str) -> RepoResult<()> {
        sqlx::query("DELETE FROM draw_locks WHERE contest_id = $1 AND holder = $2")
            .bind(contest_id.into_inner())
            .bind(holder)
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;

        Ok(())
    }
}
