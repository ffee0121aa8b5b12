//! PostgreSQL implementation of EntitlementRepository
//!
//! Grants are single-statement upserts so concurrent purchases for the same
//! user never lose an extension or a credit.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{info, instrument};

use contest_core::entities::EntitlementRecord;
use contest_core::traits::{EntitlementRepository, RepoResult};
use contest_core::value_objects::UserId;

use crate::models::EntitlementModel;

use super::error::map_db_error;

/// PostgreSQL implementation of EntitlementRepository
#[derive(Clone)]
pub struct PgEntitlementRepository {
    pool: PgPool,
}

impl PgEntitlementRepository {
    /// Create a new PgEntitlementRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EntitlementRepository for PgEntitlementRepository {
    #[instrument(skip(self))]
    async fn find(&self, user_id: UserId, feature: &str) -> RepoResult<Option<EntitlementRecord>> {
        let result = sqlx::query_as::<_, EntitlementModel>(
            r"
            SELECT user_id, feature, expires_at, credits
            FROM entitlements
            WHERE user_id = $1 AND feature = $2
            ",
        )
        .bind(user_id.into_inner())
        .bind(feature)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(EntitlementRecord::from))
    }

    #[instrument(skip(self))]
    async fn grant_monthly(
        &self,
        user_id: UserId,
        feature: &str,
        days: i64,
    ) -> RepoResult<EntitlementRecord> {
        let model = sqlx::query_as::<_, EntitlementModel>(
            r"
            INSERT INTO entitlements (user_id, feature, expires_at, credits)
            VALUES ($1, $2, NOW() + make_interval(days => $3::INT), 0)
            ON CONFLICT (user_id, feature) DO UPDATE
            SET expires_at = GREATEST(COALESCE(entitlements.expires_at, NOW()), NOW())
                             + make_interval(days => $3::INT)
            RETURNING user_id, feature, expires_at, credits
            ",
        )
        .bind(user_id.into_inner())
        .bind(feature)
        .bind(days)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;

        info!(user_id = %user_id, feature, expires_at = ?model.expires_at, "Subscription extended");
        Ok(EntitlementRecord::from(model))
    }

    #[instrument(skip(self))]
    async fn grant_one_time(
        &self,
        user_id: UserId,
        feature: &str,
        credits: i64,
    ) -> RepoResult<EntitlementRecord> {
        let model = sqlx::query_as::<_, EntitlementModel>(
            r"
            INSERT INTO entitlements (user_id, feature, credits)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, feature) DO UPDATE
            SET credits = entitlements.credits + EXCLUDED.credits
            RETURNING user_id, feature, expires_at, credits
            ",
        )
        .bind(user_id.into_inner())
        .bind(feature)
        .bind(credits)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;

        info!(user_id = %user_id, feature, credits = model.credits, "Credits granted");
        Ok(EntitlementRecord::from(model))
    }

    #[instrument(skip(self))]
    async fn consume_one_time(&self, user_id: UserId, feature: &str) -> RepoResult<bool> {
        let result = sqlx::query(
            r"
            UPDATE entitlements
            SET credits = credits - 1
            WHERE user_id = $1 AND feature = $2 AND credits > 0
              AND (expires_at IS NULL OR expires_at <= NOW())
            ",
        )
        .bind(user_id.into_inner())
        .bind(feature)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.rows_affected() == 1)
    }
}
