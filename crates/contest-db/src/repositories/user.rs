//! PostgreSQL implementation of UserRepository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use contest_core::entities::User;
use contest_core::error::DomainError;
use contest_core::traits::{RepoResult, UserRepository};
use contest_core::value_objects::UserId;

use crate::models::UserModel;

use super::error::map_db_error;

/// PostgreSQL implementation of UserRepository
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    /// Create a new PgUserRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: UserId) -> RepoResult<Option<User>> {
        let result = sqlx::query_as::<_, UserModel>(
            r"
            SELECT id, display_name, points, referrer_id, created_at
            FROM users
            WHERE id = $1
            ",
        )
        .bind(id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(User::from))
    }

    #[instrument(skip(self, user), fields(user_id = %user.id))]
    async fn create_if_absent(&self, user: &User) -> RepoResult<bool> {
        let result = sqlx::query(
            r"
            INSERT INTO users (id, display_name, points, referrer_id, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO NOTHING
            ",
        )
        .bind(user.id.into_inner())
        .bind(&user.display_name)
        .bind(user.points)
        .bind(user.referrer_id.map(UserId::into_inner))
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.rows_affected() == 1)
    }

    #[instrument(skip(self))]
    async fn add_points(&self, id: UserId, points: i64) -> RepoResult<()> {
        let result = sqlx::query(
            r"
            UPDATE users
            SET points = points + $2
            WHERE id = $1
            ",
        )
        .bind(id.into_inner())
        .bind(points)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(DomainError::UserNotFound(id));
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn spend_points(&self, id: UserId, points: i64) -> RepoResult<bool> {
        let result = sqlx::query(
            r"
            UPDATE users
            SET points = points - $2
            WHERE id = $1 AND points >= $2
            ",
        )
        .bind(id.into_inner())
        .bind(points)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.rows_affected() == 1)
    }
}
