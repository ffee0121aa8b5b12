//! PostgreSQL implementations of PurchaseRepository and SettingsRepository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use contest_core::entities::{NewPurchase, Purchase};
use contest_core::traits::{PurchaseRepository, RepoResult, SettingsRepository};

use crate::models::PurchaseModel;

use super::error::map_db_error;

/// PostgreSQL implementation of PurchaseRepository
#[derive(Clone)]
pub struct PgPurchaseRepository {
    pool: PgPool,
}

impl PgPurchaseRepository {
    /// Create a new PgPurchaseRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PurchaseRepository for PgPurchaseRepository {
    #[instrument(skip(self, purchase), fields(user_id = %purchase.user_id, payload = %purchase.payload))]
    async fn record(&self, purchase: &NewPurchase) -> RepoResult<Purchase> {
        let model = sqlx::query_as::<_, PurchaseModel>(
            r"
            INSERT INTO purchases (user_id, payload, amount, status)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, payload, amount, status, created_at
            ",
        )
        .bind(purchase.user_id.into_inner())
        .bind(&purchase.payload)
        .bind(purchase.amount)
        .bind(purchase.status.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(Purchase::from(model))
    }

    #[instrument(skip(self))]
    async fn list_needing_review(&self) -> RepoResult<Vec<Purchase>> {
        let results = sqlx::query_as::<_, PurchaseModel>(
            r"
            SELECT id, user_id, payload, amount, status, created_at
            FROM purchases
            WHERE status = 'needs_review'
            ORDER BY created_at
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(results.into_iter().map(Purchase::from).collect())
    }
}

/// PostgreSQL implementation of SettingsRepository
#[derive(Clone)]
pub struct PgSettingsRepository {
    pool: PgPool,
}

impl PgSettingsRepository {
    /// Create a new PgSettingsRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SettingsRepository for PgSettingsRepository {
    #[instrument(skip(self))]
    async fn get(&self, key: &str) -> RepoResult<Option<String>> {
        sqlx::query_scalar("SELECT value FROM app_settings WHERE key = $1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error)
    }

    #[instrument(skip(self))]
    async fn set(&self, key: &str, value: &str) -> RepoResult<()> {
        sqlx::query(
            r"
            INSERT INTO app_settings (key, value, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = NOW()
            ",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(())
    }
}
