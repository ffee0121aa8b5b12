//! Purchase database model

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for purchases table
#[derive(Debug, Clone, FromRow)]
pub struct PurchaseModel {
    pub id: i64,
    pub user_id: i64,
    pub payload: String,
    pub amount: i64,
    pub status: String,
    pub created_at: DateTime<Utc>,
}
