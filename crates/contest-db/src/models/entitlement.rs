//! Entitlement database model

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for entitlements table
#[derive(Debug, Clone, FromRow)]
pub struct EntitlementModel {
    pub user_id: i64,
    pub feature: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub credits: i64,
}
