//! Entry database model

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for entries table
#[derive(Debug, Clone, FromRow)]
pub struct EntryModel {
    pub id: i64,
    pub contest_id: i64,
    pub user_id: i64,
    pub code: String,
    pub display_name: String,
    pub votes: i64,
    pub stars_received: i64,
    pub score: i64,
    pub created_at: DateTime<Utc>,
}
