//! User and channel link database models

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for users table
#[derive(Debug, Clone, FromRow)]
pub struct UserModel {
    pub id: i64,
    pub display_name: String,
    pub points: i64,
    pub referrer_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// Database model for channel_links table
#[derive(Debug, Clone, FromRow)]
pub struct ChannelLinkModel {
    pub owner_id: i64,
    pub chat_id: i64,
    pub title: String,
    pub created_at: DateTime<Utc>,
}
