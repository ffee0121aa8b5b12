//! Contest, gate and winner database models

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::FromRow;

use contest_core::entities::{ContestKind, GateKind};

/// Database model for contests table
///
/// `settings` holds the whole tagged kind document; `kind` duplicates its tag
/// for filtering and constraints.
#[derive(Debug, Clone, FromRow)]
pub struct ContestModel {
    pub id: i64,
    pub owner_id: i64,
    pub channel_id: i64,
    pub group_id: Option<i64>,
    pub message_id: Option<i64>,
    pub code: String,
    pub kind: String,
    pub settings: Json<ContestKind>,
    pub text: String,
    pub winner_count: i32,
    pub flags: i64,
    pub is_open: bool,
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

/// Database model for contest_gates table
#[derive(Debug, Clone, FromRow)]
pub struct GateModel {
    pub id: i64,
    pub contest_id: i64,
    pub kind: Json<GateKind>,
    pub title: String,
    pub invite_link: Option<String>,
}

/// Database model for contest_winners table
#[derive(Debug, Clone, FromRow)]
pub struct WinnerModel {
    pub contest_id: i64,
    pub position: i32,
    pub entry_id: i64,
    pub user_id: i64,
    pub display_name: String,
}
