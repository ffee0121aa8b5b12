//! Response DTOs handed to the transport layer
//!
//! All response DTOs implement `Serialize`. Ids are serialized as strings so
//! 64-bit chat ids survive JSON consumers.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Contest summary
#[derive(Debug, Clone, Serialize)]
pub struct ContestResponse {
    pub id: String,
    pub code: String,
    pub kind: &'static str,
    pub status: &'static str,
    pub owner_id: String,
    pub channel_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    pub text: String,
    pub winner_count: u32,
    pub flags: Vec<&'static str>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<DateTime<Utc>>,
}

/// Entry with its counters
#[derive(Debug, Clone, Serialize)]
pub struct EntryResponse {
    pub id: String,
    pub code: String,
    pub user_id: String,
    pub display_name: String,
    pub votes: i64,
    pub stars_received: i64,
    pub score: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct WinnerResponse {
    pub position: u32,
    pub user_id: String,
    pub display_name: String,
}

/// Premium entitlement of one user
#[derive(Debug, Clone, Serialize)]
pub struct EntitlementStatusResponse {
    pub feature: String,
    /// Set while a time-boxed grant is running
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_until: Option<DateTime<Utc>>,
    pub credits: i64,
}
