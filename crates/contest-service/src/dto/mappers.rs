//! Entity to DTO mappers
//!
//! Implements `From` conversions from domain entities to response DTOs.

use chrono::Utc;
use contest_core::entities::{Contest, EntitlementRecord, Entry, Winner};

use super::responses::{ContestResponse, EntitlementStatusResponse, EntryResponse, WinnerResponse};
use crate::services::entitlement::subscription_expiry;

// ============================================================================
// Contest Mappers
// ============================================================================

impl From<&Contest> for ContestResponse {
    fn from(contest: &Contest) -> Self {
        Self {
            id: contest.id.to_string(),
            code: contest.code.clone(),
            kind: contest.kind.name(),
            status: contest.status().as_str(),
            owner_id: contest.owner_id.to_string(),
            channel_id: contest.channel_id.to_string(),
            group_id: contest.group_id.map(|g| g.to_string()),
            text: contest.text.clone(),
            winner_count: contest.winner_count,
            flags: contest.flags.list(),
            created_at: contest.created_at,
            closed_at: contest.closed_at,
        }
    }
}

impl From<Contest> for ContestResponse {
    fn from(contest: Contest) -> Self {
        Self::from(&contest)
    }
}

// ============================================================================
// Entry Mappers
// ============================================================================

impl From<&Entry> for EntryResponse {
    fn from(entry: &Entry) -> Self {
        Self {
            id: entry.id.to_string(),
            code: entry.code.clone(),
            user_id: entry.user_id.to_string(),
            display_name: entry.display_name.clone(),
            votes: entry.votes,
            stars_received: entry.stars_received,
            score: entry.score,
        }
    }
}

impl From<&Winner> for WinnerResponse {
    fn from(winner: &Winner) -> Self {
        Self {
            position: winner.position,
            user_id: winner.user_id.to_string(),
            display_name: winner.display_name.clone(),
        }
    }
}

// ============================================================================
// Entitlement Mappers
// ============================================================================

impl From<&EntitlementRecord> for EntitlementStatusResponse {
    fn from(record: &EntitlementRecord) -> Self {
        Self {
            feature: record.feature.clone(),
            active_until: subscription_expiry(record.access_at(Utc::now())),
            credits: record.credits,
        }
    }
}
