//! Vote record - append-only contribution of one voter to one entry

use chrono::{DateTime, Utc};

use crate::error::DomainError;
use crate::value_objects::{ContestId, EntryId, UserId};

/// Normal (weight 1) or paid vote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VoteKind {
    Normal,
    Weighted { stars: i64 },
}

impl VoteKind {
    /// Votes credited to the entry for this contribution
    pub fn weight(self, exchange_ratio: u32) -> Result<i64, DomainError> {
        match self {
            Self::Normal => Ok(1),
            Self::Weighted { stars } => stars
                .checked_mul(i64::from(exchange_ratio))
                .ok_or(DomainError::VoteWeightOverflow { stars }),
        }
    }

    /// Stars received by the entry
    pub fn stars(self) -> i64 {
        match self {
            Self::Normal => 0,
            Self::Weighted { stars } => stars,
        }
    }

    #[inline]
    pub fn is_weighted(self) -> bool {
        matches!(self, Self::Weighted { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vote {
    pub id: i64,
    pub contest_id: ContestId,
    pub entry_id: EntryId,
    pub voter_id: UserId,
    pub kind: VoteKind,
    /// Votes this record added to the entry
    pub weight: i64,
    pub created_at: DateTime<Utc>,
}

/// Vote to record, with the policy that applies to it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewVote {
    pub contest_id: ContestId,
    pub entry_id: EntryId,
    pub voter_id: UserId,
    pub kind: VoteKind,
    pub exchange_ratio: u32,
    /// Reject if the voter already holds the contest-wide vote guard
    pub enforce_single: bool,
    /// Take the contest-wide vote guard when recording
    pub claims_guard: bool,
}
