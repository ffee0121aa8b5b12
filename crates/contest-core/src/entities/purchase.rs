//! Purchase log and invoice payloads

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::value_objects::{ContestId, EntryId, UserId};

/// The only currency accepted for purchases
pub const STARS_CURRENCY: &str = "XTR";

/// What an invoice pays for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvoicePayload {
    GateMonthly,
    GateOneTime,
    StarVote { contest_id: ContestId, entry_id: EntryId },
}

impl fmt::Display for InvoicePayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GateMonthly => f.write_str("gate_monthly"),
            Self::GateOneTime => f.write_str("gate_onetime"),
            Self::StarVote {
                contest_id,
                entry_id,
            } => write!(f, "star_vote:{contest_id}:{entry_id}"),
        }
    }
}

impl FromStr for InvoicePayload {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DomainError::InvalidPayload(s.to_string());
        match s {
            "gate_monthly" => Ok(Self::GateMonthly),
            "gate_onetime" => Ok(Self::GateOneTime),
            _ => {
                let rest = s.strip_prefix("star_vote:").ok_or_else(invalid)?;
                let (contest, entry) = rest.split_once(':').ok_or_else(invalid)?;
                Ok(Self::StarVote {
                    contest_id: contest.parse().map_err(|_| invalid())?,
                    entry_id: entry.parse().map_err(|_| invalid())?,
                })
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseStatus {
    Applied,
    NeedsReview,
}

impl PurchaseStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Applied => "applied",
            Self::NeedsReview => "needs_review",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "applied" => Some(Self::Applied),
            "needs_review" => Some(Self::NeedsReview),
            _ => None,
        }
    }
}

/// One confirmed payment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Purchase {
    pub id: i64,
    pub user_id: UserId,
    pub payload: String,
    pub amount: i64,
    pub status: PurchaseStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPurchase {
    pub user_id: UserId,
    pub payload: String,
    pub amount: i64,
    pub status: PurchaseStatus,
}
