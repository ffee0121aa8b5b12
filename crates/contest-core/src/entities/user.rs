//! User entity - a platform user known to the bot

use chrono::{DateTime, Utc};

use crate::value_objects::UserId;

/// A user, created on first interaction with the bot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub display_name: String,
    /// Reward points accumulated through referrals
    pub points: i64,
    pub referrer_id: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a new User with required fields
    pub fn new(id: UserId, display_name: String) -> Self {
        Self {
            id,
            display_name,
            points: 0,
            referrer_id: None,
            created_at: Utc::now(),
        }
    }

    /// Attach a referrer; self-referral is ignored
    pub fn with_referrer(mut self, referrer: Option<UserId>) -> Self {
        self.referrer_id = referrer.filter(|r| *r != self.id);
        self
    }

    /// Check whether the balance covers `amount` points
    #[inline]
    pub fn can_spend(&self, amount: i64) -> bool {
        amount >= 0 && self.points >= amount
    }
}

/// The acting user as seen on an incoming update
///
/// Carries the profile facts the platform delivers with every update, so
/// eligibility checks do not need a round-trip for them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applicant {
    pub id: UserId,
    pub display_name: String,
    pub is_premium: bool,
}

impl Applicant {
    pub fn new(id: UserId, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            is_premium: false,
        }
    }

    pub fn premium(mut self, is_premium: bool) -> Self {
        self.is_premium = is_premium;
        self
    }
}
