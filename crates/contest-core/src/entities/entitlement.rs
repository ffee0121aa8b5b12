//! Entitlement record - per (user, feature) subscription and one-time credits

use chrono::{DateTime, Duration, Utc};

use crate::value_objects::UserId;

/// Feature key for premium membership gates
pub const GATE_FEATURE: &str = "gate_channel";

/// Default length of a monthly grant
pub const MONTHLY_GRANT_DAYS: i64 = 30;

/// How a record currently covers the feature
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Time-boxed grant still running
    Subscription { expires_at: DateTime<Utc> },
    /// No running grant, but one-time credits remain
    Credits(i64),
    None,
}

impl Access {
    #[inline]
    pub fn is_granted(self) -> bool {
        !matches!(self, Self::None)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitlementRecord {
    pub user_id: UserId,
    pub feature: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub credits: i64,
}

impl EntitlementRecord {
    pub fn empty(user_id: UserId, feature: impl Into<String>) -> Self {
        Self {
            user_id,
            feature: feature.into(),
            expires_at: None,
            credits: 0,
        }
    }

    /// Access at `now`; a running subscription takes precedence over credits
    pub fn access_at(&self, now: DateTime<Utc>) -> Access {
        match self.expires_at {
            Some(expires_at) if expires_at > now => Access::Subscription { expires_at },
            _ if self.credits > 0 => Access::Credits(self.credits),
            _ => Access::None,
        }
    }

    /// Extend the subscription by `days`, stacking from the later of expiry and now
    pub fn extend(&mut self, now: DateTime<Utc>, days: i64) {
        self.expires_at = Some(stacked_expiry(self.expires_at, now, days));
    }

    pub fn add_credits(&mut self, credits: i64) {
        self.credits += credits;
    }

    /// Take one credit if no subscription covers `now`; returns whether access was granted
    pub fn consume_at(&mut self, now: DateTime<Utc>) -> bool {
        match self.access_at(now) {
            Access::Subscription { .. } => true,
            Access::Credits(_) => {
                self.credits -= 1;
                true
            }
            Access::None => false,
        }
    }
}

/// New expiry for a grant of `days` on top of `current`
pub fn stacked_expiry(
    current: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    days: i64,
) -> DateTime<Utc> {
    let base = current.map_or(now, |expiry| expiry.max(now));
    base + Duration::days(days)
}
