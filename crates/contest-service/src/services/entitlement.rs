//! Entitlement service
//!
//! Premium features are covered either by a time-boxed grant or by one-time
//! credits. Prices come from runtime settings, falling back to configuration;
//! a price of zero makes the feature free.

use chrono::{DateTime, Utc};
use contest_core::entities::{Access, EntitlementRecord, MONTHLY_GRANT_DAYS};
use contest_core::{DomainError, UserId};
use serde::Serialize;
use tracing::{info, instrument, warn};

use super::context::ServiceContext;
use super::error::ServiceResult;

/// Runtime setting overriding the monthly price
pub const PRICE_MONTH_SETTING: &str = "price_month_value";

/// Runtime setting overriding the one-time price
pub const PRICE_ONCE_SETTING: &str = "price_once_value";

/// Current prices in stars
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Prices {
    pub monthly: i64,
    pub one_time: i64,
}

/// Result of asking for a premium feature
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    AlreadyEntitled(Access),
    /// A price of zero; access was granted on the spot
    GrantedFree,
    PaymentRequired { monthly_price: i64, one_time_price: i64 },
}

/// Entitlement service
pub struct EntitlementService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> EntitlementService<'a> {
    /// Create a new EntitlementService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Whether `user` may use `feature`
    ///
    /// A running grant always covers the feature. Otherwise a credit covers
    /// it, and is taken when `consume_one_time` is set.
    #[instrument(skip(self))]
    pub async fn has_access(
        &self,
        user: UserId,
        feature: &str,
        consume_one_time: bool,
    ) -> ServiceResult<bool> {
        let access = self.access(user, feature).await?;
        match access {
            Access::Subscription { .. } => Ok(true),
            Access::Credits(_) if consume_one_time => Ok(self
                .ctx
                .entitlement_repo()
                .consume_one_time(user, feature)
                .await?),
            Access::Credits(_) => Ok(true),
            Access::None => Ok(false),
        }
    }

    /// Current access without side effects
    pub async fn access(&self, user: UserId, feature: &str) -> ServiceResult<Access> {
        Ok(self.status(user, feature).await?.access_at(Utc::now()))
    }

    /// Expiry and credit balance; an empty record when nothing was ever granted
    #[instrument(skip(self))]
    pub async fn status(&self, user: UserId, feature: &str) -> ServiceResult<EntitlementRecord> {
        Ok(self
            .ctx
            .entitlement_repo()
            .find(user, feature)
            .await?
            .unwrap_or_else(|| EntitlementRecord::empty(user, feature)))
    }

    /// Extend the time-boxed grant by `days`
    #[instrument(skip(self))]
    pub async fn grant_monthly(
        &self,
        user: UserId,
        feature: &str,
        days: i64,
    ) -> ServiceResult<EntitlementRecord> {
        let record = self
            .ctx
            .entitlement_repo()
            .grant_monthly(user, feature, days)
            .await?;
        info!(user_id = %user, feature, expires_at = ?record.expires_at, "Monthly access granted");
        Ok(record)
    }

    /// Add one-time credits
    #[instrument(skip(self))]
    pub async fn grant_one_time(
        &self,
        user: UserId,
        feature: &str,
        credits: i64,
    ) -> ServiceResult<EntitlementRecord> {
        let record = self
            .ctx
            .entitlement_repo()
            .grant_one_time(user, feature, credits)
            .await?;
        info!(user_id = %user, feature, credits = record.credits, "One-time credits granted");
        Ok(record)
    }

    /// Manual grant by a bot administrator
    ///
    /// `days` grants time; otherwise `credits` one-time credits.
    #[instrument(skip(self))]
    pub async fn admin_grant(
        &self,
        admin: UserId,
        user: UserId,
        feature: &str,
        grant: AdminGrant,
    ) -> ServiceResult<EntitlementRecord> {
        if !self.ctx.config().bot.is_admin(admin) {
            return Err(DomainError::NotBotAdmin.into());
        }
        match grant {
            AdminGrant::Days(days) => self.grant_monthly(user, feature, days).await,
            AdminGrant::Credits(credits) => self.grant_one_time(user, feature, credits).await,
        }
    }

    /// Prices from settings, falling back to configuration
    pub async fn prices(&self) -> ServiceResult<Prices> {
        let defaults = self.ctx.config().pricing;
        Ok(Prices {
            monthly: self
                .price_setting(PRICE_MONTH_SETTING, defaults.monthly_stars)
                .await?,
            one_time: self
                .price_setting(PRICE_ONCE_SETTING, defaults.one_time_stars)
                .await?,
        })
    }

    /// Decide how `user` gets `feature`: already covered, free, or by paying
    ///
    /// A zero monthly price grants a month; otherwise a zero one-time price
    /// grants one credit.
    #[instrument(skip(self))]
    pub async fn request_access(&self, user: UserId, feature: &str) -> ServiceResult<AccessDecision> {
        let access = self.access(user, feature).await?;
        if access.is_granted() {
            return Ok(AccessDecision::AlreadyEntitled(access));
        }

        let prices = self.prices().await?;
        if prices.monthly == 0 {
            self.grant_monthly(user, feature, MONTHLY_GRANT_DAYS).await?;
            return Ok(AccessDecision::GrantedFree);
        }
        if prices.one_time == 0 {
            self.grant_one_time(user, feature, 1).await?;
            return Ok(AccessDecision::GrantedFree);
        }

        Ok(AccessDecision::PaymentRequired {
            monthly_price: prices.monthly,
            one_time_price: prices.one_time,
        })
    }

    async fn price_setting(&self, key: &str, default: i64) -> ServiceResult<i64> {
        let Some(raw) = self.ctx.settings_repo().get(key).await? else {
            return Ok(default);
        };
        match raw.trim().parse::<i64>() {
            Ok(price) if price >= 0 => Ok(price),
            _ => {
                warn!(key, value = %raw, "Ignoring malformed price setting");
                Ok(default)
            }
        }
    }
}

/// What an administrator hands out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminGrant {
    Days(i64),
    Credits(i64),
}

/// Expiry of a running grant, if any
pub fn subscription_expiry(access: Access) -> Option<DateTime<Utc>> {
    match access {
        Access::Subscription { expires_at } => Some(expires_at),
        _ => None,
    }
}
