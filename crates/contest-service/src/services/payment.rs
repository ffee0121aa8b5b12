//! Payment service
//!
//! Issues star invoices and applies confirmed payments. Every confirmation is
//! logged as a purchase; payments that cannot be applied as paid are kept for
//! manual review.

use contest_core::entities::{
    InvoicePayload, NewPurchase, Purchase, PurchaseStatus, VoteKind, GATE_FEATURE, MONTHLY_GRANT_DAYS,
    STARS_CURRENCY,
};
use contest_core::{ContestId, DomainError, EntryId, UserId};
use tracing::{info, instrument, warn};
use validator::Validate;

use crate::dto::ConfirmPaymentRequest;

use super::contest::ContestService;
use super::context::ServiceContext;
use super::entitlement::EntitlementService;
use super::error::{ServiceError, ServiceResult};
use super::voting::{VoteOutcome, VotingService};

/// Result of issuing an invoice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvoiceOutcome {
    Sent { amount: i64 },
    /// The price is zero; access was granted without an invoice
    GrantedFree,
}

/// Result of a confirmed payment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentOutcome {
    Applied,
    NeedsReview,
}

/// Payment service
pub struct PaymentService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> PaymentService<'a> {
    /// Create a new PaymentService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Send an invoice for the premium gate feature
    #[instrument(skip(self))]
    pub async fn issue_gate_invoice(&self, user: UserId, monthly: bool) -> ServiceResult<InvoiceOutcome> {
        let entitlements = EntitlementService::new(self.ctx);
        let prices = entitlements.prices().await?;

        let (payload, amount, title) = if monthly {
            (InvoicePayload::GateMonthly, prices.monthly, "Premium gates: 30 days")
        } else {
            (InvoicePayload::GateOneTime, prices.one_time, "Premium gates: one contest")
        };

        if amount == 0 {
            if monthly {
                entitlements
                    .grant_monthly(user, GATE_FEATURE, MONTHLY_GRANT_DAYS)
                    .await?;
            } else {
                entitlements.grant_one_time(user, GATE_FEATURE, 1).await?;
            }
            return Ok(InvoiceOutcome::GrantedFree);
        }

        self.ctx
            .platform()
            .send_invoice(user, title, &payload.to_string(), amount)
            .await?;
        info!(user_id = %user, payload = %payload, amount, "Invoice sent");
        Ok(InvoiceOutcome::Sent { amount })
    }

    /// Send an invoice for a weighted vote of `stars`
    #[instrument(skip(self))]
    pub async fn issue_star_vote_invoice(
        &self,
        user: UserId,
        contest_id: ContestId,
        entry_id: EntryId,
        stars: i64,
    ) -> ServiceResult<InvoiceOutcome> {
        if stars <= 0 {
            return Err(ServiceError::validation("stars must be positive"));
        }

        let contest = ContestService::new(self.ctx).get(contest_id).await?;
        let accepts_weighted = contest
            .kind
            .vote_settings()
            .is_some_and(|s| s.mode.allows_weighted());
        if !accepts_weighted {
            return Err(DomainError::VoteModeNotAllowed("weighted").into());
        }
        if !contest.accepts_entries() {
            return Err(DomainError::ContestClosed.into());
        }
        let entry = self
            .ctx
            .entry_repo()
            .find_by_id(entry_id)
            .await?
            .filter(|e| e.contest_id == contest_id)
            .ok_or(DomainError::EntryNotFound)?;

        let payload = InvoicePayload::StarVote {
            contest_id,
            entry_id,
        };
        let title = format!("{stars} stars for {}", entry.display_name);
        self.ctx
            .platform()
            .send_invoice(user, &title, &payload.to_string(), stars)
            .await?;
        info!(user_id = %user, payload = %payload, stars, "Invoice sent");
        Ok(InvoiceOutcome::Sent { amount: stars })
    }

    /// Apply a payment confirmed by the platform
    ///
    /// # Errors
    /// Rejects currencies other than stars and unknown payloads without
    /// recording anything.
    #[instrument(skip(self))]
    pub async fn confirm_payment(
        &self,
        user: UserId,
        payload: &str,
        amount: i64,
        currency: &str,
    ) -> ServiceResult<PaymentOutcome> {
        if currency != STARS_CURRENCY {
            return Err(DomainError::UnsupportedCurrency(currency.to_string()).into());
        }
        let parsed: InvoicePayload = payload.parse()?;

        let outcome = match parsed {
            InvoicePayload::GateMonthly | InvoicePayload::GateOneTime => {
                self.apply_gate_payment(user, parsed, amount).await?
            }
            InvoicePayload::StarVote {
                contest_id,
                entry_id,
            } => self.apply_star_vote(user, contest_id, entry_id, amount).await?,
        };

        let status = match outcome {
            PaymentOutcome::Applied => PurchaseStatus::Applied,
            PaymentOutcome::NeedsReview => PurchaseStatus::NeedsReview,
        };
        self.ctx
            .purchase_repo()
            .record(&NewPurchase {
                user_id: user,
                payload: payload.to_string(),
                amount,
                status,
            })
            .await?;

        if outcome == PaymentOutcome::NeedsReview {
            warn!(user_id = %user, payload, amount, "Payment flagged for review");
        } else {
            info!(user_id = %user, payload, amount, "Payment applied");
        }
        Ok(outcome)
    }

    /// [`Self::confirm_payment`] for a validated transport request
    pub async fn confirm(&self, request: ConfirmPaymentRequest) -> ServiceResult<PaymentOutcome> {
        request.validate()?;
        self.confirm_payment(
            request.user_id,
            &request.payload,
            request.amount,
            &request.currency,
        )
        .await
    }

    async fn apply_gate_payment(
        &self,
        user: UserId,
        payload: InvoicePayload,
        amount: i64,
    ) -> ServiceResult<PaymentOutcome> {
        let entitlements = EntitlementService::new(self.ctx);
        let prices = entitlements.prices().await?;
        let monthly = payload == InvoicePayload::GateMonthly;
        let price = if monthly { prices.monthly } else { prices.one_time };

        if amount < price {
            return Ok(PaymentOutcome::NeedsReview);
        }
        if monthly {
            entitlements
                .grant_monthly(user, GATE_FEATURE, MONTHLY_GRANT_DAYS)
                .await?;
        } else {
            entitlements.grant_one_time(user, GATE_FEATURE, 1).await?;
        }
        Ok(PaymentOutcome::Applied)
    }

    async fn apply_star_vote(
        &self,
        user: UserId,
        contest_id: ContestId,
        entry_id: EntryId,
        amount: i64,
    ) -> ServiceResult<PaymentOutcome> {
        if amount <= 0 {
            return Ok(PaymentOutcome::NeedsReview);
        }
        let contest = match ContestService::new(self.ctx).get(contest_id).await {
            Ok(contest) => contest,
            Err(ServiceError::Domain(e)) if e.is_not_found() => {
                warn!(contest_id = %contest_id, "Paid vote for unknown contest");
                return Ok(PaymentOutcome::NeedsReview);
            }
            Err(e) => return Err(e),
        };
        let voting = VotingService::new(self.ctx);
        match voting
            .add_vote(&contest, entry_id, user, VoteKind::Weighted { stars: amount })
            .await
        {
            Ok(VoteOutcome::Recorded(_)) => Ok(PaymentOutcome::Applied),
            Ok(_) => Ok(PaymentOutcome::NeedsReview),
            Err(ServiceError::Domain(e))
                if e.is_not_found()
                    || e.is_validation()
                    || matches!(e, DomainError::WrongContestKind { .. }) =>
            {
                warn!(contest_id = %contest_id, entry_id = %entry_id, error = %e, "Paid vote not applicable");
                Ok(PaymentOutcome::NeedsReview)
            }
            Err(e) => Err(e),
        }
    }

    /// Purchases waiting for manual reconciliation; bot administrators only
    #[instrument(skip(self))]
    pub async fn review_queue(&self, admin: UserId) -> ServiceResult<Vec<Purchase>> {
        if !self.ctx.config().bot.is_admin(admin) {
            return Err(DomainError::NotBotAdmin.into());
        }
        Ok(self.ctx.purchase_repo().list_needing_review().await?)
    }
}
