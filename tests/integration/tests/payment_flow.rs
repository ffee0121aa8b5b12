//! Entitlement, pricing, payment and referral tests
//!
//! Run with: cargo test -p integration-tests --test payment_flow

use chrono::{Duration, Utc};
use contest_core::entities::STARS_CURRENCY;
use contest_core::{Access, DomainError, PurchaseStatus, UserId, VoteSettings, GATE_FEATURE};
use contest_service::dto::ConfirmPaymentRequest;
use contest_service::services::entitlement::{PRICE_MONTH_SETTING, PRICE_ONCE_SETTING};
use contest_service::services::{
    AccessDecision, AdminGrant, DrawService, EntitlementService, InvoiceOutcome, PaymentOutcome,
    PaymentService, UserService, VotingService,
};
use contest_service::ServiceError;
use integration_tests::*;

const BUYER: UserId = UserId::new(42);

// ============================================================================
// Entitlements
// ============================================================================

#[tokio::test]
async fn test_monthly_grants_stack() {
    let env = TestEnv::new();
    let entitlements = EntitlementService::new(&env.ctx);

    entitlements.grant_monthly(BUYER, GATE_FEATURE, 30).await.unwrap();
    let record = entitlements.grant_monthly(BUYER, GATE_FEATURE, 30).await.unwrap();

    let expires_at = record.expires_at.unwrap();
    assert!(expires_at > Utc::now() + Duration::days(59));
    assert!(expires_at <= Utc::now() + Duration::days(60));
    assert!(matches!(
        entitlements.access(BUYER, GATE_FEATURE).await.unwrap(),
        Access::Subscription { .. }
    ));
}

#[tokio::test]
async fn test_credits_are_consumed_only_without_subscription() {
    let env = TestEnv::new();
    let entitlements = EntitlementService::new(&env.ctx);
    entitlements.grant_one_time(BUYER, GATE_FEATURE, 2).await.unwrap();

    assert!(entitlements.has_access(BUYER, GATE_FEATURE, false).await.unwrap());
    assert!(entitlements.has_access(BUYER, GATE_FEATURE, true).await.unwrap());
    assert_eq!(
        entitlements.access(BUYER, GATE_FEATURE).await.unwrap(),
        Access::Credits(1)
    );

    entitlements.grant_monthly(BUYER, GATE_FEATURE, 30).await.unwrap();
    assert!(entitlements.has_access(BUYER, GATE_FEATURE, true).await.unwrap());
    assert_eq!(entitlements.status(BUYER, GATE_FEATURE).await.unwrap().credits, 1);
}

#[tokio::test]
async fn test_no_record_means_no_access() {
    let env = TestEnv::new();
    let entitlements = EntitlementService::new(&env.ctx);

    assert!(!entitlements.has_access(BUYER, GATE_FEATURE, true).await.unwrap());
    let status = entitlements.status(BUYER, GATE_FEATURE).await.unwrap();
    assert_eq!(status.credits, 0);
    assert!(status.expires_at.is_none());
}

#[tokio::test]
async fn test_admin_grant() {
    let env = TestEnv::new();
    let entitlements = EntitlementService::new(&env.ctx);

    let denied = entitlements
        .admin_grant(BUYER, BUYER, GATE_FEATURE, AdminGrant::Days(7))
        .await;
    assert!(matches!(
        denied,
        Err(ServiceError::Domain(DomainError::NotBotAdmin))
    ));

    entitlements
        .admin_grant(ADMIN, BUYER, GATE_FEATURE, AdminGrant::Credits(3))
        .await
        .unwrap();
    assert_eq!(
        entitlements.access(BUYER, GATE_FEATURE).await.unwrap(),
        Access::Credits(3)
    );
}

// ============================================================================
// Pricing
// ============================================================================

#[tokio::test]
async fn test_request_access_quotes_prices() {
    let env = TestEnv::new();
    let decision = EntitlementService::new(&env.ctx)
        .request_access(BUYER, GATE_FEATURE)
        .await
        .unwrap();

    assert_eq!(
        decision,
        AccessDecision::PaymentRequired {
            monthly_price: 100,
            one_time_price: 10,
        }
    );
}

#[tokio::test]
async fn test_zero_monthly_price_grants_a_month() {
    let env = TestEnv::new();
    env.ctx
        .settings_repo()
        .set(PRICE_MONTH_SETTING, "0")
        .await
        .unwrap();
    let entitlements = EntitlementService::new(&env.ctx);

    let decision = entitlements.request_access(BUYER, GATE_FEATURE).await.unwrap();
    assert_eq!(decision, AccessDecision::GrantedFree);
    assert!(matches!(
        entitlements.access(BUYER, GATE_FEATURE).await.unwrap(),
        Access::Subscription { .. }
    ));

    let again = entitlements.request_access(BUYER, GATE_FEATURE).await.unwrap();
    assert!(matches!(again, AccessDecision::AlreadyEntitled(_)));
}

#[tokio::test]
async fn test_zero_one_time_price_grants_a_credit() {
    let env = TestEnv::new();
    env.ctx
        .settings_repo()
        .set(PRICE_ONCE_SETTING, "0")
        .await
        .unwrap();
    let entitlements = EntitlementService::new(&env.ctx);

    let decision = entitlements.request_access(BUYER, GATE_FEATURE).await.unwrap();
    assert_eq!(decision, AccessDecision::GrantedFree);
    assert_eq!(
        entitlements.access(BUYER, GATE_FEATURE).await.unwrap(),
        Access::Credits(1)
    );
}

#[tokio::test]
async fn test_malformed_price_setting_falls_back() {
    let env = TestEnv::new();
    let settings = env.ctx.settings_repo();
    settings.set(PRICE_MONTH_SETTING, "lots").await.unwrap();
    settings.set(PRICE_ONCE_SETTING, "-5").await.unwrap();

    let prices = EntitlementService::new(&env.ctx).prices().await.unwrap();
    assert_eq!(prices.monthly, 100);
    assert_eq!(prices.one_time, 10);
}

// ============================================================================
// Gate payments
// ============================================================================

#[tokio::test]
async fn test_gate_invoice_and_payment() {
    let env = TestEnv::new();
    let payments = PaymentService::new(&env.ctx);

    let outcome = payments.issue_gate_invoice(BUYER, true).await.unwrap();
    assert_eq!(outcome, InvoiceOutcome::Sent { amount: 100 });
    let invoice = env.platform.invoices().remove(0);
    assert_eq!(invoice.user, BUYER);
    assert_eq!(invoice.payload, "gate_monthly");

    let applied = payments
        .confirm_payment(BUYER, &invoice.payload, 100, STARS_CURRENCY)
        .await
        .unwrap();
    assert_eq!(applied, PaymentOutcome::Applied);
    assert!(EntitlementService::new(&env.ctx)
        .has_access(BUYER, GATE_FEATURE, false)
        .await
        .unwrap());
}

#[tokio::test]
async fn test_free_gate_invoice_is_never_sent() {
    let env = TestEnv::new();
    env.ctx
        .settings_repo()
        .set(PRICE_ONCE_SETTING, "0")
        .await
        .unwrap();

    let outcome = PaymentService::new(&env.ctx)
        .issue_gate_invoice(BUYER, false)
        .await
        .unwrap();
    assert_eq!(outcome, InvoiceOutcome::GrantedFree);
    assert!(env.platform.invoices().is_empty());
}

#[tokio::test]
async fn test_underpaid_gate_payment_needs_review() {
    let env = TestEnv::new();
    let payments = PaymentService::new(&env.ctx);

    let outcome = payments
        .confirm_payment(BUYER, "gate_onetime", 3, STARS_CURRENCY)
        .await
        .unwrap();
    assert_eq!(outcome, PaymentOutcome::NeedsReview);
    assert!(!EntitlementService::new(&env.ctx)
        .has_access(BUYER, GATE_FEATURE, false)
        .await
        .unwrap());

    let queue = payments.review_queue(ADMIN).await.unwrap();
    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0].status, PurchaseStatus::NeedsReview);
    assert_eq!(queue[0].amount, 3);

    let denied = payments.review_queue(BUYER).await;
    assert!(matches!(
        denied,
        Err(ServiceError::Domain(DomainError::NotBotAdmin))
    ));
}

#[tokio::test]
async fn test_rejected_payments_are_not_recorded() {
    let env = TestEnv::new();
    let payments = PaymentService::new(&env.ctx);

    let currency = payments
        .confirm_payment(BUYER, "gate_monthly", 100, "USD")
        .await;
    assert!(matches!(
        currency,
        Err(ServiceError::Domain(DomainError::UnsupportedCurrency(_)))
    ));

    let payload = payments
        .confirm_payment(BUYER, "star_vote:abc", 100, STARS_CURRENCY)
        .await;
    assert!(matches!(
        payload,
        Err(ServiceError::Domain(DomainError::InvalidPayload(_)))
    ));

    let invalid = payments
        .confirm(ConfirmPaymentRequest {
            user_id: BUYER,
            payload: "gate_monthly".to_string(),
            amount: 100,
            currency: "STARS".to_string(),
        })
        .await;
    assert!(matches!(invalid, Err(ServiceError::Validation(_))));

    assert!(payments.review_queue(ADMIN).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_star_vote_for_closed_contest_needs_review() {
    let env = TestEnv::new();
    let contest = env
        .publish(vote_draft(VoteSettings::default(), 1))
        .await
        .unwrap();
    let entry = env.join_users(contest.id, &[1]).await.remove(0);
    let payments = PaymentService::new(&env.ctx);

    payments
        .issue_star_vote_invoice(BUYER, contest.id, entry.id, 4)
        .await
        .unwrap();
    let invoice = env.platform.invoices().remove(0);
    DrawService::new(&env.ctx).draw(OWNER, contest.id).await.unwrap();

    let outcome = payments
        .confirm_payment(BUYER, &invoice.payload, 4, STARS_CURRENCY)
        .await
        .unwrap();
    assert_eq!(outcome, PaymentOutcome::NeedsReview);
    assert_eq!(payments.review_queue(ADMIN).await.unwrap().len(), 1);
    assert_eq!(env.db.vote_count(contest.id), 0);
}

#[tokio::test]
async fn test_oversized_star_vote_needs_review() {
    let env = TestEnv::new();
    let contest = env
        .publish(vote_draft(VoteSettings::default(), 1))
        .await
        .unwrap();
    let entry = env.join_users(contest.id, &[1]).await.remove(0);
    let payload = format!("star_vote:{}:{}", contest.id, entry.id);

    let outcome = PaymentService::new(&env.ctx)
        .confirm_payment(BUYER, &payload, i64::MAX, STARS_CURRENCY)
        .await
        .unwrap();
    assert_eq!(outcome, PaymentOutcome::NeedsReview);
    assert_eq!(env.db.vote_count(contest.id), 0);

    let board = VotingService::new(&env.ctx)
        .leaderboard(contest.id, 1)
        .await
        .unwrap();
    assert_eq!(board[0].votes, 0);
}

#[tokio::test]
async fn test_star_vote_for_unknown_contest_needs_review() {
    let env = TestEnv::new();

    let outcome = PaymentService::new(&env.ctx)
        .confirm_payment(BUYER, "star_vote:404:1", 5, STARS_CURRENCY)
        .await
        .unwrap();
    assert_eq!(outcome, PaymentOutcome::NeedsReview);
}

// ============================================================================
// Users and referrals
// ============================================================================

#[tokio::test]
async fn test_referral_is_credited_once() {
    let env = TestEnv::new();
    let users = UserService::new(&env.ctx);
    let referrer = UserId::new(1);
    let invited = UserId::new(2);

    assert!(users.ensure_user(referrer, "alice", None).await.unwrap());
    assert!(users.ensure_user(invited, "bob", Some(referrer)).await.unwrap());
    assert!(!users.ensure_user(invited, "bob", Some(referrer)).await.unwrap());

    let points = env.ctx.config().limits.referral_points;
    assert_eq!(users.get(referrer).await.unwrap().points, points);
}

#[tokio::test]
async fn test_unknown_referrer_and_self_referral_earn_nothing() {
    let env = TestEnv::new();
    let users = UserService::new(&env.ctx);
    let user = UserId::new(5);

    users.ensure_user(user, "carol", Some(user)).await.unwrap();
    users
        .ensure_user(UserId::new(6), "dave", Some(UserId::new(404)))
        .await
        .unwrap();

    assert_eq!(users.get(user).await.unwrap().points, 0);
    let missing = users.get(UserId::new(404)).await;
    assert!(matches!(missing, Err(ServiceError::NotFound { .. })));
}

#[tokio::test]
async fn test_spend_points() {
    let env = TestEnv::new();
    let users = UserService::new(&env.ctx);
    users.ensure_user(UserId::new(1), "alice", None).await.unwrap();
    users.ensure_user(UserId::new(2), "bob", Some(UserId::new(1))).await.unwrap();

    users.spend_points(UserId::new(1), 1).await.unwrap();
    let result = users.spend_points(UserId::new(1), 1).await;
    assert!(matches!(
        result,
        Err(ServiceError::Domain(DomainError::InsufficientPoints))
    ));
    assert!(matches!(
        users.spend_points(UserId::new(1), 0).await,
        Err(ServiceError::Validation(_))
    ));
}
