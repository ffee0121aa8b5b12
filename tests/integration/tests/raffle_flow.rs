//! Raffle lifecycle tests
//!
//! Publish, join, eligibility, pause/resume and the draw, run against the
//! in-memory ports.
//!
//! Run with: cargo test -p integration-tests --test raffle_flow

use contest_core::{
    ChatId, ContestFlags, ContestStatus, DomainError, GateKind, GateSpec, LifecycleAction,
    MemberStatus, UserId, GATE_FEATURE,
};
use contest_service::services::{
    ChallengeResult, ChannelLinkService, ContestService, DenyReason, DrawOutcome, DrawService,
    EntitlementService, JoinOutcome,
};
use contest_service::ServiceError;
use integration_tests::*;

// ============================================================================
// Publishing
// ============================================================================

#[tokio::test]
async fn test_publish_posts_to_channel() {
    let env = TestEnv::new();
    let contest = env.publish(raffle_draft(1)).await.unwrap();

    assert!(contest.message_id.is_some());
    assert_eq!(contest.status(), ContestStatus::Open);
    assert_eq!(contest.code.len(), 8);

    let posts = env.platform.messages_to(CHANNEL);
    assert_eq!(posts.len(), 1);
    assert!(posts[0].contains("Participants: 0"));
    assert!(posts[0].contains(&contest.code));

    let contests = ContestService::new(&env.ctx);
    assert_eq!(contests.get_by_code(&contest.code).await.unwrap().id, contest.id);
    assert_eq!(contests.list_by_channel(CHANNEL).await.unwrap().len(), 1);
    assert_eq!(contests.list_by_owner(OWNER).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_publish_requires_linked_channel() {
    let env = TestEnv::new();
    let result = ContestService::new(&env.ctx).create(OWNER, raffle_draft(1)).await;

    assert!(matches!(
        result,
        Err(ServiceError::Domain(DomainError::ChannelNotLinked(chat))) if chat == CHANNEL
    ));
    assert_eq!(env.db.contest_count(), 0);
}

#[tokio::test]
async fn test_channel_links() {
    let env = TestEnv::new();
    let links = ChannelLinkService::new(&env.ctx);

    let stranger = links.link_channel(UserId::new(77), CHANNEL).await;
    assert!(matches!(
        stranger,
        Err(ServiceError::Domain(DomainError::NotChatAdmin))
    ));

    env.link_owner_chats().await.unwrap();
    let listed = links.list(OWNER).await.unwrap();
    assert_eq!(listed.len(), 2);
    assert!(listed
        .iter()
        .any(|l| l.chat_id == CHANNEL && l.title == format!("Chat {CHANNEL}")));

    assert!(links.unlink_channel(OWNER, CHANNEL).await.unwrap());
    assert!(!links.unlink_channel(OWNER, CHANNEL).await.unwrap());

    let result = ContestService::new(&env.ctx).create(OWNER, raffle_draft(1)).await;
    assert!(matches!(
        result,
        Err(ServiceError::Domain(DomainError::ChannelNotLinked(chat))) if chat == CHANNEL
    ));
}

#[tokio::test]
async fn test_publish_failure_removes_contest() {
    let env = TestEnv::new();
    env.link_owner_chats().await.unwrap();
    env.platform.fail_sends(true);

    let result = ContestService::new(&env.ctx).create(OWNER, raffle_draft(1)).await;

    assert!(matches!(result, Err(ServiceError::Platform(_))));
    assert_eq!(env.db.contest_count(), 0);
}

#[tokio::test]
async fn test_premium_gate_needs_entitlement_and_spends_credit() {
    let env = TestEnv::new();
    let sponsor = ChatId::new(-100_300);
    let draft = gated_draft(
        raffle_draft(1),
        ContestFlags::empty(),
        vec![GateSpec::new(
            GateKind::ChannelMembership { chat_id: sponsor },
            "Sponsor",
        )],
    );

    let denied = env.publish(draft.clone()).await;
    assert!(matches!(
        denied,
        Err(ServiceError::Domain(DomainError::PremiumRequired))
    ));

    let entitlements = EntitlementService::new(&env.ctx);
    entitlements.grant_one_time(OWNER, GATE_FEATURE, 1).await.unwrap();

    let contest = env.publish(draft).await.unwrap();
    let gates = ContestService::new(&env.ctx).gates(contest.id).await.unwrap();
    assert_eq!(gates.len(), 1);
    assert!(gates[0].invite_link.is_some());

    let status = entitlements.status(OWNER, GATE_FEATURE).await.unwrap();
    assert_eq!(status.credits, 0);
}

#[tokio::test]
async fn test_one_credit_publishes_one_premium_contest() {
    let env = TestEnv::new();
    env.link_owner_chats().await.unwrap();
    env.platform.yield_sends(true);
    let draft = gated_draft(
        raffle_draft(1),
        ContestFlags::empty(),
        vec![GateSpec::new(
            GateKind::ChannelMembership {
                chat_id: ChatId::new(-100_300),
            },
            "Sponsor",
        )],
    );
    let entitlements = EntitlementService::new(&env.ctx);
    entitlements.grant_one_time(OWNER, GATE_FEATURE, 1).await.unwrap();

    let contests = ContestService::new(&env.ctx);
    let (a, b) = tokio::join!(
        contests.create(OWNER, draft.clone()),
        contests.create(OWNER, draft)
    );

    let published = [&a, &b].iter().filter(|r| r.is_ok()).count();
    assert_eq!(published, 1);
    assert!([a, b].into_iter().any(|r| matches!(
        r,
        Err(ServiceError::Domain(DomainError::PremiumRequired))
    )));
    assert_eq!(env.db.contest_count(), 1);
    assert_eq!(entitlements.status(OWNER, GATE_FEATURE).await.unwrap().credits, 0);
    assert!(env
        .platform
        .edits_in(CHANNEL)
        .iter()
        .any(|text| text.contains("withdrawn")));
}

// ============================================================================
// Joining
// ============================================================================

#[tokio::test]
async fn test_join_twice_keeps_one_entry() {
    let env = TestEnv::new();
    let contest = env.publish(raffle_draft(1)).await.unwrap();
    let first = env.join_users(contest.id, &[1]).await.remove(0);

    let again = ContestService::new(&env.ctx)
        .join(&applicant(1), contest.id)
        .await
        .unwrap();

    assert_eq!(again, JoinOutcome::AlreadyJoined(first));
    assert_eq!(env.db.entry_count(contest.id), 1);
}

#[tokio::test]
async fn test_join_refreshes_post() {
    let env = TestEnv::new();
    let contest = env.publish(raffle_draft(1)).await.unwrap();
    env.join_users(contest.id, &[1, 2]).await;

    let edits = env.platform.edits_in(CHANNEL);
    assert!(edits.last().unwrap().contains("Participants: 2"));
}

#[tokio::test]
async fn test_join_requires_target_subscription() {
    let env = TestEnv::new();
    let contest = env.publish(raffle_draft(1)).await.unwrap();

    let outcome = ContestService::new(&env.ctx)
        .join(&applicant(1), contest.id)
        .await
        .unwrap();

    assert_eq!(
        outcome,
        JoinOutcome::Denied(DenyReason::NotSubscribedToTarget { chat_id: CHANNEL })
    );
    assert_eq!(env.db.entry_count(contest.id), 0);
}

#[tokio::test]
async fn test_skip_target_flag_admits_outsiders() {
    let env = TestEnv::new();
    let draft = gated_draft(
        raffle_draft(1),
        ContestFlags::SKIP_TARGET_SUBSCRIPTION,
        Vec::new(),
    );
    let contest = env.publish(draft).await.unwrap();

    let outcome = ContestService::new(&env.ctx)
        .join(&applicant(1), contest.id)
        .await
        .unwrap();
    assert!(matches!(outcome, JoinOutcome::Joined(_)));
}

#[tokio::test]
async fn test_base_channel_subscription() {
    let base = ChatId::new(-100_999);
    let mut config = test_config();
    config.bot.base_channel = Some(base);
    let env = TestEnv::with_config(config);
    let contest = env.publish(raffle_draft(1)).await.unwrap();
    env.platform.add_members(CHANNEL, &[UserId::new(1)]);

    let contests = ContestService::new(&env.ctx);
    let outcome = contests.join(&applicant(1), contest.id).await.unwrap();
    assert_eq!(
        outcome,
        JoinOutcome::Denied(DenyReason::NotSubscribedToBase { chat_id: base })
    );

    env.platform.add_members(base, &[UserId::new(1)]);
    let outcome = contests.join(&applicant(1), contest.id).await.unwrap();
    assert!(matches!(outcome, JoinOutcome::Joined(_)));
}

#[tokio::test]
async fn test_premium_only_contest() {
    let env = TestEnv::new();
    let draft = gated_draft(raffle_draft(1), ContestFlags::PREMIUM_ONLY, Vec::new());
    let contest = env.publish(draft).await.unwrap();
    env.platform.add_members(CHANNEL, &[UserId::new(1)]);

    let contests = ContestService::new(&env.ctx);
    let outcome = contests.join(&applicant(1), contest.id).await.unwrap();
    assert_eq!(outcome, JoinOutcome::Denied(DenyReason::PremiumAccountRequired));

    let outcome = contests
        .join(&applicant(1).premium(true), contest.id)
        .await
        .unwrap();
    assert!(matches!(outcome, JoinOutcome::Joined(_)));
}

#[tokio::test]
async fn test_joined_contest_gate() {
    let env = TestEnv::new();
    let first = env.publish(raffle_draft(1)).await.unwrap();
    let second = env
        .publish(gated_draft(
            raffle_draft(1),
            ContestFlags::empty(),
            vec![GateSpec::new(
                GateKind::JoinedContest { contest_id: first.id },
                "Join the first giveaway",
            )],
        ))
        .await
        .unwrap();
    env.platform.add_members(CHANNEL, &[UserId::new(1)]);

    let contests = ContestService::new(&env.ctx);
    let outcome = contests.join(&applicant(1), second.id).await.unwrap();
    assert!(matches!(
        outcome,
        JoinOutcome::Denied(DenyReason::GateUnmet { ref title, .. }) if title == "Join the first giveaway"
    ));

    contests.join(&applicant(1), first.id).await.unwrap();
    let outcome = contests.join(&applicant(1), second.id).await.unwrap();
    assert!(matches!(outcome, JoinOutcome::Joined(_)));
}

#[tokio::test]
async fn test_interaction_gate() {
    let env = TestEnv::new();
    let contest = env
        .publish(gated_draft(
            raffle_draft(1),
            ContestFlags::empty(),
            vec![GateSpec::new(
                GateKind::InteractionPoints {
                    group_id: GROUP,
                    min_points: 10,
                },
                "Be active in the group",
            )],
        ))
        .await
        .unwrap();
    env.platform.add_members(CHANNEL, &[UserId::new(1)]);

    let contests = ContestService::new(&env.ctx);
    let outcome = contests.join(&applicant(1), contest.id).await.unwrap();
    assert!(matches!(outcome, JoinOutcome::Denied(DenyReason::GateUnmet { .. })));

    env.interaction.set(GROUP, UserId::new(1), 12);
    let outcome = contests.join(&applicant(1), contest.id).await.unwrap();
    assert!(matches!(outcome, JoinOutcome::Joined(_)));
}

#[tokio::test]
async fn test_anti_bot_challenge() {
    let env = TestEnv::new();
    let draft = gated_draft(raffle_draft(1), ContestFlags::ANTI_BOT, Vec::new());
    let contest = env.publish(draft).await.unwrap();
    let user = applicant(1);
    env.platform.add_members(CHANNEL, &[user.id]);

    let contests = ContestService::new(&env.ctx);
    let challenges = contest_service::services::ChallengeService::new(&env.ctx);

    let JoinOutcome::Challenge(challenge) = contests.join(&user, contest.id).await.unwrap() else {
        panic!("expected a challenge");
    };
    assert!(challenge.options.contains(&challenge.answer()));
    let wrong = challenge.answer() + 100;
    assert_eq!(
        challenges.answer(contest.id, user.id, wrong).await.unwrap(),
        ChallengeResult::Failed
    );
    assert_eq!(
        challenges.answer(contest.id, user.id, wrong).await.unwrap(),
        ChallengeResult::Expired
    );

    let JoinOutcome::Challenge(retry) = contests.join(&user, contest.id).await.unwrap() else {
        panic!("expected a fresh challenge");
    };
    assert_eq!(
        challenges
            .answer(contest.id, user.id, retry.answer())
            .await
            .unwrap(),
        ChallengeResult::Passed
    );

    let outcome = contests.join(&user, contest.id).await.unwrap();
    assert!(matches!(outcome, JoinOutcome::Joined(_)));
}

// ============================================================================
// Lifecycle
// ============================================================================

#[tokio::test]
async fn test_pause_and_resume() {
    let env = TestEnv::new();
    let contest = env.publish(raffle_draft(1)).await.unwrap();
    env.platform.add_members(CHANNEL, &[UserId::new(1)]);
    let contests = ContestService::new(&env.ctx);

    let paused = contests
        .set_status(OWNER, contest.id, LifecycleAction::Pause)
        .await
        .unwrap();
    assert_eq!(paused.status(), ContestStatus::Paused);

    let again = contests
        .set_status(OWNER, contest.id, LifecycleAction::Pause)
        .await
        .unwrap();
    assert_eq!(again.status(), ContestStatus::Paused);

    let outcome = contests.join(&applicant(1), contest.id).await.unwrap();
    assert_eq!(outcome, JoinOutcome::Denied(DenyReason::ContestPaused));

    contests
        .set_status(OWNER, contest.id, LifecycleAction::Resume)
        .await
        .unwrap();
    let outcome = contests.join(&applicant(1), contest.id).await.unwrap();
    assert!(matches!(outcome, JoinOutcome::Joined(_)));
}

#[tokio::test]
async fn test_only_managers_change_status() {
    let env = TestEnv::new();
    let contest = env.publish(raffle_draft(1)).await.unwrap();
    let contests = ContestService::new(&env.ctx);
    let stranger = UserId::new(77);

    let result = contests
        .set_status(stranger, contest.id, LifecycleAction::Pause)
        .await;
    assert!(matches!(
        result,
        Err(ServiceError::Domain(DomainError::NotContestOwner))
    ));

    // Channel admins manage contests they did not create
    env.platform
        .set_member(CHANNEL, stranger, MemberStatus::Administrator);
    let paused = contests
        .set_status(stranger, contest.id, LifecycleAction::Pause)
        .await
        .unwrap();
    assert_eq!(paused.status(), ContestStatus::Paused);
}

#[tokio::test]
async fn test_finalize_only_through_draw() {
    let env = TestEnv::new();
    let contest = env.publish(raffle_draft(1)).await.unwrap();

    let result = ContestService::new(&env.ctx)
        .set_status(OWNER, contest.id, LifecycleAction::Finalize)
        .await;
    assert!(matches!(result, Err(ServiceError::Validation(_))));
}

// ============================================================================
// Draw
// ============================================================================

#[tokio::test]
async fn test_raffle_draws_distinct_winners_and_closes() {
    let env = TestEnv::new();
    let contest = env.publish(raffle_draft(2)).await.unwrap();
    let entries = env.join_users(contest.id, &[1, 2, 3]).await;

    let DrawOutcome::Finalized(result) = DrawService::new(&env.ctx)
        .draw(OWNER, contest.id)
        .await
        .unwrap()
    else {
        panic!("expected the draw to finalize");
    };

    assert_eq!(result.winners.len(), 2);
    assert_eq!(
        result.winners.iter().map(|w| w.position).collect::<Vec<_>>(),
        vec![1, 2]
    );
    assert_ne!(result.winners[0].user_id, result.winners[1].user_id);
    for winner in &result.winners {
        assert!(entries.iter().any(|e| e.id == winner.entry_id));
    }
    assert!(result.unreachable.is_empty());

    let contests = ContestService::new(&env.ctx);
    let closed = contests.get(contest.id).await.unwrap();
    assert_eq!(closed.status(), ContestStatus::Closed);
    assert_eq!(contests.winners(contest.id).await.unwrap(), result.winners);

    let announcements: Vec<_> = env
        .platform
        .messages_to(CHANNEL)
        .into_iter()
        .filter(|m| m.contains("is closed"))
        .collect();
    assert_eq!(announcements.len(), 1);
    for winner in &result.winners {
        assert_eq!(
            env.platform.messages_to(ChatId::private(winner.user_id)).len(),
            1
        );
    }
}

#[tokio::test]
async fn test_closed_contest_rejects_joins_and_draws() {
    let env = TestEnv::new();
    let contest = env.publish(raffle_draft(1)).await.unwrap();
    env.join_users(contest.id, &[1]).await;
    let draws = DrawService::new(&env.ctx);
    draws.draw(OWNER, contest.id).await.unwrap();

    env.platform.add_members(CHANNEL, &[UserId::new(2)]);
    let outcome = ContestService::new(&env.ctx)
        .join(&applicant(2), contest.id)
        .await
        .unwrap();
    assert_eq!(outcome, JoinOutcome::Denied(DenyReason::ContestClosed));
    assert_eq!(env.db.entry_count(contest.id), 1);

    // A participant asking again is told the contest is over too
    let rejoin = ContestService::new(&env.ctx)
        .join(&applicant(1), contest.id)
        .await
        .unwrap();
    assert_eq!(rejoin, JoinOutcome::Denied(DenyReason::ContestClosed));

    let again = draws.draw(OWNER, contest.id).await.unwrap();
    assert_eq!(again, DrawOutcome::AlreadyClosed);

    let resume = ContestService::new(&env.ctx)
        .set_status(OWNER, contest.id, LifecycleAction::Resume)
        .await;
    assert!(matches!(
        resume,
        Err(ServiceError::Domain(DomainError::ContestClosed))
    ));
}

#[tokio::test]
async fn test_draw_retry_on_closed_contest_skips_rate_limit() {
    let mut config = test_config();
    config.limits.rate_limit_max_calls = 1;
    let env = TestEnv::with_config(config);
    let contest = env.publish(raffle_draft(1)).await.unwrap();
    env.join_users(contest.id, &[1]).await;

    let draws = DrawService::new(&env.ctx);
    let first = draws.draw(OWNER, contest.id).await.unwrap();
    assert!(matches!(first, DrawOutcome::Finalized(_)));

    for _ in 0..2 {
        let retry = draws.draw(OWNER, contest.id).await.unwrap();
        assert_eq!(retry, DrawOutcome::AlreadyClosed);
    }
}

#[tokio::test]
async fn test_draw_without_participants_keeps_contest_open() {
    let env = TestEnv::new();
    let contest = env.publish(raffle_draft(1)).await.unwrap();

    let result = DrawService::new(&env.ctx).draw(OWNER, contest.id).await;
    assert!(matches!(
        result,
        Err(ServiceError::Domain(DomainError::NoParticipants))
    ));

    let contest = ContestService::new(&env.ctx).get(contest.id).await.unwrap();
    assert_eq!(contest.status(), ContestStatus::Open);
}

#[tokio::test]
async fn test_draw_requires_manager() {
    let env = TestEnv::new();
    let contest = env.publish(raffle_draft(1)).await.unwrap();
    env.join_users(contest.id, &[1]).await;

    let result = DrawService::new(&env.ctx).draw(UserId::new(1), contest.id).await;
    assert!(matches!(
        result,
        Err(ServiceError::Domain(DomainError::NotContestOwner))
    ));
}

#[tokio::test]
async fn test_exclude_leavers() {
    let env = TestEnv::new();
    let draft = gated_draft(raffle_draft(3), ContestFlags::EXCLUDE_LEAVERS, Vec::new());
    let contest = env.publish(draft).await.unwrap();
    env.join_users(contest.id, &[1, 2, 3]).await;
    env.platform
        .set_member(CHANNEL, UserId::new(2), MemberStatus::Left);

    let DrawOutcome::Finalized(result) = DrawService::new(&env.ctx)
        .draw(OWNER, contest.id)
        .await
        .unwrap()
    else {
        panic!("expected the draw to finalize");
    };

    assert_eq!(result.winners.len(), 2);
    assert!(result.winners.iter().all(|w| w.user_id != UserId::new(2)));
}

#[tokio::test]
async fn test_blocked_winner_is_reported() {
    let env = TestEnv::new();
    let contest = env.publish(raffle_draft(1)).await.unwrap();
    env.join_users(contest.id, &[1]).await;
    env.platform.block(UserId::new(1));

    let DrawOutcome::Finalized(result) = DrawService::new(&env.ctx)
        .draw(OWNER, contest.id)
        .await
        .unwrap()
    else {
        panic!("expected the draw to finalize");
    };

    assert_eq!(result.unreachable, vec![UserId::new(1)]);
    assert!(env
        .platform
        .messages_to(CHANNEL)
        .iter()
        .any(|m| m.contains("is closed")));
}

#[tokio::test]
async fn test_concurrent_draws_finalize_once() {
    let mut config = test_config();
    config.limits.draw_countdown_secs = 1;
    let env = TestEnv::with_config(config);
    let contest = env.publish(raffle_draft(1)).await.unwrap();
    env.join_users(contest.id, &[1, 2, 3]).await;

    let first = DrawService::new(&env.ctx);
    let second = DrawService::new(&env.ctx);
    let (a, b) = tokio::join!(
        first.draw(OWNER, contest.id),
        second.draw(OWNER, contest.id)
    );
    let outcomes = [a.unwrap(), b.unwrap()];

    let finalized = outcomes
        .iter()
        .filter(|o| matches!(o, DrawOutcome::Finalized(_)))
        .count();
    assert_eq!(finalized, 1);
    assert!(outcomes
        .iter()
        .any(|o| matches!(o, DrawOutcome::InProgress | DrawOutcome::AlreadyClosed)));

    let announcements = env
        .platform
        .messages_to(CHANNEL)
        .into_iter()
        .filter(|m| m.contains("is closed"))
        .count();
    assert_eq!(announcements, 1);
    assert_eq!(
        ContestService::new(&env.ctx)
            .winners(contest.id)
            .await
            .unwrap()
            .len(),
        1
    );
}

#[tokio::test]
async fn test_rate_limit() {
    let mut config = test_config();
    config.limits.rate_limit_max_calls = 2;
    let env = TestEnv::with_config(config);
    let contest = env.publish(raffle_draft(1)).await.unwrap();
    let contests = ContestService::new(&env.ctx);

    contests.join(&applicant(1), contest.id).await.unwrap();
    contests.join(&applicant(1), contest.id).await.unwrap();
    let third = contests.join(&applicant(1), contest.id).await;

    let err = third.unwrap_err();
    assert_eq!(err.error_code(), "SLOW_DOWN");
    assert!(err.is_retryable());

    // Limits are per user
    let other = contests.join(&applicant(2), contest.id).await;
    assert!(other.is_ok());
}
