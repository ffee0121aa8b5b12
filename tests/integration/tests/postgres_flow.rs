//! PostgreSQL-backed flow tests
//!
//! These tests require:
//! - Running PostgreSQL instance
//! - Environment variable: DATABASE_URL
//!
//! Run with: cargo test -p integration-tests --test postgres_flow

use chrono::Utc;
use contest_core::{
    ChatId, ContestDraft, ContestFlags, ContestKind, ContestStatus, Destination, MemberStatus,
    UserId, VoteSettings,
};
use contest_service::services::{
    ChannelLinkService, ContestService, DrawOutcome, DrawService, JoinOutcome, UserService,
    VoteOutcome, VotingService,
};
use integration_tests::*;

/// Channel id that no earlier run used
fn fresh_chat() -> ChatId {
    ChatId::new(-(Utc::now().timestamp_micros() + unique_suffix()))
}

fn draft_in(channel: ChatId, kind: ContestKind, winner_count: u32) -> ContestDraft {
    ContestDraft {
        kind,
        destination: Destination {
            channel_id: channel,
            group_id: None,
        },
        text: "Integration giveaway".to_string(),
        gates: Vec::new(),
        winner_count,
        flags: ContestFlags::empty(),
    }
}

#[tokio::test]
async fn test_raffle_against_postgres() {
    if !check_test_env() {
        return;
    }

    let (ctx, platform) = postgres_env().await.expect("Failed to connect");
    let channel = fresh_chat();
    UserService::new(&ctx)
        .ensure_user(OWNER, "owner", None)
        .await
        .unwrap();
    platform.set_member(channel, OWNER, MemberStatus::Administrator);
    ChannelLinkService::new(&ctx)
        .link_channel(OWNER, channel)
        .await
        .unwrap();

    let contests = ContestService::new(&ctx);
    let contest = contests
        .create(OWNER, draft_in(channel, ContestKind::Raffle, 2))
        .await
        .unwrap();

    for id in 1..=3 {
        let user = applicant(id);
        platform.add_members(channel, &[user.id]);
        let outcome = contests.join(&user, contest.id).await.unwrap();
        assert!(matches!(outcome, JoinOutcome::Joined(_)));
    }
    let again = contests.join(&applicant(1), contest.id).await.unwrap();
    assert!(matches!(again, JoinOutcome::AlreadyJoined(_)));

    let draws = DrawService::new(&ctx);
    let DrawOutcome::Finalized(result) = draws.draw(OWNER, contest.id).await.unwrap() else {
        panic!("expected the draw to finalize");
    };
    assert_eq!(result.winners.len(), 2);
    assert_eq!(draws.draw(OWNER, contest.id).await.unwrap(), DrawOutcome::AlreadyClosed);

    let closed = contests.get(contest.id).await.unwrap();
    assert_eq!(closed.status(), ContestStatus::Closed);
    assert_eq!(contests.winners(contest.id).await.unwrap(), result.winners);
}

#[tokio::test]
async fn test_strict_votes_against_postgres() {
    if !check_test_env() {
        return;
    }

    let (ctx, platform) = postgres_env().await.expect("Failed to connect");
    let channel = fresh_chat();
    UserService::new(&ctx)
        .ensure_user(OWNER, "owner", None)
        .await
        .unwrap();
    platform.set_member(channel, OWNER, MemberStatus::Administrator);
    ChannelLinkService::new(&ctx)
        .link_channel(OWNER, channel)
        .await
        .unwrap();

    let contests = ContestService::new(&ctx);
    let contest = contests
        .create(
            OWNER,
            draft_in(channel, ContestKind::Vote(VoteSettings::default()), 1),
        )
        .await
        .unwrap();

    let voter = applicant(50);
    platform.add_members(channel, &[UserId::new(1), UserId::new(2), voter.id]);
    let JoinOutcome::Joined(x) = contests.join(&applicant(1), contest.id).await.unwrap() else {
        panic!("contestant could not join");
    };
    let JoinOutcome::Joined(y) = contests.join(&applicant(2), contest.id).await.unwrap() else {
        panic!("contestant could not join");
    };

    let voting = VotingService::new(&ctx);
    let (a, b) = tokio::join!(
        voting.vote(&voter, contest.id, x.id),
        voting.vote(&voter, contest.id, y.id)
    );
    let outcomes = [a.unwrap(), b.unwrap()];
    let recorded = outcomes
        .iter()
        .filter(|o| matches!(o, VoteOutcome::Recorded(_)))
        .count();
    assert_eq!(recorded, 1);
    assert!(outcomes.contains(&VoteOutcome::AlreadyVoted));
}
