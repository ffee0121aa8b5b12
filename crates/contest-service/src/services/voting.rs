//! Voting tally
//!
//! Contestants register in VOTE and REACTION contests; voters add normal or
//! star-weighted votes. The vote record and the entry counters change in one
//! storage transaction.

use contest_core::draw::{rank, RankBy};
use contest_core::entities::{Applicant, Contest, Entry, NewVote, VoteKind, VoteSettings};
use contest_core::{ContestId, DomainError, EntryId, UserId, VoteRecord};
use tracing::{debug, info, instrument};

use super::challenge::Challenge;
use super::contest::{ContestService, JoinOutcome};
use super::context::ServiceContext;
use super::eligibility::{DenyReason, Eligibility, EligibilityService};
use super::error::{ServiceError, ServiceResult};
use super::ratelimit::RateLimiter;

/// Result of a vote
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoteOutcome {
    /// Carries the entry with updated counters
    Recorded(Entry),
    AlreadyVoted,
    Denied(DenyReason),
    Challenge(Challenge),
}

/// Duplicate-vote policy for one vote: (enforce_single, claims_guard)
///
/// Under `prevent_multiple_votes` a normal vote is rejected when the voter
/// already holds the contest-wide guard. Normal votes always take the guard;
/// weighted votes take it only when they count as a vote.
pub fn vote_policy(settings: &VoteSettings, kind: VoteKind) -> (bool, bool) {
    let prevent = settings.prevent_multiple_votes;
    let normal = !kind.is_weighted();
    (
        prevent && normal,
        prevent && (normal || settings.weighted_counts_as_vote),
    )
}

/// Voting service
pub struct VotingService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> VotingService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Register the applicant as a contestant; idempotent
    #[instrument(skip(self, applicant), fields(user_id = %applicant.id))]
    pub async fn register_contestant(
        &self,
        applicant: &Applicant,
        contest_id: ContestId,
    ) -> ServiceResult<JoinOutcome> {
        let contests = ContestService::new(self.ctx);
        let contest = contests.get(contest_id).await?;
        settings_of(&contest)?;
        contests.join(applicant, contest_id).await
    }

    /// A voter's normal vote, after the eligibility gate
    #[instrument(skip(self, voter), fields(voter_id = %voter.id))]
    pub async fn vote(
        &self,
        voter: &Applicant,
        contest_id: ContestId,
        entry_id: EntryId,
    ) -> ServiceResult<VoteOutcome> {
        RateLimiter::new(self.ctx).check(voter.id, "vote").await?;

        let contest = ContestService::new(self.ctx).get(contest_id).await?;
        let settings = settings_of(&contest)?;
        if !settings.mode.allows_normal() {
            return Err(DomainError::VoteModeNotAllowed("normal").into());
        }

        match EligibilityService::new(self.ctx).check(voter, &contest).await? {
            Eligibility::Allowed => {}
            Eligibility::Denied(reason) => return Ok(VoteOutcome::Denied(reason)),
            Eligibility::Challenge(challenge) => return Ok(VoteOutcome::Challenge(challenge)),
        }

        self.add_vote(&contest, entry_id, voter.id, VoteKind::Normal)
            .await
    }

    /// Paid vote, after a confirmed payment
    ///
    /// Weighted votes are never capped per voter.
    #[instrument(skip(self))]
    pub async fn add_weighted_vote(
        &self,
        contest_id: ContestId,
        entry_id: EntryId,
        voter: UserId,
        stars: i64,
    ) -> ServiceResult<VoteOutcome> {
        if stars <= 0 {
            return Err(ServiceError::validation("stars must be positive"));
        }
        let contest = ContestService::new(self.ctx).get(contest_id).await?;
        self.add_vote(&contest, entry_id, voter, VoteKind::Weighted { stars })
            .await
    }

    /// Record a vote under the contest's tally rules
    ///
    /// Fails when the contest's vote mode does not accept `kind`.
    #[instrument(skip(self, contest), fields(contest_id = %contest.id))]
    pub async fn add_vote(
        &self,
        contest: &Contest,
        entry_id: EntryId,
        voter: UserId,
        kind: VoteKind,
    ) -> ServiceResult<VoteOutcome> {
        let settings = settings_of(contest)?;
        let allowed = match kind {
            VoteKind::Normal => settings.mode.allows_normal(),
            VoteKind::Weighted { .. } => settings.mode.allows_weighted(),
        };
        if !allowed {
            let mode = if kind.is_weighted() { "weighted" } else { "normal" };
            return Err(DomainError::VoteModeNotAllowed(mode).into());
        }

        let entry = self
            .ctx
            .entry_repo()
            .find_by_id(entry_id)
            .await?
            .filter(|e| e.contest_id == contest.id)
            .ok_or(DomainError::EntryNotFound)?;

        let weight = kind.weight(settings.exchange_ratio)?;
        let (enforce_single, claims_guard) = vote_policy(&settings, kind);
        let vote = NewVote {
            contest_id: contest.id,
            entry_id: entry.id,
            voter_id: voter,
            kind,
            exchange_ratio: settings.exchange_ratio,
            enforce_single,
            claims_guard,
        };

        match self.ctx.vote_repo().record(&vote).await {
            Ok(VoteRecord::Recorded(entry)) => {
                info!(
                    entry_id = %entry.id,
                    voter_id = %voter,
                    weight,
                    votes = entry.votes,
                    "Vote recorded"
                );
                Ok(VoteOutcome::Recorded(entry))
            }
            Ok(VoteRecord::AlreadyVoted) => {
                debug!(voter_id = %voter, "Repeat vote rejected");
                Ok(VoteOutcome::AlreadyVoted)
            }
            Err(DomainError::ContestClosed) => Ok(VoteOutcome::Denied(DenyReason::ContestClosed)),
            Err(e) => Err(e.into()),
        }
    }

    /// Top `limit` entries by the counter the contest is ranked by
    #[instrument(skip(self))]
    pub async fn leaderboard(&self, contest_id: ContestId, limit: usize) -> ServiceResult<Vec<Entry>> {
        let contest = ContestService::new(self.ctx).get(contest_id).await?;
        let by = RankBy::for_kind(&contest.kind).unwrap_or(RankBy::Votes);
        let entries = self.ctx.entry_repo().list_by_contest(contest_id).await?;
        Ok(rank(entries, by, limit))
    }

    /// Stars received by all entries of a contest
    #[instrument(skip(self))]
    pub async fn total_stars(&self, contest_id: ContestId) -> ServiceResult<i64> {
        Ok(self.ctx.entry_repo().total_stars(contest_id).await?)
    }
}

fn settings_of(contest: &Contest) -> ServiceResult<VoteSettings> {
    contest.kind.vote_settings().ok_or_else(|| {
        DomainError::WrongContestKind {
            expected: "vote",
            actual: contest.kind.name(),
        }
        .into()
    })
}
