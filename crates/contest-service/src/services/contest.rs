//! Contest service
//!
//! Creation, publication, pause/resume, participation and lookups. Closing a
//! contest is the draw service's job.

use contest_core::entities::{
    generate_contest_code, Access, Applicant, Contest, ContestDraft, ContestStatus, Entry, Gate, GateKind,
    GateSpec, LifecycleAction, NewEntry, Winner, GATE_FEATURE,
};
use contest_core::{ChatId, ContestId, DomainError, Insertion, MessageId, UserId};
use tracing::{info, instrument, warn};

use super::channel_link::ChannelLinkService;
use super::challenge::Challenge;
use super::context::ServiceContext;
use super::eligibility::{DenyReason, Eligibility, EligibilityService};
use super::entitlement::EntitlementService;
use super::error::{ServiceError, ServiceResult};
use super::ratelimit::RateLimiter;

/// Attempts at finding a free contest code
const CODE_ATTEMPTS: usize = 5;

/// Replaces the post of a contest removed right after publishing
const WITHDRAWN_POST: &str = "This giveaway was withdrawn.";

/// Result of a join request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinOutcome {
    Joined(Entry),
    /// The user was already in; nothing changed
    AlreadyJoined(Entry),
    Denied(DenyReason),
    Challenge(Challenge),
}

/// Contest service
pub struct ContestService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> ContestService<'a> {
    /// Create a new ContestService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Create and publish a contest from a confirmed draft
    ///
    /// The owner must have linked the destination. Membership gates need the
    /// premium entitlement; a one-time credit is only taken once the post is
    /// out. If publishing fails the contest is removed again.
    #[instrument(skip(self, draft), fields(kind = draft.kind.name()))]
    pub async fn create(&self, owner: UserId, draft: ContestDraft) -> ServiceResult<Contest> {
        let links = ChannelLinkService::new(self.ctx);
        links.require_link(owner, draft.destination.channel_id).await?;
        if let Some(group) = draft.destination.group_id {
            links.require_link(owner, group).await?;
        }

        let premium = draft.has_premium_gates();
        let entitlements = EntitlementService::new(self.ctx);
        if premium && !entitlements.has_access(owner, GATE_FEATURE, false).await? {
            return Err(DomainError::PremiumRequired.into());
        }

        let mut gates = draft.gates.clone();
        self.attach_invite_links(&mut gates).await;

        let contest = self.insert_with_fresh_code(owner, draft, &gates).await?;

        let post = render_post(&contest, 0);
        let message_id = match self.ctx.platform().send_message(contest.channel_id, &post).await {
            Ok(message_id) => message_id,
            Err(e) => {
                warn!(contest_id = %contest.id, error = %e, "Publishing failed, removing contest");
                self.ctx.contest_repo().delete(contest.id).await?;
                return Err(e.into());
            }
        };
        self.ctx
            .contest_repo()
            .set_message_id(contest.id, message_id)
            .await?;

        if premium && !self.settle_premium(owner).await? {
            // The last credit went to a concurrent publication
            warn!(
                owner_id = %owner,
                contest_id = %contest.id,
                "Premium credit already spent, withdrawing"
            );
            self.withdraw(&contest, message_id).await?;
            return Err(DomainError::PremiumRequired.into());
        }

        info!(
            contest_id = %contest.id,
            code = %contest.code,
            owner_id = %owner,
            channel_id = %contest.channel_id,
            "Contest published"
        );

        Ok(Contest {
            message_id: Some(message_id),
            ..contest
        })
    }

    /// Take the credit for a published premium contest
    ///
    /// A subscription that started meanwhile also covers it.
    async fn settle_premium(&self, owner: UserId) -> ServiceResult<bool> {
        let entitlements = EntitlementService::new(self.ctx);
        if entitlements.has_access(owner, GATE_FEATURE, true).await? {
            return Ok(true);
        }
        Ok(matches!(
            entitlements.access(owner, GATE_FEATURE).await?,
            Access::Subscription { .. }
        ))
    }

    /// Remove a published contest and mark its post as withdrawn
    async fn withdraw(&self, contest: &Contest, message_id: MessageId) -> ServiceResult<()> {
        self.ctx.contest_repo().delete(contest.id).await?;
        if let Err(e) = self
            .ctx
            .platform()
            .edit_message(contest.channel_id, message_id, WITHDRAWN_POST)
            .await
        {
            warn!(contest_id = %contest.id, error = %e, "Could not mark post as withdrawn");
        }
        Ok(())
    }

    async fn insert_with_fresh_code(
        &self,
        owner: UserId,
        draft: ContestDraft,
        gates: &[GateSpec],
    ) -> ServiceResult<Contest> {
        for _ in 0..CODE_ATTEMPTS {
            let (new_contest, _) = draft.clone().into_new_contest(owner, generate_contest_code());
            new_contest.validate()?;
            match self.ctx.contest_repo().create(&new_contest, gates).await {
                Ok(contest) => return Ok(contest),
                Err(DomainError::ContestCodeExists) => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Err(ServiceError::internal("could not allocate a contest code"))
    }

    async fn attach_invite_links(&self, gates: &mut [GateSpec]) {
        for gate in gates.iter_mut().filter(|g| g.invite_link.is_none()) {
            let chat = match gate.kind {
                GateKind::ChannelMembership { chat_id } | GateKind::GroupMembership { chat_id } => {
                    chat_id
                }
                _ => continue,
            };
            match self.ctx.platform().create_invite_link(chat).await {
                Ok(link) => gate.invite_link = Some(link),
                Err(e) => warn!(chat_id = %chat, error = %e, "Could not create invite link"),
            }
        }
    }

    /// Pause or resume participation
    ///
    /// Allowed for the owner and for administrators of the contest chat.
    /// Repeating the current state is a no-op.
    #[instrument(skip(self))]
    pub async fn set_status(
        &self,
        actor: UserId,
        id: ContestId,
        action: LifecycleAction,
    ) -> ServiceResult<Contest> {
        if action == LifecycleAction::Finalize {
            return Err(ServiceError::validation("contests are closed by drawing winners"));
        }
        RateLimiter::new(self.ctx).check(actor, "status").await?;

        let contest = self.get(id).await?;
        self.require_manager(actor, &contest).await?;

        let current = contest.status();
        let next = current.apply(action)?;
        if next == current {
            return Ok(contest);
        }

        let is_open = next == ContestStatus::Open;
        if !self.ctx.contest_repo().set_open(id, is_open).await? {
            return Err(DomainError::ContestClosed.into());
        }
        info!(contest_id = %id, status = next.as_str(), "Contest status changed");

        let contest = Contest { is_open, ..contest };
        self.refresh_post(&contest).await;
        Ok(contest)
    }

    /// Join a contest
    ///
    /// Joining twice returns the existing entry.
    #[instrument(skip(self, applicant), fields(user_id = %applicant.id))]
    pub async fn join(&self, applicant: &Applicant, id: ContestId) -> ServiceResult<JoinOutcome> {
        RateLimiter::new(self.ctx).check(applicant.id, "join").await?;

        let contest = self.get(id).await?;
        if contest.is_closed() {
            return Ok(JoinOutcome::Denied(DenyReason::ContestClosed));
        }
        if let Some(entry) = self.ctx.entry_repo().find(id, applicant.id).await? {
            return Ok(JoinOutcome::AlreadyJoined(entry));
        }

        match EligibilityService::new(self.ctx).check(applicant, &contest).await? {
            Eligibility::Allowed => {}
            Eligibility::Denied(reason) => return Ok(JoinOutcome::Denied(reason)),
            Eligibility::Challenge(challenge) => return Ok(JoinOutcome::Challenge(challenge)),
        }

        let new_entry = NewEntry::new(id, applicant.id, applicant.display_name.clone());
        match self.ctx.entry_repo().join(&new_entry).await {
            Ok(Insertion::Created(entry)) => {
                info!(contest_id = %id, entry_id = %entry.id, "Entry created");
                self.refresh_post(&contest).await;
                Ok(JoinOutcome::Joined(entry))
            }
            Ok(Insertion::Existing(entry)) => Ok(JoinOutcome::AlreadyJoined(entry)),
            Err(DomainError::ContestClosed) => Ok(JoinOutcome::Denied(DenyReason::ContestClosed)),
            Err(e) => Err(e.into()),
        }
    }

    /// Get a contest by id
    #[instrument(skip(self))]
    pub async fn get(&self, id: ContestId) -> ServiceResult<Contest> {
        self.ctx
            .contest_repo()
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::ContestNotFound(id).into())
    }

    /// Get a contest by its shareable code
    #[instrument(skip(self))]
    pub async fn get_by_code(&self, code: &str) -> ServiceResult<Contest> {
        self.ctx
            .contest_repo()
            .find_by_code(code)
            .await?
            .ok_or_else(|| DomainError::ContestCodeNotFound(code.to_string()).into())
    }

    #[instrument(skip(self))]
    pub async fn list_by_owner(&self, owner: UserId) -> ServiceResult<Vec<Contest>> {
        Ok(self.ctx.contest_repo().list_by_owner(owner).await?)
    }

    #[instrument(skip(self))]
    pub async fn list_by_channel(&self, chat: ChatId) -> ServiceResult<Vec<Contest>> {
        Ok(self.ctx.contest_repo().list_by_chat(chat).await?)
    }

    /// Stored winners, in announcement order
    #[instrument(skip(self))]
    pub async fn winners(&self, id: ContestId) -> ServiceResult<Vec<Winner>> {
        Ok(self.ctx.contest_repo().winners(id).await?)
    }

    #[instrument(skip(self))]
    pub async fn gates(&self, id: ContestId) -> ServiceResult<Vec<Gate>> {
        Ok(self.ctx.gate_repo().list_by_contest(id).await?)
    }

    /// Fail unless `actor` owns the contest or administers its chat
    pub async fn require_manager(&self, actor: UserId, contest: &Contest) -> ServiceResult<()> {
        if contest.owner_id == actor {
            return Ok(());
        }
        match self
            .ctx
            .platform()
            .get_membership_status(contest.channel_id, actor)
            .await
        {
            Ok(status) if status.is_admin() => Ok(()),
            Ok(_) => Err(DomainError::NotContestOwner.into()),
            Err(e) => {
                warn!(contest_id = %contest.id, error = %e, "Admin lookup failed");
                Err(DomainError::NotContestOwner.into())
            }
        }
    }

    /// Edit the published post with the current count and status
    ///
    /// Failures are logged; the caller's change stands.
    pub async fn refresh_post(&self, contest: &Contest) {
        let Some(message_id) = contest.message_id else {
            return;
        };
        let count = match self.ctx.entry_repo().count(contest.id).await {
            Ok(count) => count,
            Err(e) => {
                warn!(contest_id = %contest.id, error = %e, "Could not count entries");
                return;
            }
        };
        if let Err(e) = self
            .ctx
            .platform()
            .edit_message(contest.channel_id, message_id, &render_post(contest, count))
            .await
        {
            warn!(contest_id = %contest.id, error = %e, "Could not edit contest post");
        }
    }
}

/// Text of the contest post
pub fn render_post(contest: &Contest, participants: i64) -> String {
    format!(
        "{}\n\nParticipants: {participants}\nWinners: {}\nStatus: {}\nCode: {}",
        contest.text,
        contest.winner_count,
        contest.status().as_str(),
        contest.code
    )
}
