//! Eligibility gate
//!
//! Ordered, short-circuiting checks run before a join or vote. Nothing here
//! writes durable state; the only side effect is issuing a challenge.
//! Platform failures count as "not eligible".

use contest_core::entities::{Applicant, Contest, ContestStatus, Gate, GateKind};
use contest_core::{ChatId, ContestFlags, UserId};
use tracing::{debug, instrument, warn};

use super::challenge::{Challenge, ChallengeService};
use super::context::ServiceContext;
use super::error::ServiceResult;

/// Runtime setting overriding the configured base channel
pub const BASE_CHANNEL_SETTING: &str = "bot_base_channel";

/// Why a user may not take part
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DenyReason {
    ContestClosed,
    ContestPaused,
    PremiumAccountRequired,
    NotSubscribedToBase { chat_id: ChatId },
    NotSubscribedToTarget { chat_id: ChatId },
    GateUnmet {
        title: String,
        invite_link: Option<String>,
    },
}

impl DenyReason {
    pub fn code(&self) -> &'static str {
        match self {
            Self::ContestClosed => "CONTEST_CLOSED",
            Self::ContestPaused => "CONTEST_PAUSED",
            Self::PremiumAccountRequired => "PREMIUM_ACCOUNT_REQUIRED",
            Self::NotSubscribedToBase { .. } => "NOT_SUBSCRIBED_BASE",
            Self::NotSubscribedToTarget { .. } => "NOT_SUBSCRIBED_TARGET",
            Self::GateUnmet { .. } => "GATE_UNMET",
        }
    }
}

/// Result of an eligibility check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Eligibility {
    Allowed,
    Denied(DenyReason),
    /// Everything passed but the user must solve this first
    Challenge(Challenge),
}

/// Eligibility service
pub struct EligibilityService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> EligibilityService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Run every check for `applicant` against `contest`
    #[instrument(skip(self, applicant, contest), fields(user_id = %applicant.id, contest_id = %contest.id))]
    pub async fn check(&self, applicant: &Applicant, contest: &Contest) -> ServiceResult<Eligibility> {
        let verdict = self.evaluate(applicant, contest).await?;
        if let Eligibility::Denied(reason) = &verdict {
            debug!(reason = reason.code(), "Not eligible");
        }
        Ok(verdict)
    }

    async fn evaluate(&self, applicant: &Applicant, contest: &Contest) -> ServiceResult<Eligibility> {
        match contest.status() {
            ContestStatus::Open => {}
            ContestStatus::Paused => return Ok(deny(DenyReason::ContestPaused)),
            ContestStatus::Closed => return Ok(deny(DenyReason::ContestClosed)),
        }

        if contest.has_flag(ContestFlags::PREMIUM_ONLY) && !applicant.is_premium {
            return Ok(deny(DenyReason::PremiumAccountRequired));
        }

        if !contest.has_flag(ContestFlags::SKIP_BASE_SUBSCRIPTION) {
            if let Some(base) = self.base_channel().await? {
                if !self.is_member(base, applicant.id).await {
                    return Ok(deny(DenyReason::NotSubscribedToBase { chat_id: base }));
                }
            }
        }

        if !contest.has_flag(ContestFlags::SKIP_TARGET_SUBSCRIPTION)
            && !self.is_member(contest.channel_id, applicant.id).await
        {
            return Ok(deny(DenyReason::NotSubscribedToTarget {
                chat_id: contest.channel_id,
            }));
        }

        let gates = self.ctx.gate_repo().list_by_contest(contest.id).await?;
        for gate in gates {
            if !self.gate_passes(&gate, applicant.id).await? {
                return Ok(deny(DenyReason::GateUnmet {
                    title: gate.title,
                    invite_link: gate.invite_link,
                }));
            }
        }

        if contest.has_flag(ContestFlags::ANTI_BOT) {
            let challenges = ChallengeService::new(self.ctx);
            if !challenges.has_passed(contest.id, applicant.id).await? {
                let challenge = challenges.issue(contest.id, applicant.id).await?;
                return Ok(Eligibility::Challenge(challenge));
            }
        }

        Ok(Eligibility::Allowed)
    }

    /// Evaluate a single gate
    pub async fn gate_passes(&self, gate: &Gate, user: UserId) -> ServiceResult<bool> {
        let passes = match &gate.kind {
            GateKind::ChannelMembership { chat_id } | GateKind::GroupMembership { chat_id } => {
                self.is_member(*chat_id, user).await
            }
            GateKind::JoinedContest { contest_id } => {
                self.ctx.entry_repo().find(*contest_id, user).await?.is_some()
            }
            GateKind::VotedForEntry {
                contest_id,
                entry_code,
            } => {
                self.ctx
                    .vote_repo()
                    .has_voted_for(*contest_id, entry_code, user)
                    .await?
            }
            GateKind::InteractionPoints {
                group_id,
                min_points,
            } => self
                .ctx
                .interaction()
                .points(*group_id, user)
                .await
                .is_some_and(|points| points >= *min_points),
        };
        Ok(passes)
    }

    /// Base channel from settings, else configuration
    pub async fn base_channel(&self) -> ServiceResult<Option<ChatId>> {
        if let Some(raw) = self.ctx.settings_repo().get(BASE_CHANNEL_SETTING).await? {
            match ChatId::parse(&raw) {
                Ok(chat) => return Ok(Some(chat)),
                Err(_) => warn!(value = %raw, "Ignoring malformed base channel setting"),
            }
        }
        Ok(self.ctx.config().bot.base_channel)
    }

    async fn is_member(&self, chat: ChatId, user: UserId) -> bool {
        match self.ctx.platform().get_membership_status(chat, user).await {
            Ok(status) => status.is_member(),
            Err(e) => {
                warn!(chat_id = %chat, user_id = %user, error = %e, "Membership lookup failed");
                false
            }
        }
    }
}

fn deny(reason: DenyReason) -> Eligibility {
    Eligibility::Denied(reason)
}
