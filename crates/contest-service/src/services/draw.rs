//! Draw service
//!
//! Closes a contest and picks its winners under a per-contest storage lock.
//! The lock is taken before participants are read and released on every
//! exit path; the closed check is repeated once the lock is held, and the
//! close itself is conditional, so a contest is finalized at most once.

use std::time::Duration;

use chrono::Utc;
use contest_core::draw::{rank, select, RankBy};
use contest_core::entities::{Contest, Entry, Winner};
use contest_core::{ChatId, ContestFlags, ContestId, DomainError, PlatformError, UserId};
use futures::future::join_all;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::contest::ContestService;
use super::context::ServiceContext;
use super::error::ServiceResult;
use super::quiz::QuizService;
use super::ratelimit::RateLimiter;

/// Sends per message before giving up on flood control
const MAX_SEND_ATTEMPTS: u32 = 3;

/// Longest flood-control wait honoured between attempts
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// A finalized contest with its winners
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawResult {
    pub contest: Contest,
    pub winners: Vec<Winner>,
    /// Winners who could not be notified privately
    pub unreachable: Vec<UserId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrawOutcome {
    Finalized(DrawResult),
    /// Another draw holds the lock
    InProgress,
    AlreadyClosed,
}

/// Draw service
pub struct DrawService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> DrawService<'a> {
    /// Create a new DrawService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Draw winners and close the contest
    ///
    /// # Errors
    /// Returns `NoParticipants` when nobody (eligible) entered; the contest
    /// stays open in that case.
    #[instrument(skip(self))]
    pub async fn draw(&self, actor: UserId, id: ContestId) -> ServiceResult<DrawOutcome> {
        let contests = ContestService::new(self.ctx);
        let contest = contests.get(id).await?;
        contests.require_manager(actor, &contest).await?;
        if contest.is_closed() {
            return Ok(DrawOutcome::AlreadyClosed);
        }

        let holder = Uuid::new_v4().to_string();
        let acquired = self
            .ctx
            .draw_lock_repo()
            .try_acquire(id, &holder, self.ctx.draw_lock_ttl())
            .await?;
        if !acquired {
            debug!(contest_id = %id, "Draw already running");
            return Ok(DrawOutcome::InProgress);
        }

        // Retries of a closed or running draw are answered above without
        // spending a rate-limit slot
        let result = match RateLimiter::new(self.ctx).check(actor, "draw").await {
            Ok(()) => self.finalize_locked(id).await,
            Err(e) => Err(e),
        };

        if let Err(e) = self.ctx.draw_lock_repo().release(id, &holder).await {
            warn!(contest_id = %id, error = %e, "Failed to release draw lock");
        }
        result
    }

    async fn finalize_locked(&self, id: ContestId) -> ServiceResult<DrawOutcome> {
        let contests = ContestService::new(self.ctx);
        let contest = contests.get(id).await?;
        if contest.is_closed() {
            return Ok(DrawOutcome::AlreadyClosed);
        }

        self.countdown(&contest).await;

        let entries = self.ctx.entry_repo().list_by_contest(id).await?;
        let picked = self.pick(&contest, entries).await?;

        let winners: Vec<Winner> = picked
            .into_iter()
            .zip(1u32..)
            .map(|(entry, position)| Winner {
                contest_id: id,
                position,
                entry_id: entry.id,
                user_id: entry.user_id,
                display_name: entry.display_name,
            })
            .collect();

        if !self.ctx.contest_repo().finalize(id, &winners).await? {
            return Ok(DrawOutcome::AlreadyClosed);
        }
        info!(contest_id = %id, winners = winners.len(), kind = contest.kind.name(), "Contest finalized");

        QuizService::new(self.ctx).stop(id);

        let contest = Contest {
            is_open: false,
            closed_at: Some(Utc::now()),
            ..contest
        };
        contests.refresh_post(&contest).await;
        let unreachable = self.announce(&contest, &winners).await;

        Ok(DrawOutcome::Finalized(DrawResult {
            contest,
            winners,
            unreachable,
        }))
    }

    /// Random draw for raffles, ranking for everything else
    async fn pick(&self, contest: &Contest, entries: Vec<Entry>) -> ServiceResult<Vec<Entry>> {
        let limit = contest.winner_count as usize;
        let picked = match RankBy::for_kind(&contest.kind) {
            Some(by) => rank(entries, by, limit),
            None => {
                let pool = if contest.has_flag(ContestFlags::EXCLUDE_LEAVERS) {
                    self.exclude_leavers(contest.channel_id, entries).await
                } else {
                    entries
                };
                select(&pool, limit)
            }
        };
        if picked.is_empty() {
            return Err(DomainError::NoParticipants.into());
        }
        Ok(picked)
    }

    /// Keep entries whose user is still a member; failed lookups count as left
    async fn exclude_leavers(&self, chat: ChatId, entries: Vec<Entry>) -> Vec<Entry> {
        let platform = self.ctx.platform();
        let statuses = join_all(
            entries
                .iter()
                .map(|e| platform.get_membership_status(chat, e.user_id)),
        )
        .await;

        let before = entries.len();
        let kept: Vec<Entry> = entries
            .into_iter()
            .zip(statuses)
            .filter_map(|(entry, status)| match status {
                Ok(status) if status.is_member() => Some(entry),
                Ok(_) => None,
                Err(e) => {
                    warn!(user_id = %entry.user_id, error = %e, "Membership lookup failed, excluding");
                    None
                }
            })
            .collect();
        debug!(before, after = kept.len(), "Leavers excluded");
        kept
    }

    async fn countdown(&self, contest: &Contest) {
        let secs = self.ctx.config().limits.draw_countdown_secs;
        if secs == 0 {
            return;
        }
        let text = format!("Drawing winners of {} in {secs} seconds...", contest.code);
        if let Err(e) = self.send(contest.channel_id, &text).await {
            warn!(contest_id = %contest.id, error = %e, "Countdown message failed");
        }
        tokio::time::sleep(Duration::from_secs(secs)).await;
    }

    /// Post the result and message every winner; returns who could not be reached
    async fn announce(&self, contest: &Contest, winners: &[Winner]) -> Vec<UserId> {
        if let Err(e) = self
            .send(contest.channel_id, &render_result(contest, winners))
            .await
        {
            warn!(contest_id = %contest.id, error = %e, "Result announcement failed");
        }

        let mut unreachable = Vec::new();
        for winner in winners {
            let text = format!(
                "You won place {} in contest {}!",
                winner.position, contest.code
            );
            match self.send(ChatId::private(winner.user_id), &text).await {
                Ok(()) => {}
                Err(e) if e.is_permanent() => {
                    info!(user_id = %winner.user_id, error = %e, "Winner unreachable, skipped");
                    unreachable.push(winner.user_id);
                }
                Err(e) => warn!(user_id = %winner.user_id, error = %e, "Winner notification failed"),
            }
        }
        unreachable
    }

    /// Send with bounded backoff on flood control
    async fn send(&self, chat: ChatId, text: &str) -> Result<(), PlatformError> {
        let mut attempt = 1;
        loop {
            match self.ctx.platform().send_message(chat, text).await {
                Ok(_) => return Ok(()),
                Err(PlatformError::RetryAfter(secs)) if attempt < MAX_SEND_ATTEMPTS => {
                    let wait = Duration::from_secs(secs).min(MAX_BACKOFF);
                    debug!(chat_id = %chat, attempt, wait_secs = wait.as_secs(), "Flood control, backing off");
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Text of the result announcement
pub fn render_result(contest: &Contest, winners: &[Winner]) -> String {
    let mut text = format!("Contest {} is closed. Winners:", contest.code);
    for winner in winners {
        text.push_str(&format!("\n{}. {}", winner.position, winner.display_name));
    }
    text
}
