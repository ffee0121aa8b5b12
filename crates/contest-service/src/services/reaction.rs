//! Keyword ("deserves it") votes in discussion groups

use contest_core::entities::{Contest, ContestKind, Entry, VoteKind};
use contest_core::{ChatId, UserId};
use tracing::{debug, instrument};

use super::context::ServiceContext;
use super::error::ServiceResult;
use super::voting::{VoteOutcome, VotingService};

/// Reaction service
pub struct ReactionService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> ReactionService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Handle a group message
    ///
    /// A message starting with a contest keyword votes for the author of the
    /// replied-to message, or else for the contestant named or coded after
    /// the keyword. Returns `None` when the message is not a vote.
    #[instrument(skip(self, text))]
    pub async fn handle_group_message(
        &self,
        group: ChatId,
        author: UserId,
        text: &str,
        reply_to: Option<UserId>,
    ) -> ServiceResult<Option<VoteOutcome>> {
        let Some((contest, rest)) = self.match_contest(group, text).await? else {
            return Ok(None);
        };

        let Some(target) = self.resolve_target(&contest, &rest, reply_to).await? else {
            debug!(contest_id = %contest.id, "Keyword without a known contestant");
            return Ok(None);
        };
        if target.user_id == author {
            debug!(contest_id = %contest.id, "Ignoring self vote");
            return Ok(None);
        }

        let outcome = VotingService::new(self.ctx)
            .add_vote(&contest, target.id, author, VoteKind::Normal)
            .await?;
        Ok(Some(outcome))
    }

    /// Open REACTION contest in `group` whose keyword starts `text`
    async fn match_contest(
        &self,
        group: ChatId,
        text: &str,
    ) -> ServiceResult<Option<(Contest, String)>> {
        let contests = self.ctx.contest_repo().list_by_chat(group).await?;
        Ok(contests
            .into_iter()
            .filter(|c| c.accepts_entries() && c.interaction_chat() == group)
            .find_map(|c| {
                let ContestKind::Reaction(settings) = &c.kind else {
                    return None;
                };
                let rest = settings.strip_keyword(text)?.to_string();
                Some((c, rest))
            }))
    }

    async fn resolve_target(
        &self,
        contest: &Contest,
        rest: &str,
        reply_to: Option<UserId>,
    ) -> ServiceResult<Option<Entry>> {
        let entries = self.ctx.entry_repo();
        if let Some(user) = reply_to {
            return Ok(entries.find(contest.id, user).await?);
        }
        let name = rest.trim_start_matches('@').trim();
        if name.is_empty() {
            return Ok(None);
        }
        if let Some(entry) = entries.find_by_code(contest.id, &name.to_uppercase()).await? {
            return Ok(Some(entry));
        }
        Ok(entries.find_by_name(contest.id, name).await?)
    }
}
