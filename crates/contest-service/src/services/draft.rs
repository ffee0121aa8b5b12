//! Creation wizard sessions
//!
//! The wizard state of each owner lives in the ephemeral store as JSON and
//! expires after an hour of inactivity. Confirming hands the composed draft
//! to [`ContestService::create`].

use std::time::Duration;

use contest_core::entities::{Contest, DraftInput, DraftState};
use contest_core::UserId;
use tracing::{debug, instrument};

use super::contest::ContestService;
use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};
use super::keys;

/// Idle lifetime of a draft
pub const DRAFT_TTL: Duration = Duration::from_secs(3600);

/// Draft service
pub struct DraftService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> DraftService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Start a new draft, discarding any previous one
    #[instrument(skip(self))]
    pub async fn start(&self, owner: UserId) -> ServiceResult<DraftState> {
        let state = DraftState::default();
        self.save(owner, &state).await?;
        Ok(state)
    }

    /// The owner's draft, if one is in progress
    pub async fn current(&self, owner: UserId) -> ServiceResult<Option<DraftState>> {
        let Some(raw) = self.ctx.ephemeral().get(&keys::draft(owner)).await? else {
            return Ok(None);
        };
        let state = serde_json::from_str(&raw)
            .map_err(|e| ServiceError::internal(format!("corrupt draft: {e}")))?;
        Ok(Some(state))
    }

    /// Feed one wizard input
    ///
    /// A rejected input leaves the stored draft untouched.
    #[instrument(skip(self, input), fields(input = input.name()))]
    pub async fn apply(&self, owner: UserId, input: DraftInput) -> ServiceResult<DraftState> {
        let state = self
            .current(owner)
            .await?
            .ok_or_else(|| ServiceError::not_found("Draft", owner))?;

        let next = state.step(input)?;
        debug!(step = next.name(), "Draft advanced");
        self.save(owner, &next).await?;
        Ok(next)
    }

    /// Drop the owner's draft
    pub async fn cancel(&self, owner: UserId) -> ServiceResult<()> {
        Ok(self.ctx.ephemeral().delete(&keys::draft(owner)).await?)
    }

    /// Publish the confirmed draft
    ///
    /// The draft is removed only once the contest exists, so a failed
    /// publication can be retried.
    #[instrument(skip(self))]
    pub async fn confirm(&self, owner: UserId) -> ServiceResult<Contest> {
        let state = self
            .current(owner)
            .await?
            .ok_or_else(|| ServiceError::not_found("Draft", owner))?;
        let draft = state
            .draft()
            .cloned()
            .ok_or_else(|| ServiceError::validation("draft is not ready for confirmation"))?;

        let contest = ContestService::new(self.ctx).create(owner, draft).await?;
        self.cancel(owner).await?;
        Ok(contest)
    }

    async fn save(&self, owner: UserId, state: &DraftState) -> ServiceResult<()> {
        let raw = serde_json::to_string(state)
            .map_err(|e| ServiceError::internal(format!("draft encoding: {e}")))?;
        self.ctx
            .ephemeral()
            .set_ex(&keys::draft(owner), &raw, DRAFT_TTL)
            .await?;
        Ok(())
    }
}
