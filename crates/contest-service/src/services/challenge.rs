//! Anti-automation arithmetic challenge
//!
//! A pending challenge is single use and short lived. Solving it marks the
//! (contest, user) pair as passed for a while so the user is not asked again
//! on every click.

use std::time::Duration;

use contest_core::{ContestId, UserId};
use rand::rngs::OsRng;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use tracing::{debug, instrument};

use super::context::ServiceContext;
use super::error::ServiceResult;
use super::keys;

/// How long a presented challenge may be answered
pub const CHALLENGE_TTL: Duration = Duration::from_secs(120);

/// How long a solved challenge exempts the user
pub const PASSED_TTL: Duration = Duration::from_secs(600);

const OPTION_COUNT: usize = 4;
const MAX_OPTION: u8 = 20;

/// Challenge shown to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Challenge {
    pub left: u8,
    pub right: u8,
    /// Four distinct candidates in ascending order, one of them the sum
    pub options: Vec<u8>,
}

impl Challenge {
    /// Generate a fresh challenge from the OS random source
    pub fn generate() -> Self {
        let mut rng = OsRng;
        let left = rng.gen_range(1..=10u8);
        let right = rng.gen_range(1..=10u8);
        let answer = left + right;

        let mut candidates: Vec<u8> = (1..=MAX_OPTION).filter(|n| *n != answer).collect();
        candidates.shuffle(&mut rng);

        let mut options: Vec<u8> = candidates.into_iter().take(OPTION_COUNT - 1).collect();
        options.push(answer);
        options.sort_unstable();

        Self {
            left,
            right,
            options,
        }
    }

    pub fn answer(&self) -> u8 {
        self.left + self.right
    }

    pub fn question(&self) -> String {
        format!("{} + {} = ?", self.left, self.right)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChallengeResult {
    Passed,
    Failed,
    /// No pending challenge: it expired or was already answered
    Expired,
}

/// Challenge service
pub struct ChallengeService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> ChallengeService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Whether the user solved a challenge for this contest recently
    pub async fn has_passed(&self, contest: ContestId, user: UserId) -> ServiceResult<bool> {
        Ok(self
            .ctx
            .ephemeral()
            .get(&keys::challenge_passed(contest, user))
            .await?
            .is_some())
    }

    /// Create a challenge and remember its answer, replacing any pending one
    #[instrument(skip(self))]
    pub async fn issue(&self, contest: ContestId, user: UserId) -> ServiceResult<Challenge> {
        let challenge = Challenge::generate();
        self.ctx
            .ephemeral()
            .set_ex(
                &keys::challenge(contest, user),
                &challenge.answer().to_string(),
                CHALLENGE_TTL,
            )
            .await?;
        Ok(challenge)
    }

    /// Check an answer; the pending challenge is consumed either way
    #[instrument(skip(self))]
    pub async fn answer(
        &self,
        contest: ContestId,
        user: UserId,
        answer: u8,
    ) -> ServiceResult<ChallengeResult> {
        let Some(expected) = self
            .ctx
            .ephemeral()
            .take(&keys::challenge(contest, user))
            .await?
        else {
            return Ok(ChallengeResult::Expired);
        };

        if expected.parse::<u8>().ok() != Some(answer) {
            debug!("Challenge failed");
            return Ok(ChallengeResult::Failed);
        }

        self.ctx
            .ephemeral()
            .set_ex(&keys::challenge_passed(contest, user), "1", PASSED_TTL)
            .await?;
        Ok(ChallengeResult::Passed)
    }
}
