//! Repository traits (ports) - define the interface for data access
//!
//! The domain layer defines what it needs, and the infrastructure layer
//! provides the implementation. Every uniqueness rule (one entry per user,
//! one strict vote per voter, one lock per contest) is enforced by the
//! implementation atomically, never by a read-then-write in the caller.

use std::time::Duration;

use async_trait::async_trait;

use crate::entities::{
    ChannelLink, Contest, EntitlementRecord, Entry, Gate, GateSpec, NewContest, NewEntry,
    NewPurchase, NewQuestion, NewVote, Purchase, Question, User, Winner,
};
use crate::error::DomainError;
use crate::value_objects::{ChatId, ContestId, EntryId, MessageId, QuestionId, UserId};

/// Result type for repository operations
pub type RepoResult<T> = Result<T, DomainError>;

/// Outcome of an idempotent insert
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Insertion<T> {
    Created(T),
    Existing(T),
}

impl<T> Insertion<T> {
    pub fn into_inner(self) -> T {
        match self {
            Self::Created(v) | Self::Existing(v) => v,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }
}

/// Outcome of recording a vote
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoteRecord {
    /// Vote stored; carries the entry with updated counters
    Recorded(Entry),
    /// Rejected by the contest-wide duplicate guard
    AlreadyVoted,
}

// ============================================================================
// User Repository
// ============================================================================

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find user by ID
    async fn find_by_id(&self, id: UserId) -> RepoResult<Option<User>>;

    /// Insert the user unless it exists; returns whether it was inserted
    async fn create_if_absent(&self, user: &User) -> RepoResult<bool>;

    /// Add reward points
    async fn add_points(&self, id: UserId, points: i64) -> RepoResult<()>;

    /// Subtract points only if the balance covers them
    async fn spend_points(&self, id: UserId, points: i64) -> RepoResult<bool>;
}

// ============================================================================
// Channel Link Repository
// ============================================================================

#[async_trait]
pub trait ChannelLinkRepository: Send + Sync {
    async fn find(&self, owner_id: UserId, chat_id: ChatId) -> RepoResult<Option<ChannelLink>>;

    async fn list_by_owner(&self, owner_id: UserId) -> RepoResult<Vec<ChannelLink>>;

    /// Create the link, or refresh the cached title of an existing one
    async fn upsert(&self, link: &ChannelLink) -> RepoResult<()>;

    /// Returns whether a link was removed
    async fn delete(&self, owner_id: UserId, chat_id: ChatId) -> RepoResult<bool>;
}

// ============================================================================
// Contest Repository
// ============================================================================

#[async_trait]
pub trait ContestRepository: Send + Sync {
    async fn find_by_id(&self, id: ContestId) -> RepoResult<Option<Contest>>;

    async fn find_by_code(&self, code: &str) -> RepoResult<Option<Contest>>;

    async fn list_by_owner(&self, owner_id: UserId) -> RepoResult<Vec<Contest>>;

    /// Contests published in `chat_id` or using it as their discussion group
    async fn list_by_chat(&self, chat_id: ChatId) -> RepoResult<Vec<Contest>>;

    /// Insert an open contest together with its gates
    async fn create(&self, contest: &NewContest, gates: &[GateSpec]) -> RepoResult<Contest>;

    /// Remove a contest that was never published
    async fn delete(&self, id: ContestId) -> RepoResult<()>;

    async fn set_message_id(&self, id: ContestId, message_id: MessageId) -> RepoResult<()>;

    /// Toggle participation; returns false when the contest is already closed
    async fn set_open(&self, id: ContestId, is_open: bool) -> RepoResult<bool>;

    /// Close the contest and store its winners, only if it is not closed yet
    ///
    /// Returns false when another run already finalized it.
    async fn finalize(&self, id: ContestId, winners: &[Winner]) -> RepoResult<bool>;

    async fn winners(&self, id: ContestId) -> RepoResult<Vec<Winner>>;
}

// ============================================================================
// Gate Repository
// ============================================================================

#[async_trait]
pub trait GateRepository: Send + Sync {
    async fn list_by_contest(&self, contest_id: ContestId) -> RepoResult<Vec<Gate>>;
}

// ============================================================================
// Entry Repository
// ============================================================================

#[async_trait]
pub trait EntryRepository: Send + Sync {
    async fn find(&self, contest_id: ContestId, user_id: UserId) -> RepoResult<Option<Entry>>;

    async fn find_by_id(&self, id: EntryId) -> RepoResult<Option<Entry>>;

    async fn find_by_code(&self, contest_id: ContestId, code: &str) -> RepoResult<Option<Entry>>;

    /// Case-insensitive display name lookup
    async fn find_by_name(&self, contest_id: ContestId, name: &str) -> RepoResult<Option<Entry>>;

    /// Insert the entry unless (contest, user) exists
    ///
    /// Fails with `ContestClosed` once the contest is finalized.
    async fn join(&self, entry: &NewEntry) -> RepoResult<Insertion<Entry>>;

    /// All entries in registration order
    async fn list_by_contest(&self, contest_id: ContestId) -> RepoResult<Vec<Entry>>;

    async fn count(&self, contest_id: ContestId) -> RepoResult<i64>;

    /// Add quiz points; fails with `ContestClosed` once the contest is finalized
    async fn add_score(&self, id: EntryId, points: i64) -> RepoResult<Entry>;

    async fn total_stars(&self, contest_id: ContestId) -> RepoResult<i64>;
}

// ============================================================================
// Vote Repository
// ============================================================================

#[async_trait]
pub trait VoteRepository: Send + Sync {
    /// Store the vote and update the entry counters in one transaction
    ///
    /// Fails with `ContestClosed` once the contest is finalized.
    async fn record(&self, vote: &NewVote) -> RepoResult<VoteRecord>;

    /// Whether `voter_id` voted for the entry with `entry_code`
    async fn has_voted_for(
        &self,
        contest_id: ContestId,
        entry_code: &str,
        voter_id: UserId,
    ) -> RepoResult<bool>;
}

// ============================================================================
// Entitlement Repository
// ============================================================================

#[async_trait]
pub trait EntitlementRepository: Send + Sync {
    async fn find(&self, user_id: UserId, feature: &str) -> RepoResult<Option<EntitlementRecord>>;

    /// Extend (or start) the time-boxed grant, stacking from the later of expiry and now
    async fn grant_monthly(
        &self,
        user_id: UserId,
        feature: &str,
        days: i64,
    ) -> RepoResult<EntitlementRecord>;

    async fn grant_one_time(
        &self,
        user_id: UserId,
        feature: &str,
        credits: i64,
    ) -> RepoResult<EntitlementRecord>;

    /// Take one credit if no running grant covers the feature; returns whether one was taken
    async fn consume_one_time(&self, user_id: UserId, feature: &str) -> RepoResult<bool>;
}

// ============================================================================
// Question Repository
// ============================================================================

#[async_trait]
pub trait QuestionRepository: Send + Sync {
    async fn create(&self, question: &NewQuestion) -> RepoResult<Question>;

    async fn find_by_id(&self, id: QuestionId) -> RepoResult<Option<Question>>;

    /// Contest-specific questions first, then shared ones
    async fn list_for_contest(&self, contest_id: ContestId, limit: i64) -> RepoResult<Vec<Question>>;
}

// ============================================================================
// Draw Lock Repository
// ============================================================================

#[async_trait]
pub trait DrawLockRepository: Send + Sync {
    /// Atomically take the lock for `contest_id`
    ///
    /// A lock held longer than `stale_after` may be taken over.
    async fn try_acquire(
        &self,
        contest_id: ContestId,
        holder: &str,
        stale_after: Duration,
    ) -> RepoResult<bool>;

    /// Release the lock if `holder` still owns it
    async fn release(&self, contest_id: ContestId, holder: &str) -> RepoResult<()>;
}

// ============================================================================
// Purchase Repository
// ============================================================================

#[async_trait]
pub trait PurchaseRepository: Send + Sync {
    async fn record(&self, purchase: &NewPurchase) -> RepoResult<Purchase>;

    async fn list_needing_review(&self) -> RepoResult<Vec<Purchase>>;
}

// ============================================================================
// Settings Repository
// ============================================================================

#[async_trait]
pub trait SettingsRepository: Send + Sync {
    async fn get(&self, key: &str) -> RepoResult<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> RepoResult<()>;
}
