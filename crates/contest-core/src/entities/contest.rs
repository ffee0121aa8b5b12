//! Contest aggregate - envelope shared by every kind plus kind-specific settings

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::value_objects::{ChatId, ContestFlags, ContestId, MessageId, UserId};

/// Maximum number of winners a contest may declare
pub const MAX_WINNERS: u32 = 100;

/// Maximum length of the contest post body, in characters
pub const MAX_TEXT_LEN: usize = 4096;

/// Length of the shareable contest code
pub const CONTEST_CODE_LEN: usize = 8;

// ============================================================================
// Kind
// ============================================================================

/// Which vote types a VOTE contest accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VoteMode {
    Normal,
    Weighted,
    #[default]
    Both,
}

impl VoteMode {
    pub fn allows_normal(self) -> bool {
        matches!(self, Self::Normal | Self::Both)
    }

    pub fn allows_weighted(self) -> bool {
        matches!(self, Self::Weighted | Self::Both)
    }
}

/// Tally rules of a VOTE contest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoteSettings {
    pub mode: VoteMode,
    /// One normal vote per voter per contest
    pub prevent_multiple_votes: bool,
    /// A weighted vote also counts as "already voted" for later normal votes
    pub weighted_counts_as_vote: bool,
    /// Votes credited per star on a weighted vote
    pub exchange_ratio: u32,
}

impl Default for VoteSettings {
    fn default() -> Self {
        Self {
            mode: VoteMode::Both,
            prevent_multiple_votes: true,
            weighted_counts_as_vote: false,
            exchange_ratio: 2,
        }
    }
}

/// Settings of a "deserves-it" keyword contest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReactionSettings {
    pub keywords: Vec<String>,
    pub prevent_multiple_votes: bool,
}

impl Default for ReactionSettings {
    fn default() -> Self {
        Self {
            keywords: vec!["يستحق".to_string()],
            prevent_multiple_votes: true,
        }
    }
}

impl ReactionSettings {
    /// Return the text after the first matching keyword, if the message starts with one
    pub fn strip_keyword<'a>(&self, text: &'a str) -> Option<&'a str> {
        let text = text.trim_start();
        self.keywords
            .iter()
            .filter(|k| !k.is_empty())
            .find_map(|k| text.strip_prefix(k.as_str()))
            .map(str::trim)
    }
}

/// Question runner settings of a QUIZ contest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuizSettings {
    pub question_count: u32,
    pub interval_secs: u64,
}

impl Default for QuizSettings {
    fn default() -> Self {
        Self {
            question_count: 10,
            interval_secs: 30,
        }
    }
}

/// Contest kind with its kind-specific settings
///
/// Fixed at creation. Serialized as a tagged JSON document so a RAFFLE can
/// never carry vote settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContestKind {
    Raffle,
    Vote(VoteSettings),
    Reaction(ReactionSettings),
    Quiz(QuizSettings),
}

impl ContestKind {
    /// Storage / log name of the kind
    pub fn name(&self) -> &'static str {
        match self {
            Self::Raffle => "raffle",
            Self::Vote(_) => "vote",
            Self::Reaction(_) => "reaction",
            Self::Quiz(_) => "quiz",
        }
    }

    /// Tally rules, for kinds that are decided by votes
    ///
    /// REACTION contests count keyword messages as normal votes.
    pub fn vote_settings(&self) -> Option<VoteSettings> {
        match self {
            Self::Vote(settings) => Some(settings.clone()),
            Self::Reaction(settings) => Some(VoteSettings {
                mode: VoteMode::Normal,
                prevent_multiple_votes: settings.prevent_multiple_votes,
                weighted_counts_as_vote: false,
                exchange_ratio: 1,
            }),
            Self::Raffle | Self::Quiz(_) => None,
        }
    }
}

// ============================================================================
// Lifecycle
// ============================================================================

/// Persisted lifecycle state; the draft phase lives outside storage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContestStatus {
    Open,
    Paused,
    Closed,
}

/// Transitions between persisted states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleAction {
    Pause,
    Resume,
    Finalize,
}

impl ContestStatus {
    /// Apply a lifecycle action
    ///
    /// Pausing a paused contest and resuming an open one are no-ops. Nothing
    /// leaves CLOSED.
    pub fn apply(self, action: LifecycleAction) -> Result<ContestStatus, DomainError> {
        match (self, action) {
            (Self::Closed, _) => Err(DomainError::ContestClosed),
            (Self::Open | Self::Paused, LifecycleAction::Pause) => Ok(Self::Paused),
            (Self::Open | Self::Paused, LifecycleAction::Resume) => Ok(Self::Open),
            (Self::Open | Self::Paused, LifecycleAction::Finalize) => Ok(Self::Closed),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Paused => "paused",
            Self::Closed => "closed",
        }
    }
}

// ============================================================================
// Contest
// ============================================================================

/// A published contest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contest {
    pub id: ContestId,
    pub owner_id: UserId,
    /// Channel (or group) the contest is published in
    pub channel_id: ChatId,
    /// Discussion group for REACTION and QUIZ contests
    pub group_id: Option<ChatId>,
    pub message_id: Option<MessageId>,
    pub code: String,
    pub kind: ContestKind,
    pub text: String,
    pub winner_count: u32,
    pub flags: ContestFlags,
    pub is_open: bool,
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

impl Contest {
    /// Lifecycle state derived from `is_open` and `closed_at`
    pub fn status(&self) -> ContestStatus {
        if self.closed_at.is_some() {
            ContestStatus::Closed
        } else if self.is_open {
            ContestStatus::Open
        } else {
            ContestStatus::Paused
        }
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.closed_at.is_some()
    }

    #[inline]
    pub fn accepts_entries(&self) -> bool {
        self.status() == ContestStatus::Open
    }

    /// Chat where participants interact (keyword messages, quiz answers)
    pub fn interaction_chat(&self) -> ChatId {
        self.group_id.unwrap_or(self.channel_id)
    }

    #[inline]
    pub fn has_flag(&self, flag: ContestFlags) -> bool {
        self.flags.contains(flag)
    }
}

/// Fields needed to insert a contest; storage assigns the id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewContest {
    pub owner_id: UserId,
    pub channel_id: ChatId,
    pub group_id: Option<ChatId>,
    pub code: String,
    pub kind: ContestKind,
    pub text: String,
    pub winner_count: u32,
    pub flags: ContestFlags,
}

impl NewContest {
    /// Check the field constraints shared by every contest kind
    pub fn validate(&self) -> Result<(), DomainError> {
        validate_winner_count(self.winner_count)?;
        validate_text(&self.text)?;
        validate_contest_code(&self.code)?;
        if let ContestKind::Vote(settings) = &self.kind {
            if settings.exchange_ratio == 0 {
                return Err(DomainError::ValidationError(
                    "exchange ratio must be positive".to_string(),
                ));
            }
        }
        if let ContestKind::Quiz(settings) = &self.kind {
            if settings.question_count == 0 {
                return Err(DomainError::ValidationError(
                    "question count must be positive".to_string(),
                ));
            }
        }
        Ok(())
    }
}

pub fn validate_winner_count(count: u32) -> Result<(), DomainError> {
    if (1..=MAX_WINNERS).contains(&count) {
        Ok(())
    } else {
        Err(DomainError::InvalidWinnerCount(count))
    }
}

pub fn validate_text(text: &str) -> Result<(), DomainError> {
    if text.trim().is_empty() {
        return Err(DomainError::EmptyText);
    }
    if text.chars().count() > MAX_TEXT_LEN {
        return Err(DomainError::ContentTooLong { max: MAX_TEXT_LEN });
    }
    Ok(())
}

pub fn validate_contest_code(code: &str) -> Result<(), DomainError> {
    if code.len() == CONTEST_CODE_LEN && code.chars().all(|c| c.is_ascii_alphanumeric()) {
        Ok(())
    } else {
        Err(DomainError::InvalidContestCode(code.to_string()))
    }
}

/// Generate a random shareable contest code from the OS random source
pub fn generate_contest_code() -> String {
    use rand::rngs::OsRng;
    use rand::Rng;

    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

    let mut rng = OsRng;
    (0..CONTEST_CODE_LEN)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect()
}
