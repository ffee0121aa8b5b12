//! Domain errors - error types for the domain layer

use thiserror::Error;

use crate::value_objects::{ChatId, ContestId, QuestionId, UserId};

/// Domain layer errors
#[derive(Debug, Error)]
pub enum DomainError {
    // =========================================================================
    // Not Found Errors
    // =========================================================================
    #[error("User not found: {0}")]
    UserNotFound(UserId),

    #[error("Contest not found: {0}")]
    ContestNotFound(ContestId),

    #[error("Contest code not found: {0}")]
    ContestCodeNotFound(String),

    #[error("Entry not found")]
    EntryNotFound,

    #[error("Channel link not found")]
    ChannelLinkNotFound,

    #[error("Question not found: {0}")]
    QuestionNotFound(QuestionId),

    // =========================================================================
    // Validation Errors
    // =========================================================================
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Winner count must be between 1 and 100, got {0}")]
    InvalidWinnerCount(u32),

    #[error("Contest text is empty")]
    EmptyText,

    #[error("Content too long: max {max} characters")]
    ContentTooLong { max: usize },

    #[error("Invalid contest code: {0}")]
    InvalidContestCode(String),

    #[error("Invalid entry code: {0}")]
    InvalidEntryCode(String),

    #[error("Input '{input}' is not accepted while {state}")]
    IllegalDraftInput {
        state: &'static str,
        input: &'static str,
    },

    #[error("Too many gates: max {max}")]
    TooManyGates { max: usize },

    #[error("Invalid invoice payload: {0}")]
    InvalidPayload(String),

    #[error("Unsupported currency: {0}")]
    UnsupportedCurrency(String),

    #[error("This contest does not accept {0} votes")]
    VoteModeNotAllowed(&'static str),

    #[error("Vote weight out of range for {stars} stars")]
    VoteWeightOverflow { stars: i64 },

    // =========================================================================
    // Authorization Errors
    // =========================================================================
    #[error("Not contest owner")]
    NotContestOwner,

    #[error("Channel {0} is not linked to this owner")]
    ChannelNotLinked(ChatId),

    #[error("Not an administrator of the chat")]
    NotChatAdmin,

    #[error("Premium entitlement required")]
    PremiumRequired,

    #[error("Not a bot administrator")]
    NotBotAdmin,

    // =========================================================================
    // Conflict Errors
    // =========================================================================
    #[error("Contest is closed")]
    ContestClosed,

    #[error("Contest code already exists")]
    ContestCodeExists,

    // =========================================================================
    // Business Rule Violations
    // =========================================================================
    #[error("Contest has no participants")]
    NoParticipants,

    #[error("Insufficient points")]
    InsufficientPoints,

    #[error("Expected a {expected} contest, got {actual}")]
    WrongContestKind {
        expected: &'static str,
        actual: &'static str,
    },

    // =========================================================================
    // Infrastructure Errors (wrapped)
    // =========================================================================
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Cache error: {0}")]
    CacheError(String),

    #[error("Platform error: {0}")]
    PlatformError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl DomainError {
    /// Get an error code string for callers
    pub fn code(&self) -> &'static str {
        match self {
            // Not Found
            Self::UserNotFound(_) => "UNKNOWN_USER",
            Self::ContestNotFound(_) | Self::ContestCodeNotFound(_) => "UNKNOWN_CONTEST",
            Self::EntryNotFound => "UNKNOWN_ENTRY",
            Self::ChannelLinkNotFound => "UNKNOWN_CHANNEL_LINK",
            Self::QuestionNotFound(_) => "UNKNOWN_QUESTION",

            // Validation
            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::InvalidWinnerCount(_) => "INVALID_WINNER_COUNT",
            Self::EmptyText => "EMPTY_TEXT",
            Self::ContentTooLong { .. } => "CONTENT_TOO_LONG",
            Self::InvalidContestCode(_) => "INVALID_CONTEST_CODE",
            Self::InvalidEntryCode(_) => "INVALID_ENTRY_CODE",
            Self::IllegalDraftInput { .. } => "ILLEGAL_DRAFT_INPUT",
            Self::TooManyGates { .. } => "TOO_MANY_GATES",
            Self::InvalidPayload(_) => "INVALID_PAYLOAD",
            Self::UnsupportedCurrency(_) => "UNSUPPORTED_CURRENCY",
            Self::VoteModeNotAllowed(_) => "VOTE_MODE_NOT_ALLOWED",
            Self::VoteWeightOverflow { .. } => "VOTE_WEIGHT_OVERFLOW",

            // Authorization
            Self::NotContestOwner => "NOT_CONTEST_OWNER",
            Self::ChannelNotLinked(_) => "CHANNEL_NOT_LINKED",
            Self::NotChatAdmin => "NOT_CHAT_ADMIN",
            Self::PremiumRequired => "PREMIUM_REQUIRED",
            Self::NotBotAdmin => "NOT_BOT_ADMIN",

            // Conflict
            Self::ContestClosed => "CONTEST_CLOSED",
            Self::ContestCodeExists => "CONTEST_CODE_EXISTS",

            // Business Rules
            Self::NoParticipants => "NO_PARTICIPANTS",
            Self::InsufficientPoints => "INSUFFICIENT_POINTS",
            Self::WrongContestKind { .. } => "WRONG_CONTEST_KIND",

            // Infrastructure
            Self::DatabaseError(_) => "DATABASE_ERROR",
            Self::CacheError(_) => "CACHE_ERROR",
            Self::PlatformError(_) => "PLATFORM_ERROR",
            Self::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::UserNotFound(_)
                | Self::ContestNotFound(_)
                | Self::ContestCodeNotFound(_)
                | Self::EntryNotFound
                | Self::ChannelLinkNotFound
                | Self::QuestionNotFound(_)
        )
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::ValidationError(_)
                | Self::InvalidWinnerCount(_)
                | Self::EmptyText
                | Self::ContentTooLong { .. }
                | Self::InvalidContestCode(_)
                | Self::InvalidEntryCode(_)
                | Self::IllegalDraftInput { .. }
                | Self::TooManyGates { .. }
                | Self::InvalidPayload(_)
                | Self::UnsupportedCurrency(_)
                | Self::VoteModeNotAllowed(_)
                | Self::VoteWeightOverflow { .. }
        )
    }

    /// Check if this is an authorization error
    pub fn is_authorization(&self) -> bool {
        matches!(
            self,
            Self::NotContestOwner
                | Self::ChannelNotLinked(_)
                | Self::NotChatAdmin
                | Self::PremiumRequired
                | Self::NotBotAdmin
        )
    }

    /// Check if this is a conflict error
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::ContestClosed | Self::ContestCodeExists)
    }
}
