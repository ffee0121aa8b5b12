//! # contest-core
//!
//! Domain layer containing entities, value objects, winner selection and the
//! ports (repository, platform and ephemeral-store traits).
//! This crate has zero dependencies on infrastructure (database, cache, transport).

pub mod draw;
pub mod entities;
pub mod error;
pub mod traits;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use entities::{
    Access, Applicant, ChannelLink, Contest, ContestDraft, ContestKind, ContestStatus,
    Destination, DraftInput, DraftState, EntitlementRecord, Entry, Gate, GateKind, GateSpec,
    InvoicePayload, LifecycleAction, NewContest, NewEntry, NewPurchase, NewQuestion, NewVote,
    Purchase, PurchaseStatus, Question, QuizSettings, ReactionSettings, User, Vote, VoteKind,
    VoteMode, VoteSettings, Winner, GATE_FEATURE,
};
pub use error::DomainError;
pub use traits::{
    ChannelLinkRepository, ChatPlatform, ContestRepository, DrawLockRepository,
    EntitlementRepository, EntryRepository, EphemeralStore, GateRepository, Insertion,
    InteractionSignal, MemberStatus, NoInteractionSignal, PlatformError, PlatformResult,
    PurchaseRepository, QuestionRepository, RepoResult, SettingsRepository, UserRepository,
    VoteRecord, VoteRepository,
};
pub use value_objects::{
    ChatId, ContestFlags, ContestId, EntryId, IdParseError, MessageId, QuestionId, UserId,
};
