//! Ports - traits the infrastructure layer implements

mod ephemeral;
mod platform;
mod repositories;

pub use ephemeral::EphemeralStore;
pub use platform::{
    ChatPlatform, InteractionSignal, MemberStatus, NoInteractionSignal, PlatformError,
    PlatformResult,
};
pub use repositories::{
    ChannelLinkRepository, ContestRepository, DrawLockRepository, EntitlementRepository,
    EntryRepository, GateRepository, Insertion, PurchaseRepository, QuestionRepository,
    RepoResult, SettingsRepository, UserRepository, VoteRecord, VoteRepository,
};
