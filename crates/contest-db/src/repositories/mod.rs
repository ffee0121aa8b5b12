//! Repository implementations
//!
//! PostgreSQL implementations of the repository traits defined in contest-core.
//! Each repository handles database operations for a specific domain entity.

mod channel_link;
mod contest;
mod draw_lock;
mod entitlement;
mod entry;
mod error;
mod purchase;
mod question;
mod user;
mod vote;

pub use channel_link::PgChannelLinkRepository;
pub use contest::{PgContestRepository, PgGateRepository};
pub use draw_lock::PgDrawLockRepository;
pub use entitlement::PgEntitlementRepository;
pub use entry::PgEntryRepository;
pub use purchase::{PgPurchaseRepository, PgSettingsRepository};
pub use question::PgQuestionRepository;
pub use user::PgUserRepository;
pub use vote::PgVoteRepository;
