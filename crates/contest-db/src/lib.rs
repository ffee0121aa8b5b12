//! # contest-db
//!
//! Database layer implementing repository traits with PostgreSQL via SQLx.
//!
//! ## Overview
//!
//! This crate provides PostgreSQL implementations for all repository traits
//! defined in `contest-core`. It handles:
//!
//! - Connection pool management and schema migrations
//! - Database models with SQLx `FromRow` derives
//! - Entity ↔ Model mappers
//! - Repository implementations, with every uniqueness and close-once rule
//!   enforced inside a single statement or transaction
//!
//! ## Usage
//!
//! ```rust,ignore
//! use contest_db::pool::{create_pool, run_migrations, DatabaseConfig};
//! use contest_db::repositories::PgContestRepository;
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = create_pool(&DatabaseConfig::default()).await?;
//!     run_migrations(&pool).await?;
//!     let contests = PgContestRepository::new(pool);
//!
//!     // Use the repository...
//!     Ok(())
//! }
//! ```

pub mod mappers;
pub mod models;
pub mod pool;
pub mod repositories;

// Re-export commonly used types
pub use pool::{create_pool, run_migrations, DatabaseConfig, PgPool};
pub use repositories::{
    PgChannelLinkRepository, PgContestRepository, PgDrawLockRepository, PgEntitlementRepository,
    PgEntryRepository, PgGateRepository, PgPurchaseRepository, PgQuestionRepository,
    PgSettingsRepository, PgUserRepository, PgVoteRepository,
};
