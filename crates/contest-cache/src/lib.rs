//! # contest-cache
//!
//! Short-lived shared state for the contest engine: quiz markers, challenge
//! answers, creation drafts and rate-limit windows.
//!
//! ## Features
//!
//! - **Connection Pool**: Managed Redis connection pool with deadpool
//! - **Redis store**: `EphemeralStore` shared by every bot instance
//! - **In-memory store**: `EphemeralStore` for single-instance runs and tests
//!
//! ## Example
//!
//! ```ignore
//! use contest_cache::{RedisEphemeralStore, RedisPool, RedisPoolConfig};
//!
//! let pool = RedisPool::new(RedisPoolConfig::default())?;
//! let store = RedisEphemeralStore::new(pool);
//!
//! if store.set_nx_ex("quiz:12:solved:3", "42", Duration::from_secs(60)).await? {
//!     // first correct answer
//! }
//! ```

pub mod ephemeral;
pub mod pool;

pub use ephemeral::{InMemoryEphemeralStore, RedisEphemeralStore};
pub use pool::{RedisPool, RedisPoolConfig, RedisPoolError, RedisResult, DEFAULT_KEY_PREFIX};
