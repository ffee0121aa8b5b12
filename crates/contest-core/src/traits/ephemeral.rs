//! Fast shared store for short-lived state
//!
//! Holds quiz markers, challenge state, drafts and rate-limit counters. Never
//! durable contest state.

use std::time::Duration;

use async_trait::async_trait;

use super::repositories::RepoResult;

#[async_trait]
pub trait EphemeralStore: Send + Sync {
    async fn get(&self, key: &str) -> RepoResult<Option<String>>;

    /// Set with a time-to-live, overwriting
    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> RepoResult<()>;

    /// Set only if absent; returns whether the value was stored
    async fn set_nx_ex(&self, key: &str, value: &str, ttl: Duration) -> RepoResult<bool>;

    /// Get and delete in one step
    async fn take(&self, key: &str) -> RepoResult<Option<String>>;

    async fn delete(&self, key: &str) -> RepoResult<()>;

    /// Increment the counter for the current fixed window and return the new count
    ///
    /// The window starts on the first increment and the counter expires with it.
    async fn incr_window(&self, key: &str, window: Duration) -> RepoResult<u64>;
}
