//! Process-local ephemeral store
//!
//! Used when no Redis is configured (single instance deployments and tests).
//! Expired values are dropped lazily on access.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use contest_core::traits::{EphemeralStore, RepoResult};

#[derive(Debug, Clone)]
struct Slot {
    value: String,
    expires_at: Instant,
}

impl Slot {
    fn new(value: String, ttl: Duration) -> Self {
        Self {
            value,
            expires_at: Instant::now() + ttl,
        }
    }

    fn is_live(&self) -> bool {
        self.expires_at > Instant::now()
    }
}

/// In-memory ephemeral store backed by `DashMap`
#[derive(Debug, Default)]
pub struct InMemoryEphemeralStore {
    slots: DashMap<String, Slot>,
}

impl InMemoryEphemeralStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every expired slot
    pub fn purge_expired(&self) {
        self.slots.retain(|_, slot| slot.is_live());
    }

    /// Number of stored slots, expired ones included until purged
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[async_trait]
impl EphemeralStore for InMemoryEphemeralStore {
    async fn get(&self, key: &str) -> RepoResult<Option<String>> {
        Ok(self
            .slots
            .get(key)
            .filter(|slot| slot.is_live())
            .map(|slot| slot.value.clone()))
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> RepoResult<()> {
        self.slots
            .insert(key.to_string(), Slot::new(value.to_string(), ttl));
        Ok(())
    }

    async fn set_nx_ex(&self, key: &str, value: &str, ttl: Duration) -> RepoResult<bool> {
        match self.slots.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().is_live() {
                    return Ok(false);
                }
                occupied.insert(Slot::new(value.to_string(), ttl));
                Ok(true)
            }
            Entry::Vacant(vacant) => {
                vacant.insert(Slot::new(value.to_string(), ttl));
                Ok(true)
            }
        }
    }

    async fn take(&self, key: &str) -> RepoResult<Option<String>> {
        Ok(self
            .slots
            .remove(key)
            .map(|(_, slot)| slot)
            .filter(Slot::is_live)
            .map(|slot| slot.value))
    }

    async fn delete(&self, key: &str) -> RepoResult<()> {
        self.slots.remove(key);
        Ok(())
    }

    async fn incr_window(&self, key: &str, window: Duration) -> RepoResult<u64> {
        let mut slot = self
            .slots
            .entry(key.to_string())
            .or_insert_with(|| Slot::new("0".to_string(), window));

        if !slot.is_live() {
            *slot = Slot::new("0".to_string(), window);
        }

        let count = slot.value.parse::<u64>().unwrap_or(0) + 1;
        slot.value = count.to_string();
        Ok(count)
    }
}
