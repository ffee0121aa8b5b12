//! Ephemeral store implementations (Redis and in-process)

mod memory_store;
mod redis_store;

pub use memory_store::InMemoryEphemeralStore;
pub use redis_store::RedisEphemeralStore;
