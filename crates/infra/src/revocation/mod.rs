//! Revocation store adapters.

pub mod in_memory;
#[cfg(feature = "redis")]
pub mod redis_store;

pub use in_memory::InMemoryRevocationStore;
#[cfg(feature = "redis")]
pub use redis_store::RedisRevocationStore;
