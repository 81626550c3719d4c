//! Document store implementations - Redis and in-memory fallback.

mod memory;
mod triggering;

pub use memory::InMemoryDocumentStore;
pub use triggering::TriggeringStore;

#[cfg(feature = "redis")]
mod redis;
#[cfg(feature = "redis")]
pub use self::redis::{RedisConfig, RedisDocumentStore};
