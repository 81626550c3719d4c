//! # Postbox Infrastructure
//!
//! Concrete implementations of the ports defined in `postbox-core`:
//! document stores and the trigger bus that fires document triggers.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All features enabled
//! - `minimal` - No external dependencies, in-memory only
//! - `redis` - Redis-backed document store

pub mod store;
pub mod triggers;

// Re-exports - In-Memory
pub use store::{InMemoryDocumentStore, TriggeringStore};
pub use triggers::{InMemoryTriggerBus, TriggerBusConfig, TriggerStats};

// Re-exports - Redis
#[cfg(feature = "redis")]
pub use store::{RedisConfig, RedisDocumentStore};
