//! Trigger bus implementations.

mod memory;

pub use memory::{InMemoryTriggerBus, TriggerBusConfig, TriggerStats};
