//! Ports - trait definitions for external dependencies.
//! These are the "interfaces" that infrastructure must implement.

mod document_store;
mod trigger_bus;

pub use document_store::DocumentStore;
pub use trigger_bus::{TriggerBus, TriggerHandler, TriggerSubscription};
