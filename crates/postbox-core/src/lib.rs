//! # Postbox Core
//!
//! The domain layer of Postbox.
//! Posts, the schemaless document model, the ports the infrastructure has to
//! implement, and the two trigger handlers that react to document events.
//! No infrastructure dependencies live here.

pub mod document;
pub mod domain;
pub mod error;
pub mod ports;
pub mod triggers;

pub use document::{DocumentEvent, DocumentEventKind, DocumentSnapshot, FieldValue, Fields};
pub use error::{StoreError, TriggerError};
