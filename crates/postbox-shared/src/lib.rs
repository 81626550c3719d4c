//! # Postbox Shared
//!
//! Wire types of the HTTP surface, shared by the server and its clients.

pub mod dto;

pub use dto::{CreatePostQuery, DeletePostQuery, PostSummary, ResultResponse};
