//! # Postbox API Server
//!
//! HTTP functions over the post collection plus the document triggers that
//! stamp creation times and archive deleted posts.

pub mod config;
pub mod handlers;
pub mod middleware;
pub mod observability;
pub mod state;
pub mod telemetry;

pub use config::AppConfig;
pub use state::AppState;
