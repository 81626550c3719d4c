//! Application configuration loaded from environment variables.

use std::env;

use postbox_infra::TriggerBusConfig;

#[cfg(feature = "redis")]
use postbox_infra::RedisConfig;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub collections: Collections,
    pub store: StoreBackend,
    pub triggers: TriggerBusConfig,
}

/// Names of the collections the functions operate on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collections {
    pub posts: String,
    pub archive: String,
}

impl Default for Collections {
    fn default() -> Self {
        Self {
            posts: "posts".to_string(),
            archive: "archive".to_string(),
        }
    }
}

/// Which document store backs the service.
#[derive(Debug, Clone)]
pub enum StoreBackend {
    Memory,
    #[cfg(feature = "redis")]
    Redis(RedisConfig),
}

impl StoreBackend {
    /// Read `STORE_BACKEND` (`memory` or `redis`).
    fn from_env() -> Self {
        let backend = env::var("STORE_BACKEND")
            .map(|v| v.to_lowercase())
            .unwrap_or_else(|_| "memory".to_string());

        match backend.as_str() {
            #[cfg(feature = "redis")]
            "redis" => StoreBackend::Redis(RedisConfig::from_env()),
            "memory" => StoreBackend::Memory,
            other => {
                tracing::warn!(
                    backend = %other,
                    "Unsupported STORE_BACKEND, using in-memory store"
                );
                StoreBackend::Memory
            }
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Collections::default();

        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            collections: Collections {
                posts: env::var("POSTS_COLLECTION").unwrap_or(defaults.posts),
                archive: env::var("ARCHIVE_COLLECTION").unwrap_or(defaults.archive),
            },
            store: StoreBackend::from_env(),
            triggers: TriggerBusConfig::from_env(),
        }
    }
}
