//! Optional read-through cache for catalog listings.
//!
//! The cache is a pure accelerator: every operation swallows its own
//! failures, so a missing or broken Redis never affects request outcomes.

use redis::{AsyncCommands, Client, aio::ConnectionManager};
use serde::{Serialize, de::DeserializeOwned};

pub const PRODUCT_LIST_KEY: &str = "product_list";
pub const CATEGORY_LIST_KEY: &str = "category_list";
pub const CATALOG_TTL_SECS: u64 = 600;

#[derive(Clone)]
pub struct CatalogCache {
    conn: Option<ConnectionManager>,
}

impl CatalogCache {
    pub fn disabled() -> Self {
        Self { conn: None }
    }

    /// Connect if a Redis URL is configured; otherwise (or on connection
    /// failure) run with the cache disabled.
    pub async fn connect(redis_url: Option<&str>) -> Self {
        let Some(url) = redis_url else {
            tracing::info!("catalog cache disabled, no REDIS_URL configured");
            return Self::disabled();
        };
        let client = match Client::open(url) {
            Ok(client) => client,
            Err(err) => {
                tracing::warn!(error = %err, "invalid REDIS_URL, catalog cache disabled");
                return Self::disabled();
            }
        };
        match ConnectionManager::new(client).await {
            Ok(conn) => {
                tracing::info!("catalog cache connected");
                Self { conn: Some(conn) }
            }
            Err(err) => {
                tracing::warn!(error = %err, "redis unreachable, catalog cache disabled");
                Self::disabled()
            }
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let mut conn = self.conn.clone()?;
        match conn.get::<_, Option<String>>(key).await {
            Ok(Some(json)) => match serde_json::from_str(&json) {
                Ok(value) => {
                    tracing::debug!(key, "catalog cache hit");
                    Some(value)
                }
                Err(err) => {
                    tracing::warn!(key, error = %err, "stale cache payload, ignoring");
                    None
                }
            },
            Ok(None) => None,
            Err(err) => {
                tracing::warn!(key, error = %err, "cache read failed");
                None
            }
        }
    }

    pub async fn put<T: Serialize>(&self, key: &str, value: &T) {
        let Some(mut conn) = self.conn.clone() else {
            return;
        };
        let json = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(err) => {
                tracing::warn!(key, error = %err, "cache serialization failed");
                return;
            }
        };
        if let Err(err) = conn.set_ex::<_, _, ()>(key, json, CATALOG_TTL_SECS).await {
            tracing::warn!(key, error = %err, "cache write failed");
        }
    }

    pub async fn invalidate(&self, key: &str) {
        let Some(mut conn) = self.conn.clone() else {
            return;
        };
        if let Err(err) = conn.del::<_, ()>(key).await {
            tracing::warn!(key, error = %err, "cache invalidation failed");
        }
    }
}
