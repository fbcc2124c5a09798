/// Page caching layer
///
/// This module provides:
/// - `PageCache`: the injected cache service (`get` / `set` / `clear`)
/// - `RedisPageCache`: Redis-backed, namespaced per deployment
/// - `MemoryPageCache`: process-local, used by tests and single-node runs
///
/// Only the rendered home feed is cached. Entries are pure functions of a fixed
/// key, so concurrent writers race benignly (last write wins).
pub mod memory_cache;
pub mod redis_cache;

pub use memory_cache::MemoryPageCache;
pub use redis_cache::RedisPageCache;

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type CacheResult<T> = Result<T, CacheError>;

/// A rendered response as it is stored and replayed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedPage {
    pub status: u16,
    pub content_type: String,
    pub body: String,
}

#[async_trait::async_trait]
pub trait PageCache: Send + Sync {
    async fn get(&self, key: &str) -> CacheResult<Option<CachedPage>>;

    async fn set(&self, key: &str, page: &CachedPage, ttl: Duration) -> CacheResult<()>;

    /// Drop every entry this cache owns.
    async fn clear(&self) -> CacheResult<()>;

    async fn ping(&self) -> CacheResult<()> {
        Ok(())
    }
}

/// Where and for how long the home feed is cached.
#[derive(Debug, Clone)]
pub struct IndexCacheSettings {
    pub key: String,
    pub ttl: Duration,
}

impl IndexCacheSettings {
    pub fn new(key_prefix: &str, ttl: Duration) -> Self {
        Self {
            key: format!("page_cache:{}", key_prefix),
            ttl,
        }
    }
}

impl Default for IndexCacheSettings {
    fn default() -> Self {
        Self::new("index_page", Duration::from_secs(20))
    }
}
