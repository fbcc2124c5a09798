use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Pipeline};
use std::time::Duration;
use tracing::{debug, warn};

use super::{CacheError, CacheResult, CachedPage, PageCache};
use crate::metrics::cache::{PAGE_CACHE_EVENTS, PAGE_CACHE_WRITE_TOTAL};

/// Redis page cache. Every key is stored under `{namespace}:` so that
/// `clear` only touches this deployment's entries.
#[derive(Clone)]
pub struct RedisPageCache {
    redis: ConnectionManager,
    namespace: String,
}

impl RedisPageCache {
    pub fn new(redis: ConnectionManager, namespace: impl Into<String>) -> Self {
        Self {
            redis,
            namespace: namespace.into(),
        }
    }

    fn namespaced(&self, key: &str) -> String {
        format!("{}:{}", self.namespace, key)
    }
}

#[async_trait::async_trait]
impl PageCache for RedisPageCache {
    async fn get(&self, key: &str) -> CacheResult<Option<CachedPage>> {
        let key = self.namespaced(key);
        let mut conn = self.redis.clone();

        match conn.get::<_, Option<String>>(&key).await {
            Ok(Some(data)) => match serde_json::from_str::<CachedPage>(&data) {
                Ok(page) => {
                    debug!(key = %key, "Page cache HIT");
                    PAGE_CACHE_EVENTS.with_label_values(&["hit"]).inc();
                    Ok(Some(page))
                }
                Err(e) => {
                    warn!(key = %key, error = %e, "Page cache entry corrupted, dropping it");
                    PAGE_CACHE_EVENTS.with_label_values(&["error"]).inc();
                    let _ = conn.del::<_, ()>(&key).await;
                    Ok(None)
                }
            },
            Ok(None) => {
                debug!(key = %key, "Page cache MISS");
                PAGE_CACHE_EVENTS.with_label_values(&["miss"]).inc();
                Ok(None)
            }
            Err(e) => {
                PAGE_CACHE_EVENTS.with_label_values(&["error"]).inc();
                Err(CacheError::Redis(e))
            }
        }
    }

    async fn set(&self, key: &str, page: &CachedPage, ttl: Duration) -> CacheResult<()> {
        let key = self.namespaced(key);
        let data = serde_json::to_string(page)?;
        let ttl_secs = ttl.as_secs().max(1);

        let mut conn = self.redis.clone();
        conn.set_ex::<_, _, ()>(&key, data, ttl_secs)
            .await
            .map_err(|e| {
                PAGE_CACHE_WRITE_TOTAL.with_label_values(&["error"]).inc();
                CacheError::Redis(e)
            })?;

        debug!(key = %key, ttl_secs, "Page cache WRITE");
        PAGE_CACHE_WRITE_TOTAL.with_label_values(&["success"]).inc();
        Ok(())
    }

    async fn clear(&self) -> CacheResult<()> {
        let pattern = format!("{}:*", self.namespace);
        let mut conn = self.redis.clone();
        let mut cursor: u64 = 0;
        let mut deleted = 0usize;

        loop {
            // SCAN instead of KEYS to avoid blocking Redis
            let (next_cursor, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(100)
                .query_async(&mut conn)
                .await?;

            if !keys.is_empty() {
                let mut pipe = Pipeline::new();
                for key in &keys {
                    pipe.del(key);
                }
                pipe.query_async::<_, ()>(&mut conn).await?;
                deleted += keys.len();
            }

            cursor = next_cursor;
            if cursor == 0 {
                break;
            }
        }

        debug!(pattern = %pattern, deleted, "Page cache CLEAR");
        Ok(())
    }

    async fn ping(&self) -> CacheResult<()> {
        let mut conn = self.redis.clone();
        redis::cmd("PING").query_async::<_, String>(&mut conn).await?;
        Ok(())
    }
}
