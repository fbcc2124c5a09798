use dashmap::DashMap;
use std::time::{Duration, Instant};
use tracing::debug;

use super::{CacheResult, CachedPage, PageCache};
use crate::metrics::cache::{PAGE_CACHE_EVENTS, PAGE_CACHE_WRITE_TOTAL};

/// In-process page cache with per-entry expiry. Expired entries are evicted
/// lazily on read.
#[derive(Default)]
pub struct MemoryPageCache {
    entries: DashMap<String, (Instant, CachedPage)>,
}

impl MemoryPageCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait::async_trait]
impl PageCache for MemoryPageCache {
    async fn get(&self, key: &str) -> CacheResult<Option<CachedPage>> {
        let now = Instant::now();
        let hit = self
            .entries
            .get(key)
            .filter(|entry| entry.0 > now)
            .map(|entry| entry.1.clone());

        match hit {
            Some(page) => {
                debug!(key = %key, "Page cache HIT");
                PAGE_CACHE_EVENTS.with_label_values(&["hit"]).inc();
                Ok(Some(page))
            }
            None => {
                self.entries.remove_if(key, |_, (expires_at, _)| *expires_at <= now);
                debug!(key = %key, "Page cache MISS");
                PAGE_CACHE_EVENTS.with_label_values(&["miss"]).inc();
                Ok(None)
            }
        }
    }

    async fn set(&self, key: &str, page: &CachedPage, ttl: Duration) -> CacheResult<()> {
        self.entries
            .insert(key.to_string(), (Instant::now() + ttl, page.clone()));
        PAGE_CACHE_WRITE_TOTAL.with_label_values(&["success"]).inc();
        Ok(())
    }

    async fn clear(&self) -> CacheResult<()> {
        self.entries.clear();
        Ok(())
    }
}
