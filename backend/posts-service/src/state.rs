use std::sync::Arc;

use crate::cache::{IndexCacheSettings, PageCache};
use crate::db::PostsRepository;

/// Shared handler state, registered once as `web::Data<AppState>`.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn PostsRepository>,
    pub page_cache: Arc<dyn PageCache>,
    pub index_cache: IndexCacheSettings,
    pub login_url: String,
}

impl AppState {
    pub fn new(
        repo: Arc<dyn PostsRepository>,
        page_cache: Arc<dyn PageCache>,
        index_cache: IndexCacheSettings,
        login_url: impl Into<String>,
    ) -> Self {
        Self {
            repo,
            page_cache,
            index_cache,
            login_url: login_url.into(),
        }
    }
}
