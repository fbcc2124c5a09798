//! Shared fixtures for the HTTP-level tests: an in-memory repository and page
//! cache wired into the real routes, plus helpers to seed data and sign in.
#![allow(dead_code)]

use actix_web::body::MessageBody;
use actix_web::cookie::Cookie;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::header;
use actix_web::{test, web, App};
use std::sync::Arc;
use std::time::Duration;

use posts_service::cache::{
    CacheError, CacheResult, CachedPage, IndexCacheSettings, MemoryPageCache, PageCache,
};
use posts_service::db::{InMemoryPostsRepository, PostsRepository};
use posts_service::handlers;
use posts_service::middleware::{SessionKeys, SessionMiddleware};
use posts_service::models::{Group, NewPost, Post, User};
use posts_service::state::AppState;

pub const COOKIE_NAME: &str = "sessionid";
pub const LOGIN_URL: &str = "/auth/login/";
const SECRET: &str = "integration-test-secret";

pub struct TestContext {
    pub repo: Arc<InMemoryPostsRepository>,
    pub cache: Arc<MemoryPageCache>,
    pub keys: Arc<SessionKeys>,
    pub index_ttl: Duration,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_index_ttl(Duration::from_secs(20))
    }

    pub fn with_index_ttl(index_ttl: Duration) -> Self {
        Self {
            repo: Arc::new(InMemoryPostsRepository::new()),
            cache: Arc::new(MemoryPageCache::new()),
            keys: Arc::new(SessionKeys::new(SECRET)),
            index_ttl,
        }
    }

    pub fn state(&self) -> web::Data<AppState> {
        self.state_with_cache(self.cache.clone())
    }

    pub fn state_with_cache(&self, cache: Arc<dyn PageCache>) -> web::Data<AppState> {
        web::Data::new(AppState::new(
            self.repo.clone(),
            cache,
            IndexCacheSettings::new("index_page", self.index_ttl),
            LOGIN_URL,
        ))
    }

    pub async fn user(&self, username: &str) -> User {
        self.repo.create_user(username).await.expect("create user")
    }

    pub async fn group(&self, title: &str, slug: &str) -> Group {
        self.repo
            .create_group(title, slug, "Test group")
            .await
            .expect("create group")
    }

    pub async fn post(&self, author: &User, text: &str, group: Option<&Group>) -> Post {
        self.repo
            .create_post(NewPost {
                author_id: author.id,
                text: text.to_string(),
                group_id: group.map(|g| g.id),
                image: None,
            })
            .await
            .expect("create post")
    }

    pub async fn posts(&self, author: &User, count: usize, group: Option<&Group>) {
        for i in 0..count {
            self.post(author, &format!("Post number {}", i), group).await;
        }
    }

    pub fn session_cookie(&self, user: &User) -> Cookie<'static> {
        let token = self
            .keys
            .issue_token(user, chrono::Duration::hours(1))
            .expect("issue token");
        Cookie::new(COOKIE_NAME, token)
    }
}

/// Page cache whose backend is always unreachable.
pub struct UnreachablePageCache;

fn unreachable() -> CacheError {
    CacheError::Redis(redis::RedisError::from((
        redis::ErrorKind::IoError,
        "connection refused",
    )))
}

#[async_trait::async_trait]
impl PageCache for UnreachablePageCache {
    async fn get(&self, _key: &str) -> CacheResult<Option<CachedPage>> {
        Err(unreachable())
    }

    async fn set(&self, _key: &str, _page: &CachedPage, _ttl: Duration) -> CacheResult<()> {
        Err(unreachable())
    }

    async fn clear(&self) -> CacheResult<()> {
        Err(unreachable())
    }

    async fn ping(&self) -> CacheResult<()> {
        Err(unreachable())
    }
}

pub async fn init_app(
    ctx: &TestContext,
) -> impl Service<actix_http::Request, Response = ServiceResponse<impl MessageBody>, Error = actix_web::Error>
{
    init_app_with_state(ctx, ctx.state()).await
}

pub async fn init_app_with_cache(
    ctx: &TestContext,
    cache: Arc<dyn PageCache>,
) -> impl Service<actix_http::Request, Response = ServiceResponse<impl MessageBody>, Error = actix_web::Error>
{
    init_app_with_state(ctx, ctx.state_with_cache(cache)).await
}

async fn init_app_with_state(
    ctx: &TestContext,
    state: web::Data<AppState>,
) -> impl Service<actix_http::Request, Response = ServiceResponse<impl MessageBody>, Error = actix_web::Error>
{
    test::init_service(
        App::new()
            .app_data(state)
            .wrap(SessionMiddleware::new(ctx.keys.clone(), COOKIE_NAME))
            .configure(handlers::configure_ops_routes)
            .configure(handlers::configure_routes)
            .default_service(web::to(handlers::not_found)),
    )
    .await
}

pub fn location<B>(resp: &ServiceResponse<B>) -> String {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// Number of posts on the page in a feed context.
pub fn page_len(body: &serde_json::Value) -> usize {
    body["page_obj"]["object_list"]
        .as_array()
        .map(Vec::len)
        .unwrap_or(0)
}

/// Texts of the posts on the page in a feed context.
pub fn page_texts(body: &serde_json::Value) -> Vec<String> {
    body["page_obj"]["object_list"]
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(|p| p["text"].as_str().map(str::to_string))
        .collect()
}
