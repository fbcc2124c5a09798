/// Feed handlers - home, group, profile and follow feeds
use crate::cache::CachedPage;
use crate::error::Result;
use crate::middleware::{AuthenticatedUser, MaybeUser};
use crate::pagination::PageQuery;
use crate::services::FeedService;
use crate::state::AppState;
use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse};
use tracing::warn;

const JSON_CONTENT_TYPE: &str = "application/json";

fn replay(page: CachedPage) -> HttpResponse {
    let status = StatusCode::from_u16(page.status).unwrap_or(StatusCode::OK);
    HttpResponse::build(status)
        .content_type(page.content_type)
        .body(page.body)
}

/// Home feed. The rendered response is cached under a fixed key for the
/// configured TTL, regardless of the page requested; a cache outage only
/// costs the cache.
pub async fn index(
    state: web::Data<AppState>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let key = state.index_cache.key.as_str();

    match state.page_cache.get(key).await {
        Ok(Some(page)) => return Ok(replay(page)),
        Ok(None) => {}
        Err(e) => warn!(key, error = %e, "Page cache read failed; rendering uncached"),
    }

    let ctx = FeedService::new(state.repo.clone())
        .index(query.raw())
        .await?;

    let page = CachedPage {
        status: StatusCode::OK.as_u16(),
        content_type: JSON_CONTENT_TYPE.to_string(),
        body: serde_json::to_string(&ctx)?,
    };

    if let Err(e) = state
        .page_cache
        .set(key, &page, state.index_cache.ttl)
        .await
    {
        warn!(key, error = %e, "Page cache write failed");
    }

    Ok(replay(page))
}

pub async fn group_posts(
    state: web::Data<AppState>,
    slug: web::Path<String>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let ctx = FeedService::new(state.repo.clone())
        .group_posts(&slug, query.raw())
        .await?;

    Ok(HttpResponse::Ok().json(ctx))
}

pub async fn profile(
    state: web::Data<AppState>,
    username: web::Path<String>,
    query: web::Query<PageQuery>,
    viewer: MaybeUser,
) -> Result<HttpResponse> {
    let ctx = FeedService::new(state.repo.clone())
        .profile(&username, viewer.id(), query.raw())
        .await?;

    Ok(HttpResponse::Ok().json(ctx))
}

/// Posts by the authors the session user follows.
pub async fn follow_index(
    user: AuthenticatedUser,
    state: web::Data<AppState>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let ctx = FeedService::new(state.repo.clone())
        .follow_index(user.0.id, query.raw())
        .await?;

    Ok(HttpResponse::Ok().json(ctx))
}
