mod common;

use actix_web::test;
use common::{init_app, init_app_with_cache, page_len, TestContext, UnreachablePageCache};
use posts_service::cache::PageCache;
use posts_service::db::PostsRepository;
use std::sync::Arc;
use std::time::Duration;

async fn index_count<S, B>(app: &S) -> u64
where
    S: actix_web::dev::Service<
        actix_http::Request,
        Response = actix_web::dev::ServiceResponse<B>,
        Error = actix_web::Error,
    >,
    B: actix_web::body::MessageBody,
{
    let resp = test::call_service(app, test::TestRequest::get().uri("/").to_request()).await;
    let body: serde_json::Value = test::read_body_json(resp).await;
    body["page_obj"]["count"].as_u64().unwrap_or_default()
}

#[actix_web::test]
async fn deleted_post_stays_on_home_page_until_cache_is_cleared() {
    let ctx = TestContext::new();
    let author = ctx.user("leo").await;
    let doomed = ctx.post(&author, "Soon gone", None).await;
    ctx.post(&author, "Stays", None).await;
    let app = init_app(&ctx).await;

    assert_eq!(index_count(&app).await, 2);

    assert!(ctx.repo.delete_post(doomed.id).await.unwrap());
    assert_eq!(index_count(&app).await, 2);

    ctx.cache.clear().await.unwrap();
    assert_eq!(index_count(&app).await, 1);
}

#[actix_web::test]
async fn home_page_refreshes_after_ttl() {
    let ctx = TestContext::with_index_ttl(Duration::from_millis(200));
    let author = ctx.user("leo").await;
    let doomed = ctx.post(&author, "Soon gone", None).await;
    let app = init_app(&ctx).await;

    assert_eq!(index_count(&app).await, 1);
    ctx.repo.delete_post(doomed.id).await.unwrap();
    assert_eq!(index_count(&app).await, 1);

    tokio::time::sleep(Duration::from_millis(350)).await;
    assert_eq!(index_count(&app).await, 0);
}

#[actix_web::test]
async fn cached_home_page_ignores_page_parameter() {
    let ctx = TestContext::new();
    let author = ctx.user("leo").await;
    ctx.posts(&author, 13, None).await;
    let app = init_app(&ctx).await;

    let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
    let first: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(page_len(&first), 10);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/?page=2").to_request()).await;
    let second: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(second, first);
}

#[actix_web::test]
async fn new_post_is_not_shown_while_cached() {
    let ctx = TestContext::new();
    let author = ctx.user("leo").await;
    ctx.post(&author, "First", None).await;
    let app = init_app(&ctx).await;

    assert_eq!(index_count(&app).await, 1);
    ctx.post(&author, "Second", None).await;
    assert_eq!(index_count(&app).await, 1);
    assert!(!ctx.cache.is_empty());
}

#[actix_web::test]
async fn home_page_renders_uncached_when_cache_is_down() {
    let ctx = TestContext::new();
    let author = ctx.user("leo").await;
    ctx.posts(&author, 3, None).await;
    let app = init_app_with_cache(&ctx, Arc::new(UnreachablePageCache)).await;

    let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
    assert_eq!(resp.status(), actix_web::http::StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(page_len(&body), 3);

    // Nothing is remembered, so the next request sees fresh data.
    ctx.post(&author, "Fourth", None).await;
    assert_eq!(index_count(&app).await, 4);

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/api/v1/health/ready").to_request(),
    )
    .await;
    assert_eq!(resp.status(), actix_web::http::StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "degraded");
}
