/// Post handlers - detail page, creation and edits
use crate::error::Result;
use crate::forms::PostForm;
use crate::handlers::{post_detail_url, profile_url, redirect};
use crate::middleware::AuthenticatedUser;
use crate::services::{EditAccess, FeedService, PostService, Submission};
use crate::state::AppState;
use actix_web::{web, HttpResponse};

pub async fn post_detail(
    state: web::Data<AppState>,
    post_id: web::Path<i64>,
) -> Result<HttpResponse> {
    let ctx = FeedService::new(state.repo.clone())
        .post_detail(post_id.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(ctx))
}

pub async fn post_create_form(
    _user: AuthenticatedUser,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let ctx = PostService::new(state.repo.clone()).create_form().await?;
    Ok(HttpResponse::Ok().json(ctx))
}

/// On success redirect to the author's profile; otherwise re-render the form.
pub async fn post_create(
    user: AuthenticatedUser,
    state: web::Data<AppState>,
    form: web::Form<PostForm>,
) -> Result<HttpResponse> {
    let user = user.0;
    match PostService::new(state.repo.clone())
        .create_post(&user, form.into_inner())
        .await?
    {
        Submission::Saved(_) => Ok(redirect(&profile_url(&user.username))),
        Submission::Invalid(ctx) => Ok(HttpResponse::Ok().json(ctx)),
    }
}

pub async fn post_edit_form(
    user: AuthenticatedUser,
    state: web::Data<AppState>,
    post_id: web::Path<i64>,
) -> Result<HttpResponse> {
    let post_id = post_id.into_inner();
    let service = PostService::new(state.repo.clone());

    match service.edit_access(&user.0, post_id).await? {
        EditAccess::Allowed(post) => Ok(HttpResponse::Ok().json(service.edit_form(&post).await?)),
        EditAccess::Denied => Ok(redirect(&post_detail_url(post_id))),
    }
}

/// Non-authors are sent back to the post without any change.
pub async fn post_edit(
    user: AuthenticatedUser,
    state: web::Data<AppState>,
    post_id: web::Path<i64>,
    form: web::Form<PostForm>,
) -> Result<HttpResponse> {
    let post_id = post_id.into_inner();
    let service = PostService::new(state.repo.clone());

    let post = match service.edit_access(&user.0, post_id).await? {
        EditAccess::Allowed(post) => post,
        EditAccess::Denied => return Ok(redirect(&post_detail_url(post_id))),
    };

    match service.edit_post(&user.0, &post, form.into_inner()).await? {
        Submission::Saved(_) => Ok(redirect(&post_detail_url(post_id))),
        Submission::Invalid(ctx) => Ok(HttpResponse::Ok().json(ctx)),
    }
}
