use crate::error::Result;
use crate::handlers::{profile_url, redirect};
use crate::middleware::AuthenticatedUser;
use crate::services::FollowService;
use crate::state::AppState;
use actix_web::{web, HttpResponse};

pub async fn profile_follow(
    user: AuthenticatedUser,
    state: web::Data<AppState>,
    username: web::Path<String>,
) -> Result<HttpResponse> {
    let (author, _) = FollowService::new(state.repo.clone())
        .follow(&user.0, &username)
        .await?;

    Ok(redirect(&profile_url(&author.username)))
}

pub async fn profile_unfollow(
    user: AuthenticatedUser,
    state: web::Data<AppState>,
    username: web::Path<String>,
) -> Result<HttpResponse> {
    let (author, _) = FollowService::new(state.repo.clone())
        .unfollow(&user.0, &username)
        .await?;

    Ok(redirect(&profile_url(&author.username)))
}
