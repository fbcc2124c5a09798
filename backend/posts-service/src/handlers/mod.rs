/// HTTP handlers for posts-service
///
/// This module contains handlers for:
/// - Feeds: home (cached), group, profile and follow feeds
/// - Posts: detail page, creation and author-only edits
/// - Comments: adding a comment to a post
/// - Follows: follow / unfollow an author
/// - Health: liveness and readiness probes
///
/// Page contexts are returned as JSON documents; mutations answer with a
/// `302 Found` redirect.
pub mod comments;
pub mod feed;
pub mod follows;
pub mod health;
pub mod posts;

pub use comments::add_comment;
pub use feed::{follow_index, group_posts, index, profile};
pub use follows::{profile_follow, profile_unfollow};
pub use health::{health_summary, liveness_check, readiness_summary};
pub use posts::{post_create, post_create_form, post_detail, post_edit, post_edit_form};

use actix_web::http::header;
use actix_web::{web, HttpRequest, HttpResponse};

use crate::error::AppError;

/// Register the page and form routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/").route(web::get().to(index)))
        .service(web::resource("/group/{slug}/").route(web::get().to(group_posts)))
        .service(web::resource("/profile/{username}/").route(web::get().to(profile)))
        .service(
            web::resource("/profile/{username}/follow/").route(web::get().to(profile_follow)),
        )
        .service(
            web::resource("/profile/{username}/unfollow/")
                .route(web::get().to(profile_unfollow)),
        )
        .service(web::resource("/posts/{post_id}/").route(web::get().to(post_detail)))
        .service(web::resource("/posts/{post_id}/comment/").route(web::post().to(add_comment)))
        .service(
            web::resource("/posts/{post_id}/edit/")
                .route(web::get().to(post_edit_form))
                .route(web::post().to(post_edit)),
        )
        .service(
            web::resource("/create/")
                .route(web::get().to(post_create_form))
                .route(web::post().to(post_create)),
        )
        .service(web::resource("/follow/").route(web::get().to(follow_index)));
}

/// Register health and metrics endpoints.
pub fn configure_ops_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/metrics", web::get().to(crate::metrics::serve_metrics))
        .route("/api/v1/health", web::get().to(health_summary))
        .route("/api/v1/health/ready", web::get().to(readiness_summary))
        .route("/api/v1/health/live", web::get().to(liveness_check));
}

/// Fallback for unmatched routes.
pub async fn not_found(req: HttpRequest) -> Result<HttpResponse, AppError> {
    Err(AppError::NotFound(format!("No route for {}", req.path())))
}

pub(crate) fn redirect(location: &str) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location))
        .finish()
}

pub fn profile_url(username: &str) -> String {
    format!("/profile/{}/", urlencoding::encode(username))
}

pub fn post_detail_url(post_id: i64) -> String {
    format!("/posts/{}/", post_id)
}
