use crate::error::Result;
use crate::forms::CommentForm;
use crate::handlers::{post_detail_url, redirect};
use crate::middleware::AuthenticatedUser;
use crate::services::CommentService;
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use tracing::debug;

/// Add a comment; always lands back on the post, valid or not.
pub async fn add_comment(
    user: AuthenticatedUser,
    state: web::Data<AppState>,
    post_id: web::Path<i64>,
    form: web::Form<CommentForm>,
) -> Result<HttpResponse> {
    let post_id = post_id.into_inner();

    // Field errors are not shown; the detail page carries an empty form.
    if let Err(errors) = CommentService::new(state.repo.clone())
        .add_comment(&user.0, post_id, form.into_inner())
        .await?
    {
        debug!(post_id, user_id = user.0.id, ?errors, "Comment rejected");
    }

    Ok(redirect(&post_detail_url(post_id)))
}
