/// Comment service - attaches comments to existing posts
use crate::db::PostsRepository;
use crate::error::{AppError, Result};
use crate::forms::{CommentForm, FormErrors};
use crate::metrics::content::COMMENT_WRITES_TOTAL;
use crate::middleware::CurrentUser;
use crate::models::{Comment, NewComment};
use std::sync::Arc;
use tracing::{debug, info};

pub struct CommentService {
    repo: Arc<dyn PostsRepository>,
}

impl CommentService {
    pub fn new(repo: Arc<dyn PostsRepository>) -> Self {
        Self { repo }
    }

    /// Persist a comment on `post_id`. The post must exist; invalid text is
    /// returned as field errors with nothing written.
    pub async fn add_comment(
        &self,
        user: &CurrentUser,
        post_id: i64,
        form: CommentForm,
    ) -> Result<std::result::Result<Comment, FormErrors>> {
        if self.repo.find_post(post_id).await?.is_none() {
            return Err(AppError::NotFound(format!("Post {} not found", post_id)));
        }

        let form = form.normalized();
        let errors = form.check();
        if !errors.is_empty() {
            debug!(user_id = user.id, post_id, ?errors, "Comment rejected");
            COMMENT_WRITES_TOTAL.with_label_values(&["invalid"]).inc();
            return Ok(Err(errors));
        }

        let comment = self
            .repo
            .create_comment(NewComment {
                post_id,
                author_id: user.id,
                text: form.text,
            })
            .await?;

        COMMENT_WRITES_TOTAL.with_label_values(&["created"]).inc();
        info!(user_id = user.id, post_id, comment_id = comment.id, "Comment added");
        Ok(Ok(comment))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::InMemoryPostsRepository;
    use crate::models::NewPost;

    #[tokio::test]
    async fn comment_on_missing_post_is_not_found() {
        let repo = Arc::new(InMemoryPostsRepository::new());
        let user = repo.create_user("reader").await.unwrap();
        let service = CommentService::new(repo);

        let err = service
            .add_comment(
                &CurrentUser {
                    id: user.id,
                    username: user.username,
                },
                404,
                CommentForm {
                    text: "hi".to_string(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn blank_comment_is_not_saved() {
        let repo = Arc::new(InMemoryPostsRepository::new());
        let user = repo.create_user("reader").await.unwrap();
        let post = repo
            .create_post(NewPost {
                author_id: user.id,
                text: "post".to_string(),
                group_id: None,
                image: None,
            })
            .await
            .unwrap();
        let service = CommentService::new(repo.clone());

        let outcome = service
            .add_comment(
                &CurrentUser {
                    id: user.id,
                    username: user.username,
                },
                post.id,
                CommentForm {
                    text: "   ".to_string(),
                },
            )
            .await
            .unwrap();

        assert!(outcome.is_err());
        assert!(repo.list_comments(post.id).await.unwrap().is_empty());
    }
}
