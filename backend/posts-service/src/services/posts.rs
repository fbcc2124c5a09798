/// Post service - validates and persists post creation and edits
use crate::db::PostsRepository;
use crate::error::{AppError, Result};
use crate::forms::{FormErrors, PostForm, INVALID_GROUP_MESSAGE};
use crate::metrics::content::POST_WRITES_TOTAL;
use crate::middleware::{can_edit_post, CurrentUser};
use crate::models::{Group, NewPost, Post, PostView};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// Context for the create/edit page, rendered both empty and with errors.
#[derive(Debug, Serialize)]
pub struct PostFormContext {
    pub form: PostForm,
    pub errors: FormErrors,
    pub is_edit: bool,
    /// Groups the post may be published to
    pub groups: Vec<Group>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_id: Option<i64>,
}

/// Outcome of a form submission.
#[derive(Debug)]
pub enum Submission {
    Saved(Post),
    Invalid(PostFormContext),
}

/// Outcome of loading a post for editing.
#[derive(Debug)]
pub enum EditAccess {
    Allowed(PostView),
    /// Session user is not the author
    Denied,
}

pub struct PostService {
    repo: Arc<dyn PostsRepository>,
}

impl PostService {
    pub fn new(repo: Arc<dyn PostsRepository>) -> Self {
        Self { repo }
    }

    pub async fn create_form(&self) -> Result<PostFormContext> {
        self.form_context(PostForm::default(), FormErrors::new(), None)
            .await
    }

    pub async fn create_post(&self, user: &CurrentUser, form: PostForm) -> Result<Submission> {
        let form = form.normalized();
        let (errors, group_id) = self.validate(&form).await?;
        if !errors.is_empty() {
            return Ok(Submission::Invalid(
                self.form_context(form, errors, None).await?,
            ));
        }

        let post = self
            .repo
            .create_post(NewPost {
                author_id: user.id,
                text: form.text,
                group_id,
                image: form.image,
            })
            .await?;

        POST_WRITES_TOTAL.with_label_values(&["create"]).inc();
        info!(user_id = user.id, post_id = post.id, "Post created");
        Ok(Submission::Saved(post))
    }

    /// Load a post and check that the session user may edit it.
    pub async fn edit_access(&self, user: &CurrentUser, post_id: i64) -> Result<EditAccess> {
        let post = self
            .repo
            .find_post(post_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Post {} not found", post_id)))?;

        if !can_edit_post(user, &post) {
            warn!(
                user_id = user.id,
                post_id,
                author_id = post.author.id,
                "Edit attempt by non-author"
            );
            return Ok(EditAccess::Denied);
        }

        Ok(EditAccess::Allowed(post))
    }

    /// Form bound to the stored post.
    pub async fn edit_form(&self, post: &PostView) -> Result<PostFormContext> {
        let form = PostForm {
            text: post.text.clone(),
            group: post.group.as_ref().map(|g| g.id.to_string()),
            image: post.image.clone(),
        };
        self.form_context(form, FormErrors::new(), Some(post.id))
            .await
    }

    pub async fn edit_post(
        &self,
        user: &CurrentUser,
        post: &PostView,
        form: PostForm,
    ) -> Result<Submission> {
        let form = form.normalized();
        let (errors, group_id) = self.validate(&form).await?;
        if !errors.is_empty() {
            return Ok(Submission::Invalid(
                self.form_context(form, errors, Some(post.id)).await?,
            ));
        }

        let updated = self
            .repo
            .update_post(
                post.id,
                NewPost {
                    author_id: user.id,
                    text: form.text,
                    group_id,
                    image: form.image,
                },
            )
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Post {} not found", post.id)))?;

        POST_WRITES_TOTAL.with_label_values(&["edit"]).inc();
        info!(user_id = user.id, post_id = updated.id, "Post edited");
        Ok(Submission::Saved(updated))
    }

    /// Field checks plus resolution of the group reference.
    async fn validate(&self, form: &PostForm) -> Result<(FormErrors, Option<i64>)> {
        let mut errors = form.check();

        let group_id = match form.group_id() {
            Some(id) => {
                if self.repo.find_group(id).await?.is_none() {
                    errors.add("group", INVALID_GROUP_MESSAGE);
                }
                Some(id)
            }
            None => None,
        };

        Ok((errors, group_id))
    }

    async fn form_context(
        &self,
        form: PostForm,
        errors: FormErrors,
        post_id: Option<i64>,
    ) -> Result<PostFormContext> {
        Ok(PostFormContext {
            form,
            errors,
            is_edit: post_id.is_some(),
            groups: self.repo.list_groups().await?,
            post_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::InMemoryPostsRepository;

    async fn setup() -> (Arc<InMemoryPostsRepository>, CurrentUser) {
        let repo = Arc::new(InMemoryPostsRepository::new());
        let user = repo.create_user("writer").await.unwrap();
        (
            repo,
            CurrentUser {
                id: user.id,
                username: user.username,
            },
        )
    }

    #[tokio::test]
    async fn unknown_group_is_a_field_error() {
        let (repo, user) = setup().await;
        let service = PostService::new(repo.clone());

        let outcome = service
            .create_post(
                &user,
                PostForm {
                    text: "hello".to_string(),
                    group: Some("999".to_string()),
                    image: None,
                },
            )
            .await
            .unwrap();

        match outcome {
            Submission::Invalid(ctx) => {
                assert!(ctx.errors.field("group").is_some());
                assert!(!ctx.is_edit);
            }
            Submission::Saved(_) => panic!("post with unknown group was saved"),
        }
        assert_eq!(
            repo.count_posts(crate::db::PostFilter::All).await.unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn created_post_belongs_to_session_user() {
        let (repo, user) = setup().await;
        let group = repo.create_group("Cats", "cats", "").await.unwrap();
        let service = PostService::new(repo);

        let outcome = service
            .create_post(
                &user,
                PostForm {
                    text: "  hello  ".to_string(),
                    group: Some(group.id.to_string()),
                    image: None,
                },
            )
            .await
            .unwrap();

        let Submission::Saved(post) = outcome else {
            panic!("valid post was rejected");
        };
        assert_eq!(post.author_id, user.id);
        assert_eq!(post.text, "hello");
        assert_eq!(post.group_id, Some(group.id));
    }

    #[tokio::test]
    async fn non_author_is_denied_edit() {
        let (repo, author) = setup().await;
        let other = repo.create_user("other").await.unwrap();
        let post = repo
            .create_post(NewPost {
                author_id: author.id,
                text: "original".to_string(),
                group_id: None,
                image: None,
            })
            .await
            .unwrap();
        let service = PostService::new(repo);

        let intruder = CurrentUser {
            id: other.id,
            username: other.username,
        };
        assert!(matches!(
            service.edit_access(&intruder, post.id).await.unwrap(),
            EditAccess::Denied
        ));
        assert!(matches!(
            service.edit_access(&author, post.id).await.unwrap(),
            EditAccess::Allowed(_)
        ));
    }
}
