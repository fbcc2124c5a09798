use crate::db::PostsRepository;
use crate::error::{AppError, Result};
use crate::metrics::content::FOLLOW_EVENTS_TOTAL;
use crate::middleware::CurrentUser;
use crate::models::User;
use std::sync::Arc;
use tracing::{debug, info};

/// What a follow request did to the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowOutcome {
    Created,
    AlreadyFollowing,
    SelfFollow,
}

pub struct FollowService {
    repo: Arc<dyn PostsRepository>,
}

impl FollowService {
    pub fn new(repo: Arc<dyn PostsRepository>) -> Self {
        Self { repo }
    }

    async fn author(&self, username: &str) -> Result<User> {
        self.repo
            .find_user_by_username(username)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User '{}' not found", username)))
    }

    /// Subscribe the session user to `username`. Following yourself is a no-op.
    pub async fn follow(&self, user: &CurrentUser, username: &str) -> Result<(User, FollowOutcome)> {
        let author = self.author(username).await?;

        if author.id == user.id {
            debug!(user_id = user.id, "Ignoring self-follow");
            FOLLOW_EVENTS_TOTAL.with_label_values(&["self"]).inc();
            return Ok((author, FollowOutcome::SelfFollow));
        }

        let (follow, created) = self.repo.get_or_create_follow(user.id, author.id).await?;
        if !created {
            FOLLOW_EVENTS_TOTAL.with_label_values(&["noop"]).inc();
            return Ok((author, FollowOutcome::AlreadyFollowing));
        }

        FOLLOW_EVENTS_TOTAL.with_label_values(&["follow"]).inc();
        info!(
            follow_id = follow.id,
            follower_id = user.id,
            followee_id = author.id,
            "Follow created"
        );
        Ok((author, FollowOutcome::Created))
    }

    /// Remove any `session user -> username` edge; returns how many were removed.
    pub async fn unfollow(&self, user: &CurrentUser, username: &str) -> Result<(User, u64)> {
        let author = self.author(username).await?;
        let removed = self.repo.delete_follow(user.id, author.id).await?;

        if removed > 0 {
            FOLLOW_EVENTS_TOTAL.with_label_values(&["unfollow"]).inc();
            info!(
                follower_id = user.id,
                followee_id = author.id,
                removed,
                "Follow removed"
            );
        }
        Ok((author, removed))
    }
}
