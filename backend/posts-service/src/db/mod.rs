/// Database access layer
///
/// `PostsRepository` is the seam every handler goes through. Two
/// implementations exist:
/// - `PgPostsRepository`: PostgreSQL via sqlx (production)
/// - `InMemoryPostsRepository`: process-local store for tests and local runs
///
/// Feeds are always ordered newest first (`pub_date DESC, id DESC`).
pub mod memory_repo;
pub mod post_repo;

pub use memory_repo::InMemoryPostsRepository;
pub use post_repo::PgPostsRepository;

use crate::error::Result;
use crate::models::{
    Comment, CommentView, Follow, Group, NewComment, NewPost, Post, PostView, User,
};

/// Which posts a feed shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostFilter {
    /// Every post (home feed)
    All,
    /// Posts published to a group
    Group(i64),
    /// Posts written by a user
    Author(i64),
    /// Posts by authors the given user follows
    FollowedBy(i64),
}

impl PostFilter {
    pub fn matches(&self, post: &Post, follows: &[Follow]) -> bool {
        match *self {
            PostFilter::All => true,
            PostFilter::Group(group_id) => post.group_id == Some(group_id),
            PostFilter::Author(author_id) => post.author_id == author_id,
            PostFilter::FollowedBy(user_id) => follows
                .iter()
                .any(|f| f.user_id == user_id && f.author_id == post.author_id),
        }
    }
}

#[async_trait::async_trait]
pub trait PostsRepository: Send + Sync {
    // -- users & groups ---------------------------------------------------

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Users are provisioned by the auth subsystem; this exists for seeding
    /// and tests.
    async fn create_user(&self, username: &str) -> Result<User>;

    async fn find_group(&self, group_id: i64) -> Result<Option<Group>>;

    async fn find_group_by_slug(&self, slug: &str) -> Result<Option<Group>>;

    async fn list_groups(&self) -> Result<Vec<Group>>;

    async fn create_group(&self, title: &str, slug: &str, description: &str) -> Result<Group>;

    // -- posts ------------------------------------------------------------

    async fn count_posts(&self, filter: PostFilter) -> Result<i64>;

    async fn list_posts(&self, filter: PostFilter, limit: i64, offset: i64)
        -> Result<Vec<PostView>>;

    async fn find_post(&self, post_id: i64) -> Result<Option<PostView>>;

    async fn create_post(&self, new_post: NewPost) -> Result<Post>;

    /// Overwrite text, group and author. A `None` image keeps the stored one.
    /// Returns `None` if the post does not exist.
    async fn update_post(&self, post_id: i64, changes: NewPost) -> Result<Option<Post>>;

    async fn delete_post(&self, post_id: i64) -> Result<bool>;

    // -- comments ---------------------------------------------------------

    /// All comments on a post, oldest first.
    async fn list_comments(&self, post_id: i64) -> Result<Vec<CommentView>>;

    async fn create_comment(&self, new_comment: NewComment) -> Result<Comment>;

    // -- follows ----------------------------------------------------------

    async fn is_following(&self, user_id: i64, author_id: i64) -> Result<bool>;

    /// Get-or-create the `user -> author` edge; the flag is true when a new
    /// edge was written. Not serialized against concurrent identical calls.
    async fn get_or_create_follow(&self, user_id: i64, author_id: i64) -> Result<(Follow, bool)>;

    /// Remove every `user -> author` edge; returns how many were removed.
    async fn delete_follow(&self, user_id: i64, author_id: i64) -> Result<u64>;

    /// Backend liveness probe
    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
