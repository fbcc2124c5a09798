/// Business logic layer for posts-service
///
/// Each service wraps the shared `PostsRepository` and owns one area:
/// - `FeedService`: feed pages and post detail contexts
/// - `PostService`: post creation and author-only edits
/// - `CommentService`: comments on posts
/// - `FollowService`: the follow graph
pub mod comments;
pub mod feed;
pub mod follow;
pub mod posts;

pub use comments::CommentService;
pub use feed::FeedService;
pub use follow::{FollowOutcome, FollowService};
pub use posts::{EditAccess, PostFormContext, PostService, Submission};
