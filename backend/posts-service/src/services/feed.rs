/// Feed service - builds the page contexts for every post listing
use crate::db::{PostFilter, PostsRepository};
use crate::error::{AppError, Result};
use crate::forms::CommentForm;
use crate::metrics::content::FEED_PAGE_DURATION_SECONDS;
use crate::models::{CommentView, Group, PostView, User};
use crate::pagination::{Page, Paginator, POSTS_PER_PAGE};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Serialize)]
pub struct IndexContext {
    pub page_obj: Page<PostView>,
}

#[derive(Debug, Serialize)]
pub struct GroupContext {
    pub group: Group,
    pub page_obj: Page<PostView>,
}

#[derive(Debug, Serialize)]
pub struct ProfileContext {
    pub author: User,
    /// Total posts by the author
    pub count: i64,
    /// Whether the session user follows the author
    pub following: bool,
    pub page_obj: Page<PostView>,
}

#[derive(Debug, Serialize)]
pub struct PostDetailContext {
    pub individual_post: PostView,
    pub author_posts_count: i64,
    pub comments: Vec<CommentView>,
    pub form: CommentForm,
}

#[derive(Debug, Serialize)]
pub struct FollowContext {
    pub page_obj: Page<PostView>,
}

pub struct FeedService {
    repo: Arc<dyn PostsRepository>,
}

impl FeedService {
    pub fn new(repo: Arc<dyn PostsRepository>) -> Self {
        Self { repo }
    }

    /// Count the filtered posts, resolve the page parameter against that count
    /// and fetch only the rows of the resolved page.
    pub async fn paginate_posts(
        &self,
        filter: PostFilter,
        raw_page: Option<&str>,
    ) -> Result<Page<PostView>> {
        let count = self.repo.count_posts(filter).await?;
        let paginator = Paginator::new(count.max(0) as usize, POSTS_PER_PAGE);
        let number = paginator.resolve(raw_page)?;
        let (offset, limit) = paginator.bounds(number);

        let posts = if limit == 0 {
            Vec::new()
        } else {
            self.repo
                .list_posts(filter, limit as i64, offset as i64)
                .await?
        };

        Ok(Page::new(posts, number, &paginator))
    }

    pub async fn index(&self, raw_page: Option<&str>) -> Result<IndexContext> {
        let timer = Instant::now();
        let page_obj = self.paginate_posts(PostFilter::All, raw_page).await?;
        observe("index", timer);

        Ok(IndexContext { page_obj })
    }

    pub async fn group_posts(&self, slug: &str, raw_page: Option<&str>) -> Result<GroupContext> {
        let timer = Instant::now();
        let group = self
            .repo
            .find_group_by_slug(slug)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Group '{}' not found", slug)))?;

        let page_obj = self
            .paginate_posts(PostFilter::Group(group.id), raw_page)
            .await?;
        observe("group", timer);

        Ok(GroupContext { group, page_obj })
    }

    pub async fn profile(
        &self,
        username: &str,
        viewer_id: Option<i64>,
        raw_page: Option<&str>,
    ) -> Result<ProfileContext> {
        let timer = Instant::now();
        let author = self
            .repo
            .find_user_by_username(username)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User '{}' not found", username)))?;

        let page_obj = self
            .paginate_posts(PostFilter::Author(author.id), raw_page)
            .await?;

        let following = match viewer_id {
            Some(viewer_id) => self.repo.is_following(viewer_id, author.id).await?,
            None => false,
        };
        observe("profile", timer);

        Ok(ProfileContext {
            count: page_obj.count as i64,
            author,
            following,
            page_obj,
        })
    }

    pub async fn post_detail(&self, post_id: i64) -> Result<PostDetailContext> {
        let individual_post = self
            .repo
            .find_post(post_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Post {} not found", post_id)))?;

        let author_posts_count = self
            .repo
            .count_posts(PostFilter::Author(individual_post.author.id))
            .await?;
        let comments = self.repo.list_comments(post_id).await?;

        Ok(PostDetailContext {
            individual_post,
            author_posts_count,
            comments,
            form: CommentForm::default(),
        })
    }

    pub async fn follow_index(&self, user_id: i64, raw_page: Option<&str>) -> Result<FollowContext> {
        let timer = Instant::now();
        let page_obj = self
            .paginate_posts(PostFilter::FollowedBy(user_id), raw_page)
            .await?;
        observe("follow", timer);

        Ok(FollowContext { page_obj })
    }
}

fn observe(feed: &str, started: Instant) {
    FEED_PAGE_DURATION_SECONDS
        .with_label_values(&[feed])
        .observe(started.elapsed().as_secs_f64());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::InMemoryPostsRepository;
    use crate::models::NewPost;

    async fn seeded(posts: usize) -> (Arc<InMemoryPostsRepository>, User) {
        let repo = Arc::new(InMemoryPostsRepository::new());
        let author = repo.create_user("author").await.unwrap();
        for i in 0..posts {
            repo.create_post(NewPost {
                author_id: author.id,
                text: format!("post {}", i),
                group_id: None,
                image: None,
            })
            .await
            .unwrap();
        }
        (repo, author)
    }

    #[tokio::test]
    async fn paginate_posts_fetches_only_the_requested_page() {
        let (repo, _) = seeded(13).await;
        let service = FeedService::new(repo);

        let first = service.paginate_posts(PostFilter::All, None).await.unwrap();
        assert_eq!(first.len(), 10);
        assert_eq!(first.count, 13);
        assert!(first.has_next);

        let second = service
            .paginate_posts(PostFilter::All, Some("2"))
            .await
            .unwrap();
        assert_eq!(second.len(), 3);
        assert!(second.is_last);
        assert_eq!(second.object_list[2].text, "post 0");
    }

    #[tokio::test]
    async fn empty_feed_has_one_empty_page() {
        let (repo, _) = seeded(0).await;
        let service = FeedService::new(repo);

        let page = service
            .paginate_posts(PostFilter::All, Some("5"))
            .await
            .unwrap();
        assert!(page.is_empty());
        assert_eq!(page.number, 1);
        assert_eq!(page.num_pages, 1);
    }

    #[tokio::test]
    async fn non_numeric_page_is_bad_request() {
        let (repo, _) = seeded(3).await;
        let service = FeedService::new(repo);

        let err = service
            .paginate_posts(PostFilter::All, Some("abc"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn profile_of_anonymous_viewer_is_not_following() {
        let (repo, author) = seeded(2).await;
        let service = FeedService::new(repo);

        let ctx = service.profile(&author.username, None, None).await.unwrap();
        assert_eq!(ctx.count, 2);
        assert!(!ctx.following);
    }
}
