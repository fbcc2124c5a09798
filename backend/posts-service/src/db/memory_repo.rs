//! Process-local repository with the same ordering and filtering semantics as
//! the PostgreSQL one. Backs the integration tests and `DATABASE_BACKEND=memory`
//! local runs.

use chrono::Utc;
use tokio::sync::RwLock;

use crate::db::{PostFilter, PostsRepository};
use crate::error::{AppError, Result};
use crate::models::{
    AuthorRef, Comment, CommentView, Follow, Group, GroupRef, NewComment, NewPost, Post,
    PostView, User,
};

#[derive(Default)]
struct Store {
    users: Vec<User>,
    groups: Vec<Group>,
    posts: Vec<Post>,
    comments: Vec<Comment>,
    follows: Vec<Follow>,
    last_id: i64,
}

impl Store {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn view(&self, post: &Post) -> Option<PostView> {
        let author = self.users.iter().find(|u| u.id == post.author_id)?;
        let group = post
            .group_id
            .and_then(|id| self.groups.iter().find(|g| g.id == id))
            .map(|g| GroupRef {
                id: g.id,
                slug: g.slug.clone(),
                title: g.title.clone(),
            });

        Some(PostView {
            id: post.id,
            text: post.text.clone(),
            pub_date: post.pub_date,
            image: post.image.clone(),
            author: AuthorRef {
                id: author.id,
                username: author.username.clone(),
            },
            group,
        })
    }

    /// Newest first, ties broken by the higher id.
    fn ordered(&self, filter: PostFilter) -> Vec<&Post> {
        let mut posts: Vec<&Post> = self
            .posts
            .iter()
            .filter(|p| filter.matches(p, &self.follows))
            .collect();
        posts.sort_by(|a, b| b.pub_date.cmp(&a.pub_date).then(b.id.cmp(&a.id)));
        posts
    }

    fn check_refs(&self, post: &NewPost) -> Result<()> {
        if !self.users.iter().any(|u| u.id == post.author_id) {
            return Err(AppError::Internal(format!(
                "author {} does not exist",
                post.author_id
            )));
        }
        if let Some(group_id) = post.group_id {
            if !self.groups.iter().any(|g| g.id == group_id) {
                return Err(AppError::Internal(format!("group {} does not exist", group_id)));
            }
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryPostsRepository {
    store: RwLock<Store>,
}

impl InMemoryPostsRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored follow edges for a pair, duplicates included.
    pub async fn follow_edge_count(&self, user_id: i64, author_id: i64) -> usize {
        self.store
            .read()
            .await
            .follows
            .iter()
            .filter(|f| f.user_id == user_id && f.author_id == author_id)
            .count()
    }

    pub async fn find_raw_post(&self, post_id: i64) -> Option<Post> {
        self.store
            .read()
            .await
            .posts
            .iter()
            .find(|p| p.id == post_id)
            .cloned()
    }
}

#[async_trait::async_trait]
impl PostsRepository for InMemoryPostsRepository {
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let store = self.store.read().await;
        Ok(store.users.iter().find(|u| u.username == username).cloned())
    }

    async fn create_user(&self, username: &str) -> Result<User> {
        let mut store = self.store.write().await;
        if store.users.iter().any(|u| u.username == username) {
            return Err(AppError::BadRequest(format!(
                "username '{}' is taken",
                username
            )));
        }

        let user = User {
            id: store.next_id(),
            username: username.to_string(),
            first_name: String::new(),
            last_name: String::new(),
        };
        store.users.push(user.clone());
        Ok(user)
    }

    async fn find_group(&self, group_id: i64) -> Result<Option<Group>> {
        let store = self.store.read().await;
        Ok(store.groups.iter().find(|g| g.id == group_id).cloned())
    }

    async fn find_group_by_slug(&self, slug: &str) -> Result<Option<Group>> {
        let store = self.store.read().await;
        Ok(store.groups.iter().find(|g| g.slug == slug).cloned())
    }

    async fn list_groups(&self) -> Result<Vec<Group>> {
        let store = self.store.read().await;
        let mut groups = store.groups.clone();
        groups.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));
        Ok(groups)
    }

    async fn create_group(&self, title: &str, slug: &str, description: &str) -> Result<Group> {
        let mut store = self.store.write().await;
        if store.groups.iter().any(|g| g.slug == slug) {
            return Err(AppError::BadRequest(format!("slug '{}' is taken", slug)));
        }

        let group = Group {
            id: store.next_id(),
            title: title.to_string(),
            slug: slug.to_string(),
            description: description.to_string(),
        };
        store.groups.push(group.clone());
        Ok(group)
    }

    async fn count_posts(&self, filter: PostFilter) -> Result<i64> {
        let store = self.store.read().await;
        Ok(store.ordered(filter).len() as i64)
    }

    async fn list_posts(
        &self,
        filter: PostFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PostView>> {
        let store = self.store.read().await;
        Ok(store
            .ordered(filter)
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .filter_map(|p| store.view(p))
            .collect())
    }

    async fn find_post(&self, post_id: i64) -> Result<Option<PostView>> {
        let store = self.store.read().await;
        Ok(store
            .posts
            .iter()
            .find(|p| p.id == post_id)
            .and_then(|p| store.view(p)))
    }

    async fn create_post(&self, new_post: NewPost) -> Result<Post> {
        let mut store = self.store.write().await;
        store.check_refs(&new_post)?;

        let post = Post {
            id: store.next_id(),
            text: new_post.text,
            pub_date: Utc::now(),
            author_id: new_post.author_id,
            group_id: new_post.group_id,
            image: new_post.image,
        };
        store.posts.push(post.clone());
        Ok(post)
    }

    async fn update_post(&self, post_id: i64, changes: NewPost) -> Result<Option<Post>> {
        let mut store = self.store.write().await;
        store.check_refs(&changes)?;

        let Some(post) = store.posts.iter_mut().find(|p| p.id == post_id) else {
            return Ok(None);
        };
        post.text = changes.text;
        post.group_id = changes.group_id;
        post.author_id = changes.author_id;
        if changes.image.is_some() {
            post.image = changes.image;
        }
        Ok(Some(post.clone()))
    }

    async fn delete_post(&self, post_id: i64) -> Result<bool> {
        let mut store = self.store.write().await;
        let before = store.posts.len();
        store.posts.retain(|p| p.id != post_id);
        let deleted = store.posts.len() < before;
        if deleted {
            store.comments.retain(|c| c.post_id != post_id);
        }
        Ok(deleted)
    }

    async fn list_comments(&self, post_id: i64) -> Result<Vec<CommentView>> {
        let store = self.store.read().await;
        let mut comments: Vec<CommentView> = store
            .comments
            .iter()
            .filter(|c| c.post_id == post_id)
            .filter_map(|c| {
                let author = store.users.iter().find(|u| u.id == c.author_id)?;
                Some(CommentView {
                    id: c.id,
                    post_id: c.post_id,
                    author_id: c.author_id,
                    author_username: author.username.clone(),
                    text: c.text.clone(),
                    created: c.created,
                })
            })
            .collect();
        comments.sort_by(|a, b| a.created.cmp(&b.created).then(a.id.cmp(&b.id)));
        Ok(comments)
    }

    async fn create_comment(&self, new_comment: NewComment) -> Result<Comment> {
        let mut store = self.store.write().await;
        if !store.posts.iter().any(|p| p.id == new_comment.post_id) {
            return Err(AppError::Internal(format!(
                "post {} does not exist",
                new_comment.post_id
            )));
        }

        let comment = Comment {
            id: store.next_id(),
            post_id: new_comment.post_id,
            author_id: new_comment.author_id,
            text: new_comment.text,
            created: Utc::now(),
        };
        store.comments.push(comment.clone());
        Ok(comment)
    }

    async fn is_following(&self, user_id: i64, author_id: i64) -> Result<bool> {
        let store = self.store.read().await;
        Ok(store
            .follows
            .iter()
            .any(|f| f.user_id == user_id && f.author_id == author_id))
    }

    async fn get_or_create_follow(&self, user_id: i64, author_id: i64) -> Result<(Follow, bool)> {
        let mut store = self.store.write().await;
        if let Some(existing) = store
            .follows
            .iter()
            .find(|f| f.user_id == user_id && f.author_id == author_id)
        {
            return Ok((existing.clone(), false));
        }

        let follow = Follow {
            id: store.next_id(),
            user_id,
            author_id,
        };
        store.follows.push(follow.clone());
        Ok((follow, true))
    }

    async fn delete_follow(&self, user_id: i64, author_id: i64) -> Result<u64> {
        let mut store = self.store.write().await;
        let before = store.follows.len();
        store
            .follows
            .retain(|f| !(f.user_id == user_id && f.author_id == author_id));
        Ok((before - store.follows.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seeded() -> (InMemoryPostsRepository, User, User, Group) {
        let repo = InMemoryPostsRepository::new();
        let author = repo.create_user("author").await.unwrap();
        let reader = repo.create_user("reader").await.unwrap();
        let group = repo.create_group("Cats", "cats", "").await.unwrap();
        (repo, author, reader, group)
    }

    fn new_post(author: &User, text: &str, group: Option<&Group>) -> NewPost {
        NewPost {
            author_id: author.id,
            text: text.to_string(),
            group_id: group.map(|g| g.id),
            image: None,
        }
    }

    #[tokio::test]
    async fn list_posts_is_newest_first() {
        let (repo, author, _, _) = seeded().await;
        for i in 0..3 {
            repo.create_post(new_post(&author, &format!("post {}", i), None))
                .await
                .unwrap();
        }

        let posts = repo.list_posts(PostFilter::All, 10, 0).await.unwrap();
        let texts: Vec<_> = posts.iter().map(|p| p.text.as_str()).collect();
        assert_eq!(texts, vec!["post 2", "post 1", "post 0"]);
    }

    #[tokio::test]
    async fn followed_by_filter_only_returns_followed_authors() {
        let (repo, author, reader, _) = seeded().await;
        let other = repo.create_user("other").await.unwrap();
        repo.create_post(new_post(&author, "followed", None))
            .await
            .unwrap();
        repo.create_post(new_post(&other, "not followed", None))
            .await
            .unwrap();
        repo.get_or_create_follow(reader.id, author.id).await.unwrap();

        let posts = repo
            .list_posts(PostFilter::FollowedBy(reader.id), 10, 0)
            .await
            .unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].text, "followed");
    }

    #[tokio::test]
    async fn get_or_create_follow_is_idempotent() {
        let (repo, author, reader, _) = seeded().await;
        let (first, created) = repo.get_or_create_follow(reader.id, author.id).await.unwrap();
        assert!(created);
        let (second, created) = repo.get_or_create_follow(reader.id, author.id).await.unwrap();
        assert!(!created);
        assert_eq!(first, second);
        assert_eq!(repo.follow_edge_count(reader.id, author.id).await, 1);

        assert_eq!(repo.delete_follow(reader.id, author.id).await.unwrap(), 1);
        assert_eq!(repo.delete_follow(reader.id, author.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn update_keeps_image_when_none_given() {
        let (repo, author, _, group) = seeded().await;
        let mut post = new_post(&author, "first", Some(&group));
        post.image = Some("posts/cat.jpg".to_string());
        let created = repo.create_post(post).await.unwrap();

        let updated = repo
            .update_post(created.id, new_post(&author, "second", None))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.text, "second");
        assert_eq!(updated.group_id, None);
        assert_eq!(updated.image.as_deref(), Some("posts/cat.jpg"));
    }

    #[tokio::test]
    async fn update_missing_post_returns_none() {
        let (repo, author, _, _) = seeded().await;
        let result = repo
            .update_post(999, new_post(&author, "text", None))
            .await
            .unwrap();
        assert!(result.is_none());
    }
}
