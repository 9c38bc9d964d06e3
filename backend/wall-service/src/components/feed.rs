//! Feed list and the view component that owns it.

use crate::components::composer::{Composer, ComposerError};
use crate::error::Result;
use crate::models::Post;
use crate::services::{PostRepository, Subscription};
use parking_lot::Mutex;
use std::sync::Arc;

/// Posts ordered by creation time, newest first
#[derive(Debug, Clone, Default)]
pub struct Feed {
    posts: Vec<Post>,
}

impl Feed {
    pub fn new(mut posts: Vec<Post>) -> Self {
        posts.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Self { posts }
    }

    /// Place `post` by timestamp; ties go ahead of existing posts
    pub fn insert(&mut self, post: Post) {
        let index = self
            .posts
            .partition_point(|existing| existing.timestamp > post.timestamp);
        self.posts.insert(index, post);
    }

    pub fn remove(&mut self, id: &str) -> Option<Post> {
        let index = self.posts.iter().position(|post| post.id == id)?;
        Some(self.posts.remove(index))
    }

    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }
}

/// Feed view: the post list, its live subscription and a composer
pub struct FeedView {
    repo: Arc<dyn PostRepository>,
    feed: Arc<Mutex<Feed>>,
    composer: Composer,
    subscription: Option<Subscription>,
}

impl FeedView {
    pub fn new(repo: Arc<dyn PostRepository>, composer: Composer) -> Self {
        Self {
            repo,
            feed: Arc::new(Mutex::new(Feed::default())),
            composer,
            subscription: None,
        }
    }

    /// Replace the list with a fresh read
    pub async fn load(&mut self) {
        let posts = self.repo.list_posts().await;
        *self.feed.lock() = Feed::new(posts);
    }

    /// Load the list, then keep it current from the insert subscription
    pub async fn mount(&mut self) -> Result<()> {
        self.load().await;

        let feed = self.feed.clone();
        let subscription = self
            .repo
            .subscribe_new_posts(Box::new(move |post| {
                tracing::debug!(post_id = %post.id, "live post received");
                feed.lock().insert(post);
            }))
            .await?;

        self.subscription = Some(subscription);
        Ok(())
    }

    /// Submit the composer; the created post arrives via the subscription
    pub async fn submit(&mut self) -> std::result::Result<Post, ComposerError> {
        self.composer.submit(self.repo.as_ref()).await
    }

    pub async fn delete(&mut self, id: &str) -> std::result::Result<(), ComposerError> {
        match self.repo.delete_post(id).await {
            Ok(()) => {
                self.feed.lock().remove(id);
                Ok(())
            }
            Err(e) => {
                tracing::error!(post_id = %id, error = %e, "delete from feed failed");
                let err = ComposerError::DeleteFailed;
                self.composer.set_error(err.to_string());
                Err(err)
            }
        }
    }

    /// Cancel the subscription and release the composer's preview
    pub fn unmount(&mut self) {
        if let Some(mut subscription) = self.subscription.take() {
            subscription.cancel();
        }
        self.composer.clear_attachment();
    }

    pub fn is_live(&self) -> bool {
        self.subscription
            .as_ref()
            .is_some_and(Subscription::is_active)
    }

    /// Snapshot of the current list
    pub fn posts(&self) -> Vec<Post> {
        self.feed.lock().posts().to_vec()
    }

    pub fn composer(&self) -> &Composer {
        &self.composer
    }

    pub fn composer_mut(&mut self) -> &mut Composer {
        &mut self.composer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::preview::PreviewRegistry;
    use crate::error::AppError;
    use crate::services::posts::MockPostRepository;
    use chrono::{Duration, TimeZone, Utc};

    fn post_at(id: &str, minutes: i64) -> Post {
        Post {
            id: id.to_string(),
            body: format!("post {}", id),
            timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
                + Duration::minutes(minutes),
            media: None,
            uploader_name: "James".to_string(),
        }
    }

    fn ids(posts: &[Post]) -> Vec<&str> {
        posts.iter().map(|p| p.id.as_str()).collect()
    }

    fn view(repo: MockPostRepository) -> FeedView {
        FeedView::new(
            Arc::new(repo),
            Composer::new(Arc::new(PreviewRegistry::new())),
        )
    }

    #[test]
    fn test_feed_orders_newest_first() {
        let mut feed = Feed::new(vec![post_at("a", 0), post_at("c", 20), post_at("b", 10)]);
        assert_eq!(ids(feed.posts()), vec!["c", "b", "a"]);

        feed.insert(post_at("d", 15));
        feed.insert(post_at("e", 30));
        feed.insert(post_at("f", -5));
        assert_eq!(ids(feed.posts()), vec!["e", "c", "d", "b", "a", "f"]);
        assert!(feed
            .posts()
            .windows(2)
            .all(|pair| pair[0].timestamp >= pair[1].timestamp));
    }

    #[test]
    fn test_feed_remove() {
        let mut feed = Feed::new(vec![post_at("a", 0), post_at("b", 1)]);
        assert_eq!(feed.remove("a").map(|p| p.id), Some("a".to_string()));
        assert!(feed.remove("a").is_none());
        assert_eq!(feed.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_failure_sets_composer_error() {
        let mut repo = MockPostRepository::new();
        repo.expect_list_posts()
            .returning(|| vec![post_at("a", 0)]);
        repo.expect_delete_post()
            .returning(|_| Err(AppError::Backend("permission denied".into())));

        let mut view = view(repo);
        view.load().await;

        assert_eq!(view.delete("a").await, Err(ComposerError::DeleteFailed));
        assert_eq!(
            view.composer().error(),
            Some("Failed to delete post. Please try again.")
        );
        assert_eq!(ids(&view.posts()), vec!["a"]);
    }

    #[tokio::test]
    async fn test_delete_removes_post() {
        let mut repo = MockPostRepository::new();
        repo.expect_list_posts()
            .returning(|| vec![post_at("a", 0), post_at("b", 1)]);
        repo.expect_delete_post()
            .withf(|id| id == "b")
            .returning(|_| Ok(()));

        let mut view = view(repo);
        view.load().await;
        view.delete("b").await.unwrap();

        assert_eq!(ids(&view.posts()), vec!["a"]);
    }

    #[tokio::test]
    async fn test_mount_propagates_subscribe_failure_after_loading() {
        let mut repo = MockPostRepository::new();
        repo.expect_list_posts()
            .returning(|| vec![post_at("a", 0)]);
        repo.expect_subscribe_new_posts()
            .returning(|_| Err(AppError::Backend("realtime unavailable".into())));

        let mut view = view(repo);
        assert!(view.mount().await.is_err());
        assert_eq!(view.posts().len(), 1);
        assert!(!view.is_live());
    }
}
