/// Post repository
///
/// Translates between the application's `Post` and the backend's row shape
/// and issues the fetch, insert, delete and subscribe calls. No caching,
/// retries or deduplication happen here.
use crate::db::PostBackend;
use crate::error::{AppError, Result};
use crate::metrics::wall::{
    record_media_upload, record_post_write, WALL_FEED_READ_FALLBACK_TOTAL,
    WALL_MEDIA_REMOVE_FAILURES_TOTAL,
};
use crate::models::{MediaFile, MediaRef, NewPostRow, Post};
use crate::services::media::{media_object_name, object_key_from_url};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Invoked once per newly inserted post
pub type PostCallback = Box<dyn Fn(Post) + Send + Sync>;

/// Input to `create_post`; body and name are stored as given
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostDraft {
    pub body: String,
    pub uploader_name: Option<String>,
    pub file: Option<MediaFile>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// All posts, newest first. Read failures yield an empty list.
    async fn list_posts(&self) -> Vec<Post>;

    /// Upload the attachment (if any), then insert the row
    async fn create_post(&self, draft: PostDraft) -> Result<Post>;

    /// Best-effort media removal, then row delete
    async fn delete_post(&self, id: &str) -> Result<()>;

    /// Deliver each inserted post to `on_post` until the handle is cancelled
    async fn subscribe_new_posts(&self, on_post: PostCallback) -> Result<Subscription>;

    /// Store an attachment and return its public reference
    async fn upload_media(&self, file: &MediaFile) -> Result<MediaRef>;
}

/// Cancellation handle for a live post subscription
///
/// Cancelling or dropping the handle tears down the change feed.
pub struct Subscription {
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    pub fn new(task: JoinHandle<()>) -> Self {
        Self { task: Some(task) }
    }

    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    pub fn is_active(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// `PostRepository` over any `PostBackend`
#[derive(Clone)]
pub struct PostService {
    backend: Arc<dyn PostBackend>,
}

impl PostService {
    pub fn new(backend: Arc<dyn PostBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl PostRepository for PostService {
    async fn list_posts(&self) -> Vec<Post> {
        match self.backend.fetch_posts().await {
            Ok(rows) => rows.into_iter().map(Post::from).collect(),
            Err(e) => {
                tracing::error!(error = %e, "Error fetching posts");
                WALL_FEED_READ_FALLBACK_TOTAL.inc();
                Vec::new()
            }
        }
    }

    async fn create_post(&self, draft: PostDraft) -> Result<Post> {
        let media = match &draft.file {
            Some(file) => Some(self.upload_media(file).await?),
            None => None,
        };

        let uploader_name = draft.uploader_name.filter(|name| !name.is_empty());
        let row = NewPostRow::new(draft.body, uploader_name, media, Utc::now());

        let inserted = match self.backend.insert_post(row).await {
            Ok(Some(row)) => row,
            Ok(None) => {
                record_post_write("create", false);
                tracing::error!("Insert returned no row");
                return Err(AppError::Backend(
                    "No data returned from post creation".to_string(),
                ));
            }
            Err(e) => {
                record_post_write("create", false);
                tracing::error!(error = %e, "Error creating post");
                return Err(e);
            }
        };

        record_post_write("create", true);
        let post = Post::from(inserted);
        tracing::info!(
            post_id = %post.id,
            has_media = post.media.is_some(),
            "post created"
        );
        Ok(post)
    }

    async fn delete_post(&self, id: &str) -> Result<()> {
        let media_url = self.backend.fetch_media_url(id).await.map_err(|e| {
            tracing::error!(post_id = %id, error = %e, "Error looking up post media");
            e
        })?;

        if let Some(key) = media_url.as_deref().and_then(object_key_from_url) {
            if let Err(e) = self.backend.remove_object(&key).await {
                WALL_MEDIA_REMOVE_FAILURES_TOTAL.inc();
                tracing::warn!(post_id = %id, object = %key, error = %e, "Error deleting media");
            }
        }

        if let Err(e) = self.backend.delete_post(id).await {
            record_post_write("delete", false);
            tracing::error!(post_id = %id, error = %e, "Error deleting post");
            return Err(e);
        }

        record_post_write("delete", true);
        tracing::info!(post_id = %id, "post deleted");
        Ok(())
    }

    async fn subscribe_new_posts(&self, on_post: PostCallback) -> Result<Subscription> {
        let mut feed = self.backend.subscribe_inserts().await?;

        let task = tokio::spawn(async move {
            while let Some(row) = feed.recv().await {
                on_post(Post::from(row));
            }
            tracing::debug!("post change feed closed");
        });

        Ok(Subscription::new(task))
    }

    async fn upload_media(&self, file: &MediaFile) -> Result<MediaRef> {
        let name = media_object_name(Utc::now().timestamp_millis(), file.extension());

        let uploaded = self
            .backend
            .upload_object(&name, file.data.clone(), &file.content_type)
            .await;
        record_media_upload(uploaded.is_ok());

        if let Err(e) = uploaded {
            tracing::error!(object = %name, size = file.size(), error = %e, "Error uploading file");
            return Err(match e {
                AppError::Upload(_) => e,
                other => AppError::Upload(other.message().to_string()),
            });
        }

        Ok(MediaRef {
            url: self.backend.public_url(&name),
            kind: file.kind(),
        })
    }
}
