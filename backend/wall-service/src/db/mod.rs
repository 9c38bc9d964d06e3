/// Backend access layer
///
/// `PostBackend` is the narrow seam between the post repository and the
/// hosted platform: table reads and writes, object storage, and the insert
/// change feed. `SupabaseBackend` is the production implementation; tests
/// substitute an in-memory one.
use crate::error::Result;
use crate::models::{NewPostRow, PostRow};
use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;

pub mod supabase;

pub use supabase::SupabaseBackend;

#[async_trait]
pub trait PostBackend: Send + Sync {
    /// All rows, newest first
    async fn fetch_posts(&self) -> Result<Vec<PostRow>>;

    /// Insert one row and return it as stored; `None` when nothing came back
    async fn insert_post(&self, row: NewPostRow) -> Result<Option<PostRow>>;

    /// Stored media URL of a post, if it has one
    async fn fetch_media_url(&self, id: &str) -> Result<Option<String>>;

    async fn delete_post(&self, id: &str) -> Result<()>;

    async fn upload_object(&self, name: &str, data: Bytes, content_type: &str) -> Result<()>;

    /// Public URL of a stored object; no request is made
    fn public_url(&self, name: &str) -> String;

    async fn remove_object(&self, name: &str) -> Result<()>;

    /// Live stream of rows inserted into the posts table
    async fn subscribe_inserts(&self) -> Result<ChangeFeed>;
}

/// Receiving end of an insert change feed
///
/// Dropping the feed runs its teardown, which closes the underlying channel.
pub struct ChangeFeed {
    rows: mpsc::UnboundedReceiver<PostRow>,
    teardown: Option<Box<dyn FnOnce() + Send>>,
}

impl ChangeFeed {
    pub fn new(rows: mpsc::UnboundedReceiver<PostRow>) -> Self {
        Self {
            rows,
            teardown: None,
        }
    }

    pub fn with_teardown(mut self, teardown: impl FnOnce() + Send + 'static) -> Self {
        self.teardown = Some(Box::new(teardown));
        self
    }

    /// Next inserted row, or `None` once the feed has closed
    pub async fn recv(&mut self) -> Option<PostRow> {
        self.rows.recv().await
    }
}

impl Drop for ChangeFeed {
    fn drop(&mut self) {
        if let Some(teardown) = self.teardown.take() {
            teardown();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_change_feed_runs_teardown_on_drop() {
        let (tx, rx) = mpsc::unbounded_channel();
        let torn_down = Arc::new(AtomicBool::new(false));
        let flag = torn_down.clone();

        let feed = ChangeFeed::new(rx).with_teardown(move || flag.store(true, Ordering::SeqCst));
        drop(feed);

        assert!(torn_down.load(Ordering::SeqCst));
        assert!(tx.is_closed());
    }
}
