//! In-memory PostBackend for integration tests
//!
//! Stores rows and objects in process, fans inserts out to every open change
//! feed, and can be told to fail reads, writes or media removal.

#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use wall_service::db::{ChangeFeed, PostBackend};
use wall_service::error::{AppError, Result};
use wall_service::models::{NewPostRow, PostRow};

pub const PUBLIC_BASE: &str = "https://demo.supabase.co/storage/v1/object/public/posts-media";

#[derive(Default)]
struct Inner {
    rows: Vec<PostRow>,
    objects: HashMap<String, (String, Bytes)>,
    subscribers: Vec<mpsc::UnboundedSender<PostRow>>,
    next_id: u64,
    upload_calls: usize,
    insert_calls: usize,
    fail_reads: bool,
    fail_uploads: bool,
    fail_inserts: bool,
    fail_row_deletes: bool,
    fail_object_removal: bool,
}

#[derive(Clone, Default)]
pub struct InMemoryBackend {
    inner: Arc<Mutex<Inner>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_reads(&self, fail: bool) {
        self.inner.lock().unwrap().fail_reads = fail;
    }

    pub fn fail_uploads(&self, fail: bool) {
        self.inner.lock().unwrap().fail_uploads = fail;
    }

    pub fn fail_inserts(&self, fail: bool) {
        self.inner.lock().unwrap().fail_inserts = fail;
    }

    pub fn fail_row_deletes(&self, fail: bool) {
        self.inner.lock().unwrap().fail_row_deletes = fail;
    }

    pub fn fail_object_removal(&self, fail: bool) {
        self.inner.lock().unwrap().fail_object_removal = fail;
    }

    /// Seed a row directly, bypassing the repository
    pub fn seed(&self, body: &str, created_at: DateTime<Utc>, media_url: Option<&str>) -> String {
        let mut inner = self.inner.lock().unwrap();
        inner.next_id += 1;
        let id = inner.next_id.to_string();
        inner.rows.push(PostRow {
            id: id.clone(),
            body: body.to_string(),
            created_at,
            media_url: media_url.map(str::to_string),
            media_type: media_url.map(|_| "image".to_string()),
            uploader_name: None,
        });
        id
    }

    pub fn put_object(&self, name: &str) {
        self.inner
            .lock()
            .unwrap()
            .objects
            .insert(name.to_string(), ("image/png".to_string(), Bytes::new()));
    }

    pub fn row_count(&self) -> usize {
        self.inner.lock().unwrap().rows.len()
    }

    pub fn has_object(&self, name: &str) -> bool {
        self.inner.lock().unwrap().objects.contains_key(name)
    }

    pub fn object_names(&self) -> Vec<String> {
        self.inner.lock().unwrap().objects.keys().cloned().collect()
    }

    pub fn upload_calls(&self) -> usize {
        self.inner.lock().unwrap().upload_calls
    }

    pub fn insert_calls(&self) -> usize {
        self.inner.lock().unwrap().insert_calls
    }

    /// Open change feeds whose receiver is still alive
    pub fn live_subscribers(&self) -> usize {
        let mut inner = self.inner.lock().unwrap();
        inner.subscribers.retain(|tx| !tx.is_closed());
        inner.subscribers.len()
    }
}

#[async_trait]
impl PostBackend for InMemoryBackend {
    async fn fetch_posts(&self) -> Result<Vec<PostRow>> {
        let inner = self.inner.lock().unwrap();
        if inner.fail_reads {
            return Err(AppError::Backend("relation \"posts\" is unavailable".into()));
        }
        let mut rows = inner.rows.clone();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn insert_post(&self, row: NewPostRow) -> Result<Option<PostRow>> {
        let mut inner = self.inner.lock().unwrap();
        inner.insert_calls += 1;
        if inner.fail_inserts {
            return Err(AppError::Backend("insert rejected".into()));
        }

        inner.next_id += 1;
        let stored = PostRow {
            id: inner.next_id.to_string(),
            body: row.body,
            created_at: row.created_at,
            media_url: row.media_url,
            media_type: row.media_type.map(|kind| kind.as_str().to_string()),
            uploader_name: row.uploader_name,
        };
        inner.rows.push(stored.clone());
        inner
            .subscribers
            .retain(|tx| tx.send(stored.clone()).is_ok());
        Ok(Some(stored))
    }

    async fn fetch_media_url(&self, id: &str) -> Result<Option<String>> {
        let inner = self.inner.lock().unwrap();
        match inner.rows.iter().find(|row| row.id == id) {
            Some(row) => Ok(row.media_url.clone()),
            None => Err(AppError::NotFound("Post not found".into())),
        }
    }

    async fn delete_post(&self, id: &str) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_row_deletes {
            return Err(AppError::Backend("delete rejected".into()));
        }
        inner.rows.retain(|row| row.id != id);
        Ok(())
    }

    async fn upload_object(&self, name: &str, data: Bytes, content_type: &str) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.upload_calls += 1;
        if inner.fail_uploads {
            return Err(AppError::Upload("The resource already exists (status 400)".into()));
        }
        inner
            .objects
            .insert(name.to_string(), (content_type.to_string(), data));
        Ok(())
    }

    fn public_url(&self, name: &str) -> String {
        format!("{}/{}", PUBLIC_BASE, name)
    }

    async fn remove_object(&self, name: &str) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_object_removal {
            return Err(AppError::Backend("storage unavailable".into()));
        }
        inner.objects.remove(name);
        Ok(())
    }

    async fn subscribe_inserts(&self) -> Result<ChangeFeed> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner.lock().unwrap().subscribers.push(tx);
        Ok(ChangeFeed::new(rx))
    }
}
