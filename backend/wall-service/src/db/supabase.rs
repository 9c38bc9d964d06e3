//! `PostBackend` over a hosted Supabase project.

use super::{ChangeFeed, PostBackend};
use crate::config::MediaConfig;
use crate::error::{AppError, Result};
use crate::models::{NewPostRow, PostRow};
use async_trait::async_trait;
use bytes::Bytes;
use serde::Deserialize;
use supabase_client::{ChangeFilter, FileOptions, Order, SupabaseClient};
use tokio::sync::mpsc;

const POSTS_TABLE: &str = "posts";
const POSTS_CHANNEL: &str = "posts";

#[derive(Deserialize)]
struct MediaUrlRow {
    media_url: Option<String>,
}

#[derive(Clone)]
pub struct SupabaseBackend {
    client: SupabaseClient,
    media: MediaConfig,
}

impl SupabaseBackend {
    pub fn new(client: SupabaseClient, media: MediaConfig) -> Self {
        Self { client, media }
    }
}

#[async_trait]
impl PostBackend for SupabaseBackend {
    async fn fetch_posts(&self) -> Result<Vec<PostRow>> {
        let rows = self
            .client
            .from_table(POSTS_TABLE)
            .select("*")
            .order("created_at", Order::Descending)
            .execute::<PostRow>()
            .await?;
        Ok(rows)
    }

    async fn insert_post(&self, row: NewPostRow) -> Result<Option<PostRow>> {
        let rows: Vec<PostRow> = self.client.from_table(POSTS_TABLE).insert(&[row]).await?;
        Ok(rows.into_iter().next())
    }

    async fn fetch_media_url(&self, id: &str) -> Result<Option<String>> {
        let rows = self
            .client
            .from_table(POSTS_TABLE)
            .select("media_url")
            .eq("id", id)
            .execute::<MediaUrlRow>()
            .await?;

        match rows.into_iter().next() {
            Some(row) => Ok(row.media_url.filter(|url| !url.is_empty())),
            None => Err(AppError::NotFound("Post not found".to_string())),
        }
    }

    async fn delete_post(&self, id: &str) -> Result<()> {
        self.client
            .from_table(POSTS_TABLE)
            .delete()
            .eq("id", id)
            .execute()
            .await?;
        Ok(())
    }

    async fn upload_object(&self, name: &str, data: Bytes, content_type: &str) -> Result<()> {
        let options = FileOptions {
            cache_control_secs: self.media.cache_control_secs,
            upsert: false,
            content_type: content_type.to_string(),
        };

        self.client
            .storage(&self.media.bucket)
            .upload(name, data, &options)
            .await
            .map_err(|e| AppError::Upload(e.to_string()))
    }

    fn public_url(&self, name: &str) -> String {
        self.client.storage(&self.media.bucket).public_url(name)
    }

    async fn remove_object(&self, name: &str) -> Result<()> {
        self.client
            .storage(&self.media.bucket)
            .remove(&[name.to_string()])
            .await?;
        Ok(())
    }

    async fn subscribe_inserts(&self) -> Result<ChangeFeed> {
        let schema = self.client.config().schema.clone();
        let mut subscription = self
            .client
            .realtime()
            .subscribe(POSTS_CHANNEL, ChangeFilter::inserts(&schema, POSTS_TABLE))
            .await?;

        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(async move {
            while let Some(record) = subscription.next().await {
                match serde_json::from_value::<PostRow>(record) {
                    Ok(row) => {
                        if tx.send(row).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "skipping undecodable post insert");
                    }
                }
            }
            subscription.unsubscribe();
        });

        Ok(ChangeFeed::new(rx).with_teardown(move || task.abort()))
    }
}
