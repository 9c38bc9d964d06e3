/// Thin client for a hosted Supabase project
///
/// Wraps the project credentials and exposes the three surfaces the wall
/// needs: PostgREST tables, object storage, and the realtime change feed.
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use std::sync::Arc;
use std::time::Duration;

pub mod config;
pub mod error;
pub mod realtime;
pub mod rest;
pub mod storage;

pub use config::SupabaseConfig;
pub use error::{Result, SupabaseError};
pub use realtime::{ChangeFilter, RealtimeClient, RealtimeSubscription};
pub use rest::{Order, Table};
pub use storage::{FileOptions, StorageBucket};

/// Shared Supabase client handle
#[derive(Clone)]
pub struct SupabaseClient {
    http: reqwest::Client,
    config: Arc<SupabaseConfig>,
}

impl SupabaseClient {
    /// Create a client with explicit configuration
    pub fn new(config: SupabaseConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert("apikey", HeaderValue::from_str(&config.anon_key)?);
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", config.anon_key))?,
        );

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        tracing::info!(url = %config.url, "Supabase client initialized");

        Ok(Self {
            http,
            config: Arc::new(config),
        })
    }

    pub fn config(&self) -> &SupabaseConfig {
        &self.config
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Query builder entry point for a PostgREST table
    pub fn from_table(&self, name: &str) -> Table {
        Table::new(self.clone(), name)
    }

    /// Handle to a storage bucket
    pub fn storage(&self, bucket: &str) -> StorageBucket {
        StorageBucket::new(self.clone(), bucket)
    }

    /// Realtime (change feed) client
    pub fn realtime(&self) -> RealtimeClient {
        RealtimeClient::new(self.config.clone())
    }

    /// Health check for PostgREST connectivity
    pub async fn health_check(&self) -> Result<()> {
        let response = self
            .http
            .get(format!("{}/rest/v1/", self.config.url))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SupabaseError::from_response(response).await);
        }

        Ok(())
    }
}
