/// Object storage operations for a single bucket
use crate::error::{Result, SupabaseError};
use crate::SupabaseClient;
use bytes::Bytes;
use serde::Serialize;

/// Upload options, matching the storage API's upload headers
#[derive(Debug, Clone)]
pub struct FileOptions {
    /// `Cache-Control: max-age=<seconds>` served with the object
    pub cache_control_secs: u64,
    /// Overwrite an existing object with the same name
    pub upsert: bool,
    pub content_type: String,
}

impl Default for FileOptions {
    fn default() -> Self {
        Self {
            cache_control_secs: 3600,
            upsert: false,
            content_type: "application/octet-stream".to_string(),
        }
    }
}

#[derive(Clone)]
pub struct StorageBucket {
    client: SupabaseClient,
    bucket: String,
}

#[derive(Serialize)]
struct RemoveRequest<'a> {
    prefixes: &'a [String],
}

impl StorageBucket {
    pub(crate) fn new(client: SupabaseClient, bucket: &str) -> Self {
        Self {
            client,
            bucket: bucket.to_string(),
        }
    }

    /// Upload raw bytes under `path`
    pub async fn upload(&self, path: &str, data: Bytes, options: &FileOptions) -> Result<()> {
        let size = data.len();
        let response = self
            .client
            .http()
            .post(self.client.config().object_url(&self.bucket, path))
            .header("Content-Type", &options.content_type)
            .header(
                "Cache-Control",
                format!("max-age={}", options.cache_control_secs),
            )
            .header("x-upsert", if options.upsert { "true" } else { "false" })
            .body(data)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SupabaseError::from_response(response).await);
        }

        tracing::debug!(bucket = %self.bucket, path = %path, size, "object uploaded");
        Ok(())
    }

    /// Public URL for an object; no request is made
    pub fn public_url(&self, path: &str) -> String {
        self.client.config().public_object_url(&self.bucket, path)
    }

    /// Remove objects by name
    pub async fn remove(&self, paths: &[String]) -> Result<()> {
        let response = self
            .client
            .http()
            .delete(self.client.config().bucket_url(&self.bucket))
            .json(&RemoveRequest { prefixes: paths })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SupabaseError::from_response(response).await);
        }

        Ok(())
    }
}
