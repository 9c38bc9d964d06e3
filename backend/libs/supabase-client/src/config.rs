/// Supabase project configuration shared by the table, storage and realtime clients
use crate::error::{Result, SupabaseError};
use serde::{Deserialize, Serialize};
use url::Url;

/// Realtime protocol version spoken by the websocket client
const REALTIME_VSN: &str = "1.0.0";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupabaseConfig {
    /// Project URL, e.g. `https://<ref>.supabase.co`
    pub url: String,
    /// Anonymous (publishable) API key
    pub anon_key: String,
    /// Database schema exposed through PostgREST
    pub schema: String,
    /// Timeout applied to every REST and storage request
    pub request_timeout_secs: u64,
}

impl SupabaseConfig {
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            url: url.into().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
            schema: "public".to_string(),
            request_timeout_secs: 30,
        }
    }

    /// Load configuration from `SUPABASE_URL` and `SUPABASE_ANON_KEY`.
    ///
    /// Both values are required; a missing or blank value is reported as
    /// [`SupabaseError::MissingCredentials`].
    pub fn from_env() -> Result<Self> {
        let url = std::env::var("SUPABASE_URL").unwrap_or_default();
        let anon_key = std::env::var("SUPABASE_ANON_KEY").unwrap_or_default();

        if url.trim().is_empty() || anon_key.trim().is_empty() {
            return Err(SupabaseError::MissingCredentials);
        }

        let mut config = Self::new(url.trim(), anon_key.trim());
        if let Ok(schema) = std::env::var("SUPABASE_SCHEMA") {
            config.schema = schema;
        }
        config.request_timeout_secs = std::env::var("SUPABASE_REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(config.request_timeout_secs);

        Ok(config)
    }

    /// PostgREST endpoint for a table
    pub fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.url, table)
    }

    /// Storage endpoint for an object inside a bucket
    pub fn object_url(&self, bucket: &str, path: &str) -> String {
        format!(
            "{}/storage/v1/object/{}/{}",
            self.url,
            bucket,
            encode_object_path(path)
        )
    }

    /// Storage endpoint for bulk operations on a bucket
    pub fn bucket_url(&self, bucket: &str) -> String {
        format!("{}/storage/v1/object/{}", self.url, bucket)
    }

    /// Public (unauthenticated) URL of an object in a public bucket
    pub fn public_object_url(&self, bucket: &str, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.url,
            bucket,
            encode_object_path(path)
        )
    }

    /// Websocket endpoint of the realtime service
    pub fn realtime_url(&self) -> Result<Url> {
        let mut url = Url::parse(&self.url)?;
        let scheme = match url.scheme() {
            "https" => "wss",
            "http" => "ws",
            other => {
                return Err(SupabaseError::Realtime(format!(
                    "unsupported URL scheme '{other}'"
                )))
            }
        };
        url.set_scheme(scheme)
            .map_err(|_| SupabaseError::Realtime("failed to switch URL scheme".to_string()))?;
        url.set_path("/realtime/v1/websocket");
        url.query_pairs_mut()
            .clear()
            .append_pair("apikey", &self.anon_key)
            .append_pair("vsn", REALTIME_VSN);
        Ok(url)
    }
}

fn encode_object_path(path: &str) -> String {
    path.trim_start_matches('/')
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
