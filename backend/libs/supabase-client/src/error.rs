/// Error types for the Supabase client
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SupabaseError>;

#[derive(Debug, Error)]
pub enum SupabaseError {
    #[error("Missing Supabase environment variables")]
    MissingCredentials,

    #[error("invalid Supabase URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("invalid API key header: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success response from PostgREST or the storage API
    #[error("{message} (status {status})")]
    Api { status: u16, message: String },

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("refusing to delete rows without a filter")]
    UnfilteredDelete,

    #[error("realtime error: {0}")]
    Realtime(String),

    #[error("realtime connection failed: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
}

impl SupabaseError {
    /// Build an API error from a failed response, preferring the `message`
    /// field of the JSON body both PostgREST and storage return.
    pub(crate) async fn from_response(response: reqwest::Response) -> Self {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();

        let message = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|value| {
                value
                    .get("message")
                    .or_else(|| value.get("error"))
                    .and_then(|m| m.as_str())
                    .map(str::to_string)
            })
            .unwrap_or(body);

        SupabaseError::Api { status, message }
    }

    /// HTTP status of an API error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            SupabaseError::Api { status, .. } => Some(*status),
            SupabaseError::Http(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
