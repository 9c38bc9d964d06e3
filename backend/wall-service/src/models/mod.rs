/// Data models for wall-service
///
/// - `Post`: the application's view of a feed entry
/// - `PostRow` / `NewPostRow`: the backend table's row shape
/// - `MediaFile`: an attachment as received from a client
///
/// Row and post shapes are converted in exactly one place per direction:
/// `Post::from(PostRow)` and `NewPostRow::new`.
use crate::services::media::parse_content_type;
use bytes::Bytes;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Maximum post body length, in Unicode scalar values
pub const MAX_BODY_CHARS: usize = 280;

/// Maximum uploader display name length
pub const MAX_UPLOADER_NAME_CHARS: usize = 50;

/// Shown for posts whose row carries no uploader name
pub const ANONYMOUS_UPLOADER: &str = "Anonymous";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// `image/*` in any case is an image, anything else is treated as video
    pub fn from_content_type(content_type: &str) -> Self {
        match parse_content_type(content_type) {
            Some(parsed) if parsed.type_() == mime::IMAGE => MediaKind::Image,
            _ => MediaKind::Video,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "image" => Some(MediaKind::Image),
            "video" => Some(MediaKind::Video),
            _ => None,
        }
    }
}

/// Stored media attachment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaRef {
    #[serde(rename = "mediaUrl")]
    pub url: String,
    #[serde(rename = "mediaType")]
    pub kind: MediaKind,
}

/// A feed entry
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub body: String,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub media: Option<MediaRef>,
    pub uploader_name: String,
}

/// Row of the `posts` table as returned by the backend
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PostRow {
    #[serde(deserialize_with = "opaque_id")]
    pub id: String,
    #[serde(default)]
    pub body: String,
    #[serde(deserialize_with = "lenient_timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub media_url: Option<String>,
    #[serde(default)]
    pub media_type: Option<String>,
    #[serde(default)]
    pub uploader_name: Option<String>,
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        let media = match (row.media_url, row.media_type.as_deref().and_then(MediaKind::parse)) {
            (Some(url), Some(kind)) if !url.is_empty() => Some(MediaRef { url, kind }),
            _ => None,
        };

        Post {
            id: row.id,
            body: row.body,
            timestamp: row.created_at,
            media,
            uploader_name: row
                .uploader_name
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| ANONYMOUS_UPLOADER.to_string()),
        }
    }
}

/// Row submitted on insert
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewPostRow {
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub media_url: Option<String>,
    pub media_type: Option<MediaKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uploader_name: Option<String>,
}

impl NewPostRow {
    pub fn new(
        body: String,
        uploader_name: Option<String>,
        media: Option<MediaRef>,
        created_at: DateTime<Utc>,
    ) -> Self {
        let (media_url, media_type) = match media {
            Some(media) => (Some(media.url), Some(media.kind)),
            None => (None, None),
        };

        Self {
            body,
            created_at,
            media_url,
            media_type,
            uploader_name,
        }
    }
}

/// Attachment received from a client, passed through to storage unmodified
#[derive(Debug, Clone, PartialEq)]
pub struct MediaFile {
    pub name: String,
    pub content_type: String,
    pub data: Bytes,
}

impl MediaFile {
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, data: Bytes) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            data,
        }
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Text after the last `.`, or the whole name when there is none
    pub fn extension(&self) -> &str {
        match self.name.rsplit_once('.') {
            Some((_, ext)) => ext,
            None => &self.name,
        }
    }

    pub fn kind(&self) -> MediaKind {
        MediaKind::from_content_type(&self.content_type)
    }
}

fn opaque_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(i64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(id) => id,
        Id::Number(id) => id.to_string(),
    })
}

// PostgREST renders `timestamptz` with an offset and `timestamp` without one.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).ok_or_else(|| {
        serde::de::Error::custom(format!("invalid created_at timestamp: {}", raw))
    })
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .map(|naive| naive.and_utc())
}
