/// Attachment rules: accepted types, size limit, storage object naming
use url::Url;

pub const ALLOWED_IMAGE_TYPES: &[&str] = &["image/jpeg", "image/png", "image/gif", "image/webp"];

pub const ALLOWED_VIDEO_TYPES: &[&str] = &["video/mp4", "video/webm"];

/// 50 MiB
pub const MAX_FILE_SIZE: usize = 52_428_800;

/// `accept` attribute value for file inputs
pub fn accept_attribute() -> String {
    ALLOWED_IMAGE_TYPES
        .iter()
        .chain(ALLOWED_VIDEO_TYPES)
        .copied()
        .collect::<Vec<_>>()
        .join(",")
}

/// Parse a declared content type; surrounding whitespace is ignored and the
/// type and subtype come back lowercased
pub fn parse_content_type(content_type: &str) -> Option<mime::Mime> {
    content_type.trim().parse().ok()
}

/// Whether a declared content type is one of the accepted media types.
///
/// Parameters such as `; charset=` are ignored; an unparseable type is rejected.
pub fn is_allowed_type(content_type: &str) -> bool {
    let Some(parsed) = parse_content_type(content_type) else {
        return false;
    };
    let essence = parsed.essence_str();
    ALLOWED_IMAGE_TYPES
        .iter()
        .chain(ALLOWED_VIDEO_TYPES)
        .any(|allowed| allowed.eq_ignore_ascii_case(essence))
}

/// `<millis>.<ext>`
pub fn media_object_name(timestamp_millis: i64, extension: &str) -> String {
    format!("{}.{}", timestamp_millis, extension)
}

/// Storage key of a public object URL: the last segment of its path
pub fn object_key_from_url(media_url: &str) -> Option<String> {
    let url = Url::parse(media_url).ok()?;
    let key = url.path_segments()?.next_back()?;
    if key.is_empty() {
        return None;
    }
    Some(
        urlencoding::decode(key)
            .map(|k| k.into_owned())
            .unwrap_or_else(|_| key.to_string()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_types() {
        assert!(is_allowed_type("image/png"));
        assert!(is_allowed_type("video/webm"));
        assert!(is_allowed_type("IMAGE/JPEG"));
        assert!(!is_allowed_type("image/svg+xml"));
        assert!(!is_allowed_type("application/pdf"));
        assert!(!is_allowed_type(""));
    }

    #[test]
    fn test_object_name() {
        assert_eq!(media_object_name(1700000000000, "png"), "1700000000000.png");
    }

    #[test]
    fn test_object_key_is_last_path_segment() {
        assert_eq!(
            object_key_from_url(
                "https://demo.supabase.co/storage/v1/object/public/posts-media/1700000000000.png"
            )
            .as_deref(),
            Some("1700000000000.png")
        );
        assert_eq!(object_key_from_url("not a url"), None);
        assert_eq!(object_key_from_url("https://cdn.example.com/"), None);
    }

    #[test]
    fn test_accept_attribute_lists_every_type() {
        let accept = accept_attribute();
        assert!(accept.starts_with("image/jpeg,"));
        assert!(accept.ends_with("video/webm"));
    }
}
