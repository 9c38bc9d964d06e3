/// Live post stream over server-sent events
///
/// Each connection owns its own repository subscription; the subscription is
/// cancelled when the client disconnects and the response body is dropped.
use crate::error::Result;
use crate::metrics::wall::WALL_LIVE_SUBSCRIBERS;
use crate::models::Post;
use crate::services::Subscription;
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use bytes::Bytes;
use futures::stream;
use tokio::sync::mpsc;

struct LiveConnection {
    events: mpsc::UnboundedReceiver<Post>,
    _subscription: Subscription,
}

impl LiveConnection {
    fn new(events: mpsc::UnboundedReceiver<Post>, subscription: Subscription) -> Self {
        WALL_LIVE_SUBSCRIBERS.inc();
        Self {
            events,
            _subscription: subscription,
        }
    }
}

impl Drop for LiveConnection {
    fn drop(&mut self) {
        WALL_LIVE_SUBSCRIBERS.dec();
        tracing::debug!("live post stream closed");
    }
}

/// One `post` event per inserted post
pub fn encode_event(post: &Post) -> Result<Bytes> {
    let data = serde_json::to_string(post)?;
    Ok(Bytes::from(format!("event: post\ndata: {}\n\n", data)))
}

pub async fn post_stream(state: web::Data<AppState>) -> Result<HttpResponse> {
    let (tx, rx) = mpsc::unbounded_channel();
    let subscription = state
        .repo
        .subscribe_new_posts(Box::new(move |post| {
            let _ = tx.send(post);
        }))
        .await?;

    let connection = LiveConnection::new(rx, subscription);
    tracing::debug!("live post stream opened");

    let body = stream::unfold(connection, |mut connection| async move {
        loop {
            let post = connection.events.recv().await?;
            match encode_event(&post) {
                Ok(event) => return Some((Ok::<_, actix_web::Error>(event), connection)),
                Err(e) => {
                    tracing::warn!(post_id = %post.id, error = %e, "skipping unencodable post");
                }
            }
        }
    });

    Ok(HttpResponse::Ok()
        .content_type("text/event-stream")
        .insert_header(("Cache-Control", "no-cache"))
        .insert_header(("X-Accel-Buffering", "no"))
        .streaming(body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_event_framing() {
        let post = Post {
            id: "1".into(),
            body: "live".into(),
            timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap(),
            media: None,
            uploader_name: "James".into(),
        };

        let event = encode_event(&post).unwrap();
        let text = std::str::from_utf8(&event).unwrap();
        assert!(text.starts_with("event: post\ndata: {"));
        assert!(text.ends_with("}\n\n"));
        assert!(text.contains("\"uploaderName\":\"James\""));
    }
}
