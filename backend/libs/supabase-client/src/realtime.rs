//! Realtime change-feed client.
//!
//! Speaks the Phoenix channel protocol over a websocket: join a
//! `realtime:<name>` topic with a `postgres_changes` filter, keep the socket
//! alive with heartbeats, and forward matching records to the subscriber.
//! Delivery guarantees are whatever the realtime service provides; nothing
//! here deduplicates or replays.

use crate::config::SupabaseConfig;
use crate::error::Result;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(25);

const INSERT_EVENT: &str = "INSERT";

/// `postgres_changes` insert filter for a single table
#[derive(Debug, Clone)]
pub struct ChangeFilter {
    pub schema: String,
    pub table: String,
}

impl ChangeFilter {
    pub fn inserts(schema: &str, table: &str) -> Self {
        Self {
            schema: schema.to_string(),
            table: table.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct PhoenixFrame {
    topic: String,
    event: String,
    #[serde(default)]
    payload: Value,
}

pub struct RealtimeClient {
    config: Arc<SupabaseConfig>,
}

impl RealtimeClient {
    pub(crate) fn new(config: Arc<SupabaseConfig>) -> Self {
        Self { config }
    }

    /// Open a websocket, join `realtime:<channel>` and stream matching records.
    ///
    /// The returned subscription owns the socket; dropping it leaves the
    /// channel and closes the connection.
    pub async fn subscribe(
        &self,
        channel: &str,
        filter: ChangeFilter,
    ) -> Result<RealtimeSubscription> {
        let url = self.config.realtime_url()?;
        let (socket, _) = tokio_tungstenite::connect_async(url.as_str()).await?;
        let (mut sink, mut stream) = socket.split();

        let topic = format!("realtime:{}", channel);
        let join = join_message(&topic, &filter, &self.config.anon_key);
        sink.send(Message::Text(join.to_string().into())).await?;

        tracing::info!(
            topic = %topic,
            table = %filter.table,
            event = INSERT_EVENT,
            "realtime channel joined"
        );

        let (records_tx, records_rx) = mpsc::unbounded_channel();
        let (leave_tx, mut leave_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
            heartbeat.tick().await;
            let mut next_ref: u64 = 2;

            loop {
                tokio::select! {
                    _ = heartbeat.tick() => {
                        let frame = json!({
                            "topic": "phoenix",
                            "event": "heartbeat",
                            "payload": {},
                            "ref": next_ref.to_string(),
                        });
                        next_ref += 1;
                        if let Err(err) = sink.send(Message::Text(frame.to_string().into())).await {
                            tracing::warn!(topic = %topic, error = %err, "realtime heartbeat failed");
                            break;
                        }
                    }
                    _ = &mut leave_rx => {
                        let frame = json!({
                            "topic": topic,
                            "event": "phx_leave",
                            "payload": {},
                            "ref": next_ref.to_string(),
                        });
                        let _ = sink.send(Message::Text(frame.to_string().into())).await;
                        let _ = sink.close().await;
                        tracing::info!(topic = %topic, "realtime channel left");
                        break;
                    }
                    message = stream.next() => {
                        match message {
                            Some(Ok(Message::Text(text))) => {
                                match decode_change(text.as_str(), &topic, &filter) {
                                    Decoded::Record(record) => {
                                        if records_tx.send(record).is_err() {
                                            break;
                                        }
                                    }
                                    Decoded::Closed(reason) => {
                                        tracing::warn!(topic = %topic, reason = %reason, "realtime channel closed by server");
                                        break;
                                    }
                                    Decoded::Ignored => {}
                                }
                            }
                            Some(Ok(Message::Close(_))) | None => {
                                tracing::info!(topic = %topic, "realtime socket closed");
                                break;
                            }
                            Some(Ok(_)) => {}
                            Some(Err(err)) => {
                                tracing::error!(topic = %topic, error = %err, "realtime socket error");
                                break;
                            }
                        }
                    }
                }
            }
        });

        Ok(RealtimeSubscription {
            records: records_rx,
            leave: Some(leave_tx),
            task: Some(task),
        })
    }
}

/// Live stream of changed records for one channel
pub struct RealtimeSubscription {
    records: mpsc::UnboundedReceiver<Value>,
    leave: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl RealtimeSubscription {
    /// Next changed record, or `None` once the channel is closed
    pub async fn next(&mut self) -> Option<Value> {
        self.records.recv().await
    }

    /// Leave the channel and close the socket
    pub fn unsubscribe(mut self) {
        self.leave_channel();
    }

    fn leave_channel(&mut self) {
        if let Some(leave) = self.leave.take() {
            if leave.send(()).is_err() {
                if let Some(task) = self.task.take() {
                    task.abort();
                }
            }
        }
    }
}

impl Drop for RealtimeSubscription {
    fn drop(&mut self) {
        self.leave_channel();
    }
}

fn join_message(topic: &str, filter: &ChangeFilter, access_token: &str) -> Value {
    json!({
        "topic": topic,
        "event": "phx_join",
        "payload": {
            "config": {
                "broadcast": { "self": false },
                "presence": { "key": "" },
                "postgres_changes": [{
                    "event": INSERT_EVENT,
                    "schema": filter.schema,
                    "table": filter.table,
                }],
            },
            "access_token": access_token,
        },
        "ref": "1",
        "join_ref": "1",
    })
}

#[derive(Debug, PartialEq)]
enum Decoded {
    Record(Value),
    Closed(String),
    Ignored,
}

fn decode_change(text: &str, topic: &str, filter: &ChangeFilter) -> Decoded {
    let frame: PhoenixFrame = match serde_json::from_str(text) {
        Ok(frame) => frame,
        Err(err) => {
            tracing::debug!(error = %err, "ignoring undecodable realtime frame");
            return Decoded::Ignored;
        }
    };

    if frame.topic != topic {
        return Decoded::Ignored;
    }

    match frame.event.as_str() {
        "postgres_changes" => {
            let data = &frame.payload["data"];
            let change_type = data["type"].as_str().unwrap_or_default();
            let table = data["table"].as_str().unwrap_or_default();
            if change_type != INSERT_EVENT || table != filter.table {
                return Decoded::Ignored;
            }
            match data.get("record") {
                Some(record) if record.is_object() => Decoded::Record(record.clone()),
                _ => Decoded::Ignored,
            }
        }
        "phx_reply" => {
            if frame.payload["status"].as_str() == Some("error") {
                let reason = frame.payload["response"].to_string();
                tracing::error!(topic = %topic, reason = %reason, "realtime join rejected");
                return Decoded::Closed(reason);
            }
            Decoded::Ignored
        }
        "phx_error" | "phx_close" => Decoded::Closed(frame.event),
        _ => Decoded::Ignored,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn posts_filter() -> ChangeFilter {
        ChangeFilter::inserts("public", "posts")
    }

    #[test]
    fn test_join_message_carries_postgres_changes_filter() {
        let join = join_message("realtime:posts", &posts_filter(), "anon");
        assert_eq!(join["event"], "phx_join");
        let changes = &join["payload"]["config"]["postgres_changes"][0];
        assert_eq!(changes["event"], "INSERT");
        assert_eq!(changes["schema"], "public");
        assert_eq!(changes["table"], "posts");
        assert_eq!(join["payload"]["access_token"], "anon");
    }

    #[test]
    fn test_insert_record_is_forwarded() {
        let frame = json!({
            "topic": "realtime:posts",
            "event": "postgres_changes",
            "payload": {
                "data": {
                    "type": "INSERT",
                    "schema": "public",
                    "table": "posts",
                    "commit_timestamp": "2024-05-01T10:00:00Z",
                    "record": {"id": "1", "body": "hi"}
                },
                "ids": [1]
            },
            "ref": null
        });

        let decoded = decode_change(&frame.to_string(), "realtime:posts", &posts_filter());
        assert_eq!(decoded, Decoded::Record(json!({"id": "1", "body": "hi"})));
    }

    #[test]
    fn test_other_change_types_are_ignored() {
        let frame = json!({
            "topic": "realtime:posts",
            "event": "postgres_changes",
            "payload": {"data": {"type": "DELETE", "table": "posts", "old_record": {"id": "1"}}}
        });
        let decoded = decode_change(&frame.to_string(), "realtime:posts", &posts_filter());
        assert_eq!(decoded, Decoded::Ignored);
    }

    #[test]
    fn test_frames_for_other_topics_are_ignored() {
        let frame = json!({"topic": "phoenix", "event": "phx_reply", "payload": {"status": "ok"}});
        assert_eq!(
            decode_change(&frame.to_string(), "realtime:posts", &posts_filter()),
            Decoded::Ignored
        );
    }

    #[test]
    fn test_join_error_closes_channel() {
        let frame = json!({
            "topic": "realtime:posts",
            "event": "phx_reply",
            "payload": {"status": "error", "response": {"reason": "invalid token"}}
        });
        assert!(matches!(
            decode_change(&frame.to_string(), "realtime:posts", &posts_filter()),
            Decoded::Closed(_)
        ));
    }

    #[test]
    fn test_garbage_is_ignored() {
        assert_eq!(
            decode_change("not json", "realtime:posts", &posts_filter()),
            Decoded::Ignored
        );
    }
}
