use lazy_static::lazy_static;
use prometheus::{
    register_int_counter, register_int_counter_vec, register_int_gauge, IntCounter,
    IntCounterVec, IntGauge,
};

lazy_static! {
    /// Post writes segmented by operation (create/delete) and result (success/error).
    pub static ref WALL_POST_WRITES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "wall_post_writes_total",
        "Post create and delete attempts segmented by outcome",
        &["operation", "result"]
    )
    .expect("failed to register wall_post_writes_total");

    /// Media uploads segmented by result.
    pub static ref WALL_MEDIA_UPLOADS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "wall_media_uploads_total",
        "Media uploads to object storage segmented by outcome",
        &["result"]
    )
    .expect("failed to register wall_media_uploads_total");

    /// Best-effort media removals that failed and were skipped.
    pub static ref WALL_MEDIA_REMOVE_FAILURES_TOTAL: IntCounter = register_int_counter!(
        "wall_media_remove_failures_total",
        "Stored media objects that could not be removed on post delete"
    )
    .expect("failed to register wall_media_remove_failures_total");

    /// Feed reads that failed and were served as an empty feed.
    pub static ref WALL_FEED_READ_FALLBACK_TOTAL: IntCounter = register_int_counter!(
        "wall_feed_read_fallback_total",
        "Feed reads that degraded to an empty list after a backend failure"
    )
    .expect("failed to register wall_feed_read_fallback_total");

    /// Browsers currently attached to the live post stream.
    pub static ref WALL_LIVE_SUBSCRIBERS: IntGauge = register_int_gauge!(
        "wall_live_subscribers",
        "Open live post stream connections"
    )
    .expect("failed to register wall_live_subscribers");
}

pub fn record_post_write(operation: &str, success: bool) {
    let result = if success { "success" } else { "error" };
    WALL_POST_WRITES_TOTAL
        .with_label_values(&[operation, result])
        .inc();
}

pub fn record_media_upload(success: bool) {
    let result = if success { "success" } else { "error" };
    WALL_MEDIA_UPLOADS_TOTAL.with_label_values(&[result]).inc();
}
