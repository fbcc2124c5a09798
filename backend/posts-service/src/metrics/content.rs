use lazy_static::lazy_static;
use prometheus::{register_histogram_vec, register_int_counter_vec, HistogramVec, IntCounterVec};

lazy_static! {
    /// Post writes segmented by operation (create/edit).
    pub static ref POST_WRITES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "posts_writes_total",
        "Post create/edit operations",
        &["operation"]
    )
    .expect("failed to register posts_writes_total");

    /// Comments created.
    pub static ref COMMENT_WRITES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "comments_writes_total",
        "Comments created",
        &["result"]
    )
    .expect("failed to register comments_writes_total");

    /// Follow graph changes (follow/unfollow/noop).
    pub static ref FOLLOW_EVENTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "follow_events_total",
        "Follow graph changes segmented by action",
        &["action"]
    )
    .expect("failed to register follow_events_total");

    /// Time spent building a feed page, by feed.
    pub static ref FEED_PAGE_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "feed_page_duration_seconds",
        "Feed page build duration segmented by feed",
        &["feed"]
    )
    .expect("failed to register feed_page_duration_seconds");
}
