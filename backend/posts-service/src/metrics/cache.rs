use lazy_static::lazy_static;
use prometheus::{register_int_counter_vec, IntCounterVec};

lazy_static! {
    /// Page cache lookups (hit/miss/error).
    pub static ref PAGE_CACHE_EVENTS: IntCounterVec = register_int_counter_vec!(
        "page_cache_events_total",
        "Page cache lookups segmented by outcome",
        &["event"]
    )
    .expect("failed to register page_cache_events_total");

    /// Page cache write results (success/error).
    pub static ref PAGE_CACHE_WRITE_TOTAL: IntCounterVec = register_int_counter_vec!(
        "page_cache_write_total",
        "Page cache write attempts segmented by outcome",
        &["result"]
    )
    .expect("failed to register page_cache_write_total");
}
