use lazy_static::lazy_static;
use prometheus::{Counter, Histogram, register_counter, register_histogram};

lazy_static! {
    pub static ref REQUEST_TOTAL: Counter =
        register_counter!("gateway_requests_total", "Total number of requests").unwrap();
    pub static ref RATE_LIMITED_TOTAL: Counter = register_counter!(
        "gateway_rate_limited_total",
        "Requests rejected by the rate limiter"
    )
    .unwrap();
    pub static ref UPSTREAM_ERRORS_TOTAL: Counter = register_counter!(
        "gateway_upstream_errors_total",
        "Proxied requests that failed or timed out upstream"
    )
    .unwrap();
    pub static ref STORE_FAILURES_TOTAL: Counter = register_counter!(
        "gateway_counter_store_failures_total",
        "Counter store errors absorbed by failing open"
    )
    .unwrap();
    pub static ref REQUEST_LATENCY: Histogram = register_histogram!(
        "gateway_request_latency_seconds",
        "Request latency in seconds"
    )
    .unwrap();
}
