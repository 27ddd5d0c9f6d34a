//! Client-side metrics.
//!
//! - `storefront_client_requests_total` (counter): labels `method`, `status`
//! - `storefront_client_request_duration_seconds` (histogram): label `status`
//! - `storefront_client_auth_failures_total` (counter)
//! - `storefront_client_refreshes_total` (counter): label `outcome`
//! - `storefront_client_refresh_waiters_total` (counter)
//! - `storefront_client_replays_total` (counter)
//! - `storefront_client_logouts_total` (counter): label `reason`
//!
//! This crate only records. The embedding application installs whatever
//! recorder it exposes; without one, every call below is a no-op.

/// Record a request that resolved through the pipeline (either attempt).
pub fn record_request(method: &str, status: u16, duration_secs: f64) {
    let status_str = status.to_string();
    metrics::counter!("storefront_client_requests_total", "method" => method.to_string(), "status" => status_str.clone())
        .increment(1);
    metrics::histogram!("storefront_client_request_duration_seconds", "status" => status_str)
        .record(duration_secs);
}

/// Record a 401 observed by the pipeline before any routing decision.
pub fn record_auth_failure() {
    metrics::counter!("storefront_client_auth_failures_total").increment(1);
}

/// Record a completed refresh call. `outcome` is `success` or `failed`.
pub fn record_refresh(outcome: &str) {
    metrics::counter!("storefront_client_refreshes_total", "outcome" => outcome.to_string())
        .increment(1);
}

/// Record a caller that queued behind an in-flight refresh.
pub fn record_queued_waiter() {
    metrics::counter!("storefront_client_refresh_waiters_total").increment(1);
}

/// Record a request replayed with a refreshed credential.
pub fn record_replay() {
    metrics::counter!("storefront_client_replays_total").increment(1);
}

/// Record a logout side effect with its reason label.
pub fn record_logout(reason: &str) {
    metrics::counter!("storefront_client_logouts_total", "reason" => reason.to_string())
        .increment(1);
}
