//! Metric helpers for the inverter monitor.
//!
//! Names and small wrappers around the [`metrics`](https://docs.rs/metrics)
//! crate. With the `metrics` feature disabled every helper is a no-op.

#[cfg(feature = "metrics")]
use metrics::counter;

/// Counter of TCP connections accepted from the data logger.
pub const CONNECTIONS_ACCEPTED: &str = "ginlong_connections_accepted_total";
/// Counter of frames dropped before producing a record, labelled by `reason`.
pub const FRAMES_REJECTED: &str = "ginlong_frames_rejected_total";
/// Counter of records handed to the publisher successfully.
pub const RECORDS_PUBLISHED: &str = "ginlong_records_published_total";
/// Counter of publisher failures.
pub const PUBLISH_ERRORS: &str = "ginlong_publish_errors_total";
/// Counter of connection or dispatch tasks that panicked.
pub const TASK_PANICS: &str = "ginlong_task_panics_total";

/// Record an accepted connection.
pub fn inc_connections() {
    #[cfg(feature = "metrics")]
    counter!(CONNECTIONS_ACCEPTED).increment(1);
}

/// Record a rejected frame. `reason` comes from
/// [`FrameError::reason`](crate::frame::FrameError::reason) or is `"read"`
/// for socket failures.
pub fn inc_rejected(reason: &'static str) {
    #[cfg(feature = "metrics")]
    counter!(FRAMES_REJECTED, "reason" => reason).increment(1);
    #[cfg(not(feature = "metrics"))]
    let _ = reason;
}

/// Record a published record.
pub fn inc_published() {
    #[cfg(feature = "metrics")]
    counter!(RECORDS_PUBLISHED).increment(1);
}

/// Record a publisher failure.
pub fn inc_publish_errors() {
    #[cfg(feature = "metrics")]
    counter!(PUBLISH_ERRORS).increment(1);
}

/// Record a panicking task.
pub fn inc_task_panics() {
    #[cfg(feature = "metrics")]
    counter!(TASK_PANICS).increment(1);
}
