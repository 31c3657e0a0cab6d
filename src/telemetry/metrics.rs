//! Local dispatch counters exposed through the `metrics` facade.
//!
//! No recorder is installed here; the host decides where these go.

/// Reports written to the relay.
pub const EVENTS_SENT: &str = "telemetry_events_sent_total";
/// Reports or metrics the sink rejected, labelled by `kind`.
pub const SEND_FAILURES: &str = "telemetry_send_failures_total";
/// Connection attempts against the relay.
pub const CONNECT_ATTEMPTS: &str = "telemetry_connect_attempts_total";

pub fn record_event_sent() {
    metrics::counter!(EVENTS_SENT).increment(1);
}

pub fn record_send_failure(kind: &'static str) {
    metrics::counter!(SEND_FAILURES, "kind" => kind).increment(1);
}

pub fn record_connect_attempt() {
    metrics::counter!(CONNECT_ATTEMPTS).increment(1);
}
