// ABOUTME: Counters for chat traffic and connection health.
// ABOUTME: Thin wrappers over the `metrics` facade; no-ops until a recorder is installed.

pub const MESSAGES_RECEIVED: &str = "deskchat_messages_received_total";
pub const DUPLICATES_DROPPED: &str = "deskchat_duplicate_messages_total";
pub const MESSAGES_SENT: &str = "deskchat_messages_sent_total";
pub const SENDS_REJECTED: &str = "deskchat_sends_rejected_total";
pub const RECONNECT_ATTEMPTS: &str = "deskchat_reconnect_attempts_total";
pub const GATEWAY_ERRORS: &str = "deskchat_gateway_errors_total";
pub const BOOTSTRAP_FAILURES: &str = "deskchat_bootstrap_failures_total";

pub fn record_message_received() {
    metrics::counter!(MESSAGES_RECEIVED).increment(1);
}

pub fn record_duplicate_dropped(count: u64) {
    if count > 0 {
        metrics::counter!(DUPLICATES_DROPPED).increment(count);
    }
}

pub fn record_message_sent() {
    metrics::counter!(MESSAGES_SENT).increment(1);
}

pub fn record_send_rejected() {
    metrics::counter!(SENDS_REJECTED).increment(1);
}

pub fn record_reconnect_attempt() {
    metrics::counter!(RECONNECT_ATTEMPTS).increment(1);
}

/// `kind` is the gateway error event name (conversation_error, message_error)
pub fn record_gateway_error(kind: &'static str) {
    metrics::counter!(GATEWAY_ERRORS, "kind" => kind).increment(1);
}

/// `what` names the bootstrap (conversations, history, create)
pub fn record_bootstrap_failure(what: &'static str) {
    metrics::counter!(BOOTSTRAP_FAILURES, "what" => what).increment(1);
}
