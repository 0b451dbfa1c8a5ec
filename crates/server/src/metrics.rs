//! Prometheus metrics

use metrics::{counter, describe_counter, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

use crate::ServerError;

static PROMETHEUS_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Install the Prometheus recorder. Call once at startup.
pub fn init_metrics() -> Result<(), ServerError> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| ServerError::Startup(format!("failed to install metrics recorder: {e}")))?;

    describe_counter!("dialog_turns_total", "Dialog turns processed");
    describe_counter!(
        "dialog_conversations_completed_total",
        "Conversations that resolved every required slot"
    );
    describe_counter!("dialog_turn_errors_total", "Turns rejected with an error");

    let _ = PROMETHEUS_HANDLE.set(handle);
    Ok(())
}

/// Record one processed turn.
pub fn record_turn(done: bool) {
    counter!("dialog_turns_total").increment(1);
    if done {
        counter!("dialog_conversations_completed_total").increment(1);
    }
}

/// Record a rejected turn.
pub fn record_turn_error() {
    counter!("dialog_turn_errors_total").increment(1);
}

/// Record the number of active conversations.
pub fn record_active_conversations(count: usize) {
    gauge!("dialog_active_conversations").set(count as f64);
}

/// `GET /metrics`
pub async fn metrics_handler() -> String {
    PROMETHEUS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_default()
}
