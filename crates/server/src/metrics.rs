//! Prometheus metrics
//!
//! Installs the global `metrics` recorder; handlers render it at `/metrics`.

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder, PrometheusHandle};

use crate::AppState;

const TURN_LATENCY_BUCKETS: &[f64] = &[0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0];

/// Install the Prometheus recorder and describe the agent's metrics
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("lead_agent_turn_duration_seconds".to_string()),
            TURN_LATENCY_BUCKETS,
        )?
        .install_recorder()?;

    describe_metrics();
    Ok(handle)
}

fn describe_metrics() {
    metrics::describe_counter!("lead_agent_sessions_created_total", "Sessions created");
    metrics::describe_gauge!("lead_agent_active_sessions", "Sessions held in memory");
    metrics::describe_counter!(
        "lead_agent_sessions_timed_out_total",
        "Idle sessions finalized by the inactivity sweep"
    );
    metrics::describe_counter!(
        "lead_agent_sessions_evicted_total",
        "Sessions evicted past TTL or retention"
    );
    metrics::describe_counter!("lead_agent_turns_total", "User turns processed");
    metrics::describe_histogram!(
        "lead_agent_turn_duration_seconds",
        metrics::Unit::Seconds,
        "Time to process one user turn"
    );
    metrics::describe_counter!("lead_agent_stage_errors_total", "Failed stage executions");
    metrics::describe_counter!("lead_agent_leads_qualified_total", "Leads scored as qualified");
    metrics::describe_counter!(
        "lead_agent_notifications_total",
        "Qualification notifications and nurture enrolments sent"
    );
}

/// `GET /metrics`
pub async fn metrics_handler(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, "metrics disabled").into_response(),
    }
}
