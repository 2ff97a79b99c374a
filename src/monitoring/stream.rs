use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
    Json, Router,
};
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio_stream::wrappers::IntervalStream;
use tokio_stream::StreamExt;

use super::request_log::RequestLogEntry;
use super::snapshot::MonitoringSnapshot;
use super::Monitor;

/// Read-only diagnostics routes. Nothing here mutates the monitor.
pub fn router(monitor: Arc<Monitor>) -> Router {
    Router::new()
        .route("/api/monitoring", get(get_snapshot))
        .route("/api/monitoring/stream", get(snapshot_stream))
        .route("/api/monitoring/requests", get(recent_requests))
        .with_state(monitor)
}

// ─── GET /api/monitoring ─────────────────────────────────────────

pub async fn get_snapshot(State(monitor): State<Arc<Monitor>>) -> Json<MonitoringSnapshot> {
    Json(monitor.snapshot())
}

// ─── GET /api/monitoring/requests ────────────────────────────────
/// The retained request log, oldest first.

pub async fn recent_requests(State(monitor): State<Arc<Monitor>>) -> Json<Vec<RequestLogEntry>> {
    Json(monitor.requests().recent_requests())
}

// ─── GET /api/monitoring/stream ──────────────────────────────────
/// Server-Sent Events endpoint.
/// Pushes a full `MonitoringSnapshot` as JSON every `stream_interval_ms`.

pub async fn snapshot_stream(
    State(monitor): State<Arc<Monitor>>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>> {
    let interval = tokio::time::interval(monitor.config().stream_interval());

    let stream = IntervalStream::new(interval).map(move |_| {
        let snapshot = monitor.snapshot();
        let json = serde_json::to_string(&snapshot).unwrap_or_default();
        Ok(Event::default().event("snapshot").data(json))
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}
