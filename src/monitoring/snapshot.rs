use chrono::{DateTime, Utc};
use serde::Serialize;

use super::error_tracker::TrackedError;
use super::performance::RoutePerformanceMetrics;

/// Point-in-time view of the whole monitor, shipped to the status endpoint
/// and the SSE stream.
///
/// Each field is read from its own subsystem in turn, so a request landing
/// mid-build can be counted in `total_requests` without appearing under
/// `performance`. Consumers should treat the figures as approximately, not
/// transactionally, consistent.
#[derive(Debug, Clone, Serialize)]
pub struct MonitoringSnapshot {
    pub started_at: DateTime<Utc>,
    pub uptime_seconds: u64,
    pub total_requests: u64,
    pub error_count: u64,
    /// Newest first
    pub recent_errors: Vec<TrackedError>,
    pub performance: PerformanceSection,
}

#[derive(Debug, Clone, Serialize)]
pub struct PerformanceSection {
    /// Busiest route first
    pub routes: Vec<RoutePerformanceMetrics>,
}
